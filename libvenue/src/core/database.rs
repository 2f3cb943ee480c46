use crate::{
    Result,
    seed::{self, SeedSummary, SeedVenue},
    user::{Role, User},
};

use sqlx::{Pool, Sqlite, SqlitePool, sqlite::SqliteConnectOptions};
use std::path::Path;
use tracing::{debug, trace};

/// An object that represents a connection to the venue database
#[derive(Clone, Debug)]
pub struct Database(Pool<Sqlite>);

impl From<Pool<Sqlite>> for Database {
    /// **WARNING**: This is primarily intended for tests. You should probably
    /// use [Database::open()] instead of creating the pool yourself, since
    /// [Database::open()] will perform database schema migration automatically.
    fn from(value: Pool<Sqlite>) -> Self {
        Self(value)
    }
}

impl Database {
    /// Open a connection to the specified database, creating the file if it
    /// doesn't exist yet. This will also perform any necessary sql migrations
    /// to ensure that the database is up to date with the latest schema
    /// changes. Opening a database never populates it with data, see
    /// [Database::init()] and [Database::seed()] for that.
    pub async fn open<P: AsRef<Path>>(db: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db)
            .create_if_missing(true)
            .foreign_keys(true);
        let dbpool = SqlitePool::connect_with(options).await?;
        trace!("Running database migrations");
        sqlx::migrate!("../db/migrations").run(&dbpool).await?;
        Ok(Database(dbpool))
    }

    /// gets a reference to the underlying sqlx connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.0
    }

    /// Initialize a fresh database with an administrator account. Returns the
    /// newly-created administrator.
    pub async fn init(
        &self,
        admin_user: String,
        admin_email: Option<String>,
        admin_password: String,
    ) -> Result<User> {
        debug!("Initializing database with a new admin user {admin_user} ({admin_email:?})");
        let pwhash = User::hash_password(&admin_password)?;
        let mut user = User::new(admin_user, admin_email, pwhash, Role::Admin);
        user.insert(self).await?;
        Ok(user)
    }

    /// Populate the database with venues and their events. This is safe to
    /// call repeatedly: venues whose venue id is already present are skipped.
    /// `progress` is called once per venue after it has been processed.
    pub async fn seed<F>(&self, venues: Vec<SeedVenue>, progress: F) -> Result<SeedSummary>
    where
        F: FnMut(&SeedVenue),
    {
        seed::import_venues(self, venues, progress).await
    }
}
