//! A user's list of favorite locations
use crate::{
    Database,
    core::{
        error::{Error, Result},
        loadable::Loadable,
    },
    location::Location,
    policy,
    user::User,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A record marking a location as one of a user's favorites
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    #[sqlx(rename = "favid")]
    pub id: i64,

    #[sqlx(rename = "userid")]
    pub user_id: i64,

    #[sqlx(rename = "locid")]
    pub location_id: i64,
}

impl Favorite {
    /// Returns true if the user has marked the location as a favorite
    pub async fn is_favorited(user_id: i64, location_id: i64, db: &Database) -> Result<bool> {
        let n: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vn_favorites WHERE userid=? AND locid=?")
                .bind(user_id)
                .bind(location_id)
                .fetch_one(db.pool())
                .await?;
        Ok(n > 0)
    }

    /// Add a location to the user's favorites. A location can only be added
    /// once: adding it again fails with [Error::DuplicateFavorite]. Fails with
    /// a not-found error if the location doesn't exist.
    pub async fn add(user_id: i64, location_id: i64, db: &Database) -> Result<Favorite> {
        Location::load(location_id, db).await?;
        if Self::is_favorited(user_id, location_id, db).await? {
            return Err(Error::DuplicateFavorite);
        }
        // the unique constraint also rejects duplicates that race past the check
        let id = sqlx::query("INSERT INTO vn_favorites (userid, locid) VALUES (?, ?)")
            .bind(user_id)
            .bind(location_id)
            .execute(db.pool())
            .await
            .map_err(Error::from)
            .map_err(|e| {
                if e.is_unique_violation() {
                    Error::DuplicateFavorite
                } else {
                    e
                }
            })?
            .last_insert_rowid();
        debug!(user = user_id, location = location_id, "Added favorite");
        Ok(Favorite {
            id,
            user_id,
            location_id,
        })
    }

    /// Remove a location from the user's favorites. Fails with a not-found
    /// error if the location wasn't a favorite.
    pub async fn remove(user_id: i64, location_id: i64, db: &Database) -> Result<()> {
        let res = sqlx::query("DELETE FROM vn_favorites WHERE userid=? AND locid=?")
            .bind(user_id)
            .bind(location_id)
            .execute(db.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    /// Remove a location from the favorites of the user `owner_id` on behalf
    /// of `actor`. Users may only remove their own favorites unless they are
    /// an administrator.
    pub async fn remove_as(
        actor: &User,
        owner_id: i64,
        location_id: i64,
        db: &Database,
    ) -> Result<()> {
        policy::authorize(actor.id, owner_id, actor.role).check()?;
        Self::remove(owner_id, location_id, db).await
    }

    /// Load the favorite locations of the given user, sorted by name
    pub async fn locations_for_user(user_id: i64, db: &Database) -> Result<Vec<Location>> {
        sqlx::query_as(
            r#"SELECT L.locid, L.venueid, L.locname, L.latitude, L.longitude, L.area,
            L.eventcount, L.lastupdated FROM vn_favorites F
            INNER JOIN vn_locations L ON L.locid=F.locid
            WHERE F.userid=? ORDER BY L.locname COLLATE NOCASE ASC, L.locid ASC"#,
        )
        .bind(user_id)
        .fetch_all(db.pool())
        .await
        .map_err(|e| e.into())
    }
}
