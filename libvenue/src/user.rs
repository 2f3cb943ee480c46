//! Objects related to the users of the application
use crate::{
    Database,
    core::{
        error::{Error, Result},
        loadable::Loadable,
    },
};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteQueryResult;
use strum_macros::{Display, EnumIter, EnumString, FromRepr};

const MIN_USERNAME_LENGTH: usize = 3;

/// The shortest password accepted for a new account
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// The role of a user determines which operations they are allowed to perform
#[derive(
    sqlx::Type,
    Debug,
    Copy,
    Clone,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    FromRepr,
    PartialEq,
    Eq,
)]
#[repr(i64)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[default]
    User = 1,
    Admin = 2,
}

/// A registered user of the application
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[sqlx(rename = "userid")]
    pub id: i64,
    pub username: String,
    #[sqlx(rename = "useremail")]
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub pwhash: String,
    #[sqlx(rename = "userrole")]
    pub role: Role,
}

#[async_trait]
impl Loadable for User {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn set_id(&mut self, id: Self::Id) {
        self.id = id
    }

    async fn load(id: Self::Id, db: &Database) -> Result<Self> {
        sqlx::query_as(
            "SELECT userid, username, useremail, pwhash, userrole FROM vn_users WHERE userid=?",
        )
        .bind(id)
        .fetch_one(db.pool())
        .await
        .map_err(|e| e.into())
    }

    async fn delete_id(id: &Self::Id, db: &Database) -> Result<SqliteQueryResult> {
        sqlx::query("DELETE FROM vn_users WHERE userid=?")
            .bind(id)
            .execute(db.pool())
            .await
            .map_err(|e| e.into())
    }
}

impl User {
    pub fn new(username: String, email: Option<String>, pwhash: String, role: Role) -> Self {
        Self {
            id: Self::invalid_id(),
            username,
            email,
            pwhash,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub async fn load_all(db: &Database) -> Result<Vec<User>> {
        sqlx::query_as(
            "SELECT userid, username, useremail, pwhash, userrole FROM vn_users ORDER BY username ASC",
        )
        .fetch_all(db.pool())
        .await
        .map_err(|e| e.into())
    }

    pub async fn load_by_username(username: &str, db: &Database) -> Result<Option<User>> {
        sqlx::query_as(
            "SELECT userid, username, useremail, pwhash, userrole FROM vn_users WHERE username=?",
        )
        .bind(username)
        .fetch_optional(db.pool())
        .await
        .map_err(|e| e.into())
    }

    /// Check that a username is acceptable for a new account
    pub fn validate_username(username: &str) -> Result<()> {
        if username.chars().count() < MIN_USERNAME_LENGTH {
            return Err(Error::AuthInvalidUsernameTooShort);
        }
        let invalid: String = username
            .chars()
            .filter(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
            .collect();
        if !invalid.is_empty() {
            return Err(Error::AuthInvalidUsernameInvalidCharacters(invalid));
        }
        Ok(())
    }

    /// Check that a password is acceptable for a new account
    pub fn validate_password(pw: &str) -> Result<()> {
        if pw.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::InvalidData(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }

    pub fn hash_password(pw: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hasher = Argon2::default();
        Ok(hasher.hash_password(pw.as_bytes(), &salt)?.to_string())
    }

    pub fn verify_password(&self, pw: &str) -> Result<()> {
        let hasher = Argon2::default();
        let expected_hash = PasswordHash::new(&self.pwhash)?;
        hasher
            .verify_password(pw.as_bytes(), &expected_hash)
            .map_err(|e| e.into())
    }

    pub fn change_password(&mut self, pw: &str) -> Result<()> {
        self.pwhash = Self::hash_password(pw)?;
        Ok(())
    }

    /// Add this user to the database. On success the id of this object is
    /// updated to the id of the new row.
    pub async fn insert(&mut self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id != Self::invalid_id() {
            return Err(Error::InvalidInsertObjectAlreadyExists(self.id));
        }
        Self::validate_username(&self.username)?;
        sqlx::query(
            "INSERT INTO vn_users (username, useremail, pwhash, userrole) VALUES (?, ?, ?, ?)",
        )
        .bind(&self.username)
        .bind(&self.email)
        .bind(&self.pwhash)
        .bind(self.role)
        .execute(db.pool())
        .await
        .inspect(|r| self.id = r.last_insert_rowid())
        .map_err(|e| e.into())
    }

    pub async fn update(&self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id < 0 {
            return Err(Error::InvalidUpdateObjectNotFound);
        }

        sqlx::query("UPDATE vn_users SET username=?, useremail=?, pwhash=?, userrole=? WHERE userid=?")
            .bind(&self.username)
            .bind(&self.email)
            .bind(&self.pwhash)
            .bind(self.role)
            .bind(self.id)
            .execute(db.pool())
            .await
            .map_err(|e| e.into())
    }
}
