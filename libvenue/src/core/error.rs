//! Objects related to reporting errors from this library

/// A list of error types that can occur within this library
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // authentication-related errors
    #[error("authentication error: couldn't hash password")]
    AuthHashFailure(#[from] password_hash::Error),

    #[error("invalid username: too short")]
    AuthInvalidUsernameTooShort,

    #[error("invalid username: contains invalid characters")]
    AuthInvalidUsernameInvalidCharacters(String),

    #[error("The user could not be found")]
    AuthUserNotFound,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("can't update the object, no id was specified")]
    InvalidUpdateObjectNotFound,

    #[error("can't insert the object, it already exists in the database with id = {}", .0)]
    InvalidInsertObjectAlreadyExists(i64),

    #[error("Invalid state: the object has an unspecified attribute '{}'", .0)]
    InvalidStateMissingAttribute(String),

    #[error("The location is already in the user's favorites")]
    DuplicateFavorite,

    #[error("The user is not permitted to modify this object")]
    PermissionDenied,

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),

    #[error(transparent)]
    DatabaseMigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Unable to parse seed data: {0}")]
    SeedFormat(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error was caused by a query that expected a row
    /// but didn't find one
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::DatabaseError(sqlx::Error::RowNotFound))
    }

    /// Returns true if this error was caused by a violated UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::DatabaseError(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

/// A convenience type alias for a [Result] with [Error] as its error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
