//! This is a library that provides objects and functionality to help you discover cultural venues
//! and the events that take place there, and keep track of everything inside of a database.

use serde::{Deserialize, Deserializer};
use std::str::FromStr;

pub mod comment;
pub mod core;
pub mod event;
pub mod favorite;
pub mod geo;
pub mod location;
pub mod policy;
pub mod seed;
pub mod user;

pub use crate::core::database::Database;
pub use crate::core::error::Error;
pub use crate::core::error::Result;

/// A serde helper that treats an empty string as a missing value. Any other
/// value must parse successfully or deserialization fails.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s)
            .map_err(serde::de::Error::custom)
            .map(Some),
    }
}

/// Like [empty_string_as_none()], but a value that fails to parse is also
/// treated as missing instead of producing an error.
pub fn unparseable_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let opt = Option::<String>::deserialize(de)?;
    Ok(opt.and_then(|s| s.trim().parse().ok()))
}
