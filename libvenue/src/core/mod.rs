//! Core infrastructure for managing and accessing the venue database.
pub mod database;
pub mod error;
pub mod loadable;
pub mod query;
