//! Objects that can be loaded from the database by id
use crate::{Database, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteQueryResult;

/// A trait for objects that are stored in the database and identified by a
/// unique id
#[async_trait]
pub trait Loadable: Send + Sync {
    type Id: Copy + PartialEq + Send + Sync + From<i64>;

    /// The id given to objects that have not been stored in the database yet
    fn invalid_id() -> Self::Id {
        Self::Id::from(-1)
    }

    fn id(&self) -> Self::Id;
    fn set_id(&mut self, id: Self::Id);

    /// Load the object with the given id from the database
    async fn load(id: Self::Id, db: &Database) -> Result<Self>
    where
        Self: Sized;

    /// Delete the object with the given id from the database
    async fn delete_id(id: &Self::Id, db: &Database) -> Result<SqliteQueryResult>;

    /// Delete this object from the database. On success, the object's id is
    /// reset to [Loadable::invalid_id()]
    async fn delete(&mut self, db: &Database) -> Result<SqliteQueryResult> {
        let id = self.id();
        let res = Self::delete_id(&id, db).await?;
        self.set_id(Self::invalid_id());
        Ok(res)
    }
}

/// A reference to another object in the database. Depending on the query, the
/// referenced object may be fully loaded or only its id may be known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalRef<T: Loadable> {
    Stub(T::Id),
    Object(T),
}

impl<T> ExternalRef<T>
where
    T: Loadable + Send,
{
    /// The id of the referenced object
    pub fn id(&self) -> T::Id {
        match self {
            ExternalRef::Stub(id) => *id,
            ExternalRef::Object(obj) => obj.id(),
        }
    }

    /// The referenced object, if it is loaded
    pub fn object(&self) -> Option<&T> {
        match self {
            ExternalRef::Stub(_) => None,
            ExternalRef::Object(obj) => Some(obj),
        }
    }
}
