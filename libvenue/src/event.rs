//! Objects to manage the events that take place at a location
use crate::{
    Database,
    core::{
        error::{Error, Result},
        loadable::{ExternalRef, Loadable},
        query::{DynFilterPart, LimitSpec, ToSql, filter::FilterPart},
    },
    location::Location,
};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{
    FromRow, QueryBuilder, Row, Sqlite,
    sqlite::{SqliteQueryResult, SqliteRow},
};
use time::Date;
use tracing::debug;

/// A type for specifying fields that can be used for filtering a database query
/// for events
#[derive(Clone, Debug)]
pub enum Filter {
    Id(i64),
    LocationId(i64),
}

impl FilterPart for Filter {
    fn add_to_query(&self, builder: &mut QueryBuilder<Sqlite>) {
        match self {
            Self::Id(id) => _ = builder.push(" E.eventid = ").push_bind(*id),
            Self::LocationId(id) => _ = builder.push(" E.locid = ").push_bind(*id),
        }
    }
}

/// An event that is held at a particular location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,

    /// The location where this event takes place. Depending on how the event
    /// was loaded, the location may be fully populated or only its id is known.
    #[serde(rename = "locationId")]
    pub location: ExternalRef<Location>,

    pub title: String,

    pub date: Date,

    /// The starting time of the event, as free-form text
    pub time: Option<String>,

    pub description: Option<String>,

    pub presenter: Option<String>,
}

impl FromRow<'_, SqliteRow> for Event {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let location = Location::from_row(row)
            .map(ExternalRef::Object)
            .or_else(|_| row.try_get("locid").map(ExternalRef::Stub))?;
        Ok(Self {
            id: row.try_get("eventid")?,
            location,
            title: row.try_get("title")?,
            date: row.try_get("eventdate")?,
            time: row.try_get("eventtime")?,
            description: row.try_get("eventdesc")?,
            presenter: row.try_get("presenter")?,
        })
    }
}

#[async_trait]
impl Loadable for Event {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn set_id(&mut self, id: Self::Id) {
        self.id = id
    }

    async fn load(id: Self::Id, db: &Database) -> Result<Self> {
        Self::build_query(Some(Filter::Id(id).into()), false)
            .build_query_as()
            .fetch_one(db.pool())
            .await
            .map_err(|e| e.into())
    }

    async fn delete_id(id: &Self::Id, db: &Database) -> Result<SqliteQueryResult> {
        sqlx::query("DELETE FROM vn_events WHERE eventid=?")
            .bind(id)
            .execute(db.pool())
            .await
            .map_err(|e| e.into())
    }
}

/// Choose a uniformly distributed offset into a collection of `count` items,
/// or `None` if the collection is empty
pub fn random_offset<R: Rng + ?Sized>(rng: &mut R, count: i64) -> Option<i64> {
    (count > 0).then(|| rng.gen_range(0..count))
}

impl Event {
    /// Creates a new event object for the given location. It will initially
    /// have an invalid ID until it is inserted into the database
    pub fn new(
        location_id: i64,
        title: String,
        date: Date,
        time: Option<String>,
        description: Option<String>,
        presenter: Option<String>,
    ) -> Self {
        Self {
            id: Self::invalid_id(),
            location: ExternalRef::Stub(location_id),
            title,
            date,
            time,
            description,
            presenter,
        }
    }

    fn build_query(filter: Option<DynFilterPart>, with_location: bool) -> QueryBuilder<'static, Sqlite> {
        let mut qb = if with_location {
            QueryBuilder::new(
                r#"SELECT E.eventid, E.locid, E.title, E.eventdate, E.eventtime, E.eventdesc,
                E.presenter, L.venueid, L.locname, L.latitude, L.longitude, L.area,
                L.eventcount, L.lastupdated FROM vn_events E
                INNER JOIN vn_locations L ON L.locid=E.locid"#,
            )
        } else {
            QueryBuilder::new(
                r#"SELECT E.eventid, E.locid, E.title, E.eventdate, E.eventtime, E.eventdesc,
                E.presenter FROM vn_events E"#,
            )
        };
        if let Some(f) = filter {
            qb.push(" WHERE ");
            f.add_to_query(&mut qb);
        }
        qb
    }

    /// Load all events held at the given location, in chronological order
    pub async fn load_for_location(location_id: i64, db: &Database) -> Result<Vec<Event>> {
        let mut qb = Self::build_query(Some(Filter::LocationId(location_id).into()), false);
        qb.push(" ORDER BY E.eventdate ASC, E.eventid ASC");
        qb.build_query_as()
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Load every event in the database in chronological order, with its
    /// location populated
    pub async fn load_all(db: &Database) -> Result<Vec<Event>> {
        let mut qb = Self::build_query(None, true);
        qb.push(" ORDER BY E.eventdate ASC, E.eventid ASC");
        qb.build_query_as()
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// The total number of events in the database
    pub async fn count(db: &Database) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM vn_events")
            .fetch_one(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Pick an event uniformly at random from all events in the database. The
    /// event's location is fully populated. Returns `None` if there are no
    /// events at all. Counting and picking happen in a single transaction, so
    /// concurrent deletes can't push the offset past the end.
    pub async fn pick_random<R: Rng + Send + ?Sized>(
        rng: &mut R,
        db: &Database,
    ) -> Result<Option<Event>> {
        let mut tx = db.pool().begin().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vn_events")
            .fetch_one(&mut *tx)
            .await?;
        let Some(offset) = random_offset(rng, count) else {
            debug!("No events to pick from");
            return Ok(None);
        };
        let mut qb = Self::build_query(None, true);
        qb.push(" ORDER BY E.eventid ASC ");
        qb.push(
            LimitSpec {
                count: 1,
                offset: Some(offset),
            }
            .to_sql(),
        );
        let event: Option<Event> = qb.build_query_as().fetch_optional(&mut *tx).await?;
        tx.commit().await?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidStateMissingAttribute("title".to_string()));
        }
        Ok(())
    }

    /// Add this event to the database. If this call completes successfully,
    /// the id of this object will be updated to the ID of the inserted row in
    /// the database
    pub async fn insert(&mut self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id != Self::invalid_id() {
            return Err(Error::InvalidInsertObjectAlreadyExists(self.id));
        }
        self.validate()?;

        sqlx::query(
            r#"INSERT INTO vn_events (locid, title, eventdate, eventtime, eventdesc, presenter)
            VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(self.location.id())
        .bind(&self.title)
        .bind(self.date)
        .bind(&self.time)
        .bind(&self.description)
        .bind(&self.presenter)
        .execute(db.pool())
        .await
        .inspect(|r| self.id = r.last_insert_rowid())
        .map_err(|e| e.into())
    }

    /// Update the event in the database such that it matches this object
    pub async fn update(&self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id < 0 {
            return Err(Error::InvalidUpdateObjectNotFound);
        }
        self.validate()?;

        sqlx::query(
            r#"UPDATE vn_events SET locid=?, title=?, eventdate=?, eventtime=?, eventdesc=?,
            presenter=? WHERE eventid=?"#,
        )
        .bind(self.location.id())
        .bind(&self.title)
        .bind(self.date)
        .bind(&self.time)
        .bind(&self.description)
        .bind(&self.presenter)
        .bind(self.id)
        .execute(db.pool())
        .await
        .map_err(|e| e.into())
    }
}
