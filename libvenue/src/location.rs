//! Objects to manage cultural venues and query them by keyword, area and distance
use crate::{
    Database,
    core::{
        error::{Error, Result},
        loadable::Loadable,
        query::{
            DynFilterPart, LimitSpec, ToSql,
            filter::{Cmp, FilterPart, and, or},
        },
    },
    event::Event,
    geo::{Coordinates, km_threshold_to_degrees_squared},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, sqlite::SqliteQueryResult};
use strum_macros::{Display, EnumIter, EnumString};
use time::OffsetDateTime;
use tracing::debug;

/// The maximum number of results returned by [Location::search()]
pub const SEARCH_LIMIT: i64 = 10;

const DISTANCE_SQL: &str = "((L.latitude - ?) * (L.latitude - ?) + (L.longitude - ?) * (L.longitude - ?))";

/// A type for specifying fields that can be used for filtering a database query
/// for locations
#[derive(Clone, Debug)]
pub enum Filter {
    /// Match the ID of the location to the given value
    Id(i64),

    /// Match the external venue id of the location
    VenueId(String),

    /// Compare the name of the location to the given value, ignoring case
    Name(Cmp, String),

    /// Compare the area of the location to the given value, ignoring case
    Area(Cmp, String),

    /// Only locations whose approximate distance from `origin` is no more than
    /// `km` kilometers
    WithinDistance { origin: Coordinates, km: f64 },
}

impl FilterPart for Filter {
    fn add_to_query(&self, builder: &mut QueryBuilder<Sqlite>) {
        match self {
            Self::Id(id) => _ = builder.push(" L.locid = ").push_bind(*id),
            Self::VenueId(id) => _ = builder.push(" L.venueid = ").push_bind(id.clone()),
            Self::Name(cmp, frag) => cmp.push_text(builder, "L.locnamefolded", &fold_case(frag)),
            Self::Area(cmp, frag) => cmp.push_text(builder, "L.areafolded", &fold_case(frag)),
            Self::WithinDistance { origin, km } => {
                builder.push(" ");
                push_distance(builder, origin);
                builder
                    .push(" <= ")
                    .push_bind(km_threshold_to_degrees_squared(*km));
            }
        }
    }
}

/// Names and areas are stored a second time in this form so that SQLite can
/// compare them without regard to case. SQLite's own case folding only covers
/// ASCII.
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Push the squared planar distance between a location row and `origin`
fn push_distance(builder: &mut QueryBuilder<Sqlite>, origin: &Coordinates) {
    let mut parts = DISTANCE_SQL.split('?');
    let binds = [
        origin.latitude,
        origin.latitude,
        origin.longitude,
        origin.longitude,
    ];
    if let Some(first) = parts.next() {
        builder.push(first);
    }
    for (part, value) in parts.zip(binds) {
        builder.push_bind(value).push(part);
    }
}

/// The order in which query results are returned
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Alphabetical by name
    #[default]
    Name,
    /// Nearest to the reference point first
    Distance,
    /// Most events first
    Events,
}

impl SortField {
    fn add_to_query(&self, builder: &mut QueryBuilder<Sqlite>, origin: &Coordinates) {
        match self {
            Self::Name => _ = builder.push(" ORDER BY L.locnamefolded ASC, L.locid ASC"),
            Self::Distance => {
                builder.push(" ORDER BY ");
                push_distance(builder, origin);
                builder.push(" ASC, L.locnamefolded ASC, L.locid ASC");
            }
            Self::Events => {
                _ = builder.push(" ORDER BY L.eventcount DESC, L.locnamefolded ASC, L.locid ASC")
            }
        }
    }
}

/// Raw query parameters for a location query, as they arrive from a client.
/// Every field is optional and may contain arbitrary text; see
/// [LocationQuery::from_params()] for how they are interpreted.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct LocationQueryParams {
    pub keyword: Option<String>,
    pub area: Option<String>,
    pub distance: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub sort: Option<String>,
}

/// A validated location query
#[derive(Clone, Debug, PartialEq)]
pub struct LocationQuery {
    /// Case-insensitive substring that the name must contain
    pub keyword: Option<String>,
    /// The area the location must be in, ignoring case
    pub area: Option<String>,
    /// Maximum approximate distance in kilometers from `origin`
    pub max_distance_km: Option<f64>,
    /// The reference point for distance filtering and sorting
    pub origin: Coordinates,
    pub sort: SortField,
}

impl Default for LocationQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            area: None,
            max_distance_km: None,
            origin: Coordinates::default(),
            sort: SortField::default(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_float(value: Option<&str>) -> Option<f64> {
    value.and_then(|s| s.trim().parse::<f64>().ok())
}

impl LocationQuery {
    /// Interpret client-supplied parameters. This never fails: a coordinate
    /// that can't be parsed falls back to the matching component of
    /// `default_origin`, an unusable distance disables distance filtering and
    /// an unknown sort order means sorting by name.
    pub fn from_params(params: &LocationQueryParams, default_origin: Coordinates) -> Self {
        let max_distance_km =
            parse_float(params.distance.as_deref()).filter(|d| d.is_finite() && *d >= 0.0);
        let origin = Coordinates::or_fallback(
            parse_float(params.lat.as_deref()),
            parse_float(params.lng.as_deref()),
            default_origin,
        );
        let sort = params
            .sort
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default();
        Self {
            keyword: non_blank(params.keyword.as_deref()),
            area: non_blank(params.area.as_deref()),
            max_distance_km,
            origin,
            sort,
        }
    }

    /// Build the database filter for this query, or `None` if it matches
    /// every location
    pub fn filter(&self) -> Option<DynFilterPart> {
        let mut builder = and();
        if let Some(keyword) = &self.keyword {
            builder = builder.push(Filter::Name(Cmp::Like, keyword.clone()));
        }
        if let Some(area) = &self.area {
            builder = builder.push(Filter::Area(Cmp::Equal, area.clone()));
        }
        if let Some(km) = self.max_distance_km {
            builder = builder.push(Filter::WithinDistance {
                origin: self.origin,
                km,
            });
        }
        (!builder.is_empty()).then(|| builder.build())
    }

    /// Returns true if `location` satisfies this query. This is the same
    /// predicate that [Location::query()] applies in the database.
    pub fn matches(&self, location: &Location) -> bool {
        if let Some(keyword) = &self.keyword {
            if !fold_case(&location.name).contains(&fold_case(keyword)) {
                return false;
            }
        }
        if let Some(area) = &self.area {
            match &location.area {
                Some(a) if fold_case(a) == fold_case(area) => (),
                _ => return false,
            }
        }
        if let Some(km) = self.max_distance_km {
            if self.origin.planar_degrees_squared(&location.coordinates())
                > km_threshold_to_degrees_squared(km)
            {
                return false;
            }
        }
        true
    }

    /// The approximate distance in kilometers between the query's reference
    /// point and `location`
    pub fn distance_km(&self, location: &Location) -> f64 {
        self.origin.planar_distance_km(&location.coordinates())
    }
}

/// A cultural venue where events take place
#[derive(Debug, sqlx::FromRow, Deserialize, Serialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// A unique ID that identifies this location in the database
    #[sqlx(rename = "locid")]
    pub id: i64,

    /// The identifier of this venue in the external venue dataset
    #[sqlx(rename = "venueid")]
    pub venue_id: Option<String>,

    #[sqlx(rename = "locname")]
    pub name: String,

    pub latitude: f64,

    pub longitude: f64,

    /// The district that this venue is located in
    pub area: Option<String>,

    /// The number of events held at this venue, as reported by the dataset
    #[sqlx(rename = "eventcount")]
    pub event_count: i64,

    #[sqlx(rename = "lastupdated")]
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

#[async_trait]
impl Loadable for Location {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn set_id(&mut self, id: Self::Id) {
        self.id = id
    }

    async fn load(id: Self::Id, db: &Database) -> Result<Self> {
        Self::build_query(Some(Filter::Id(id).into()))
            .build_query_as()
            .fetch_one(db.pool())
            .await
            .map_err(|e| e.into())
    }

    async fn delete_id(id: &Self::Id, db: &Database) -> Result<SqliteQueryResult> {
        sqlx::query("DELETE FROM vn_locations WHERE locid=?")
            .bind(id)
            .execute(db.pool())
            .await
            .map_err(|e| e.into())
    }
}

impl Location {
    /// Creates a new location object with the given data. It will initially
    /// have an invalid ID until it is inserted into the database
    pub fn new(
        venue_id: Option<String>,
        name: String,
        latitude: f64,
        longitude: f64,
        area: Option<String>,
        event_count: i64,
    ) -> Self {
        Self {
            id: Self::invalid_id(),
            venue_id,
            name,
            latitude,
            longitude,
            area,
            event_count,
            last_updated: OffsetDateTime::now_utc(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    fn build_query(filter: Option<DynFilterPart>) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(
            r#"SELECT L.locid, L.venueid, L.locname, L.latitude, L.longitude, L.area,
            L.eventcount, L.lastupdated FROM vn_locations L"#,
        );
        if let Some(f) = filter {
            qb.push(" WHERE ");
            f.add_to_query(&mut qb);
        }
        qb
    }

    /// Loads all matching locations from the database, sorted by name
    pub async fn load_all(filter: Option<DynFilterPart>, db: &Database) -> Result<Vec<Location>> {
        let mut qb = Self::build_query(filter);
        SortField::Name.add_to_query(&mut qb, &Coordinates::default());
        qb.build_query_as()
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Run a location query against the database. The result is filtered by
    /// [LocationQuery::filter()] and sorted by the query's sort field.
    pub async fn query(query: &LocationQuery, db: &Database) -> Result<Vec<Location>> {
        debug!(?query, "Querying locations");
        let mut qb = Self::build_query(query.filter());
        query.sort.add_to_query(&mut qb, &query.origin);
        qb.build_query_as()
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Find locations whose name or area contains `text`, ignoring case. At
    /// most [SEARCH_LIMIT] locations are returned.
    pub async fn search(text: &str, db: &Database) -> Result<Vec<Location>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidData("Search query required".to_string()));
        }
        let filter = or()
            .push(Filter::Name(Cmp::Like, text.to_string()))
            .push(Filter::Area(Cmp::Like, text.to_string()))
            .build();
        let mut qb = Self::build_query(Some(filter));
        SortField::Name.add_to_query(&mut qb, &Coordinates::default());
        qb.push(" ");
        qb.push(LimitSpec::from(SEARCH_LIMIT).to_sql());
        qb.build_query_as()
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    pub async fn load_by_venue_id(venue_id: &str, db: &Database) -> Result<Option<Location>> {
        Self::build_query(Some(Filter::VenueId(venue_id.to_string()).into()))
            .build_query_as()
            .fetch_optional(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Check that the attributes of this location are usable
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidStateMissingAttribute("name".to_string()));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidData(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidData(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        if self.event_count < 0 {
            return Err(Error::InvalidData(format!(
                "event count can't be negative: {}",
                self.event_count
            )));
        }
        Ok(())
    }

    /// Add this location to the database. If this call completes successfully,
    /// the id of this object will be updated to the ID of the inserted row in
    /// the database. The last-updated timestamp is assigned by the database.
    pub async fn insert(&mut self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id != Self::invalid_id() {
            return Err(Error::InvalidInsertObjectAlreadyExists(self.id));
        }
        self.validate()?;

        sqlx::query(
            r#"INSERT INTO vn_locations
            (venueid, locname, locnamefolded, latitude, longitude, area, areafolded, eventcount)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&self.venue_id)
        .bind(&self.name)
        .bind(fold_case(&self.name))
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(&self.area)
        .bind(self.area.as_deref().map(fold_case))
        .bind(self.event_count)
        .execute(db.pool())
        .await
        .inspect(|r| self.id = r.last_insert_rowid())
        .map_err(|e| e.into())
    }

    /// Update the location in the database such that it matches this object.
    /// The last-updated timestamp is set to the current time.
    pub async fn update(&self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id < 0 {
            return Err(Error::InvalidUpdateObjectNotFound);
        }
        self.validate()?;

        sqlx::query(
            r#"UPDATE vn_locations SET venueid=?, locname=?, locnamefolded=?, latitude=?,
            longitude=?, area=?, areafolded=?, eventcount=?, lastupdated=CURRENT_TIMESTAMP
            WHERE locid=?"#,
        )
        .bind(&self.venue_id)
        .bind(&self.name)
        .bind(fold_case(&self.name))
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(&self.area)
        .bind(self.area.as_deref().map(fold_case))
        .bind(self.event_count)
        .bind(self.id)
        .execute(db.pool())
        .await
        .map_err(|e| e.into())
    }
}

/// A location together with all of the events that take place there
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LocationDetail {
    #[serde(flatten)]
    pub location: Location,
    pub events: Vec<Event>,
}

impl LocationDetail {
    pub async fn load(id: i64, db: &Database) -> Result<Self> {
        let location = Location::load(id, db).await?;
        let events = Event::load_for_location(id, db).await?;
        Ok(Self { location, events })
    }
}
