use super::Message;
use crate::{
    auth::{AdminUser, SqliteUser},
    error::Error,
    state::AppState,
    util::extract::{Json, Path, Query},
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use libvenue::{
    core::loadable::Loadable,
    location::{Location, LocationDetail, LocationQuery, LocationQueryParams},
};
use serde::Deserialize;
use tracing::info;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(add_location))
        .route("/search/query", get(search_locations))
        .route(
            "/{id}",
            get(show_location)
                .put(modify_location)
                .delete(delete_location),
        )
}

async fn list_locations(
    _user: SqliteUser,
    State(state): State<AppState>,
    Query(params): Query<LocationQueryParams>,
) -> Result<impl IntoResponse, Error> {
    let query = LocationQuery::from_params(&params, state.reference_point());
    let locations = Location::query(&query, &state.db).await?;
    Ok(axum::Json(locations))
}

async fn show_location(
    _user: SqliteUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let detail = LocationDetail::load(id, &state.db)
        .await
        .map_err(Error::not_found("Location not found"))?;
    Ok(axum::Json(detail))
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search_locations(
    _user: SqliteUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, Error> {
    let q = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("Search query required".to_string()))?;
    let locations = Location::search(&q, &state.db).await?;
    Ok(axum::Json(locations))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationParams {
    venue_id: Option<String>,
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    area: Option<String>,
    event_count: Option<i64>,
}

impl LocationParams {
    fn is_empty(&self) -> bool {
        self.venue_id.is_none()
            && self.name.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.area.is_none()
            && self.event_count.is_none()
    }

    /// Build a new location from the parameters. The venue id, name and
    /// coordinates are required.
    fn validate(self) -> Result<Location, Error> {
        match (self.venue_id, self.name, self.latitude, self.longitude) {
            (Some(venue_id), Some(name), Some(latitude), Some(longitude))
                if !venue_id.trim().is_empty() && !name.trim().is_empty() =>
            {
                Ok(Location::new(
                    Some(venue_id.trim().to_string()),
                    name.trim().to_string(),
                    latitude,
                    longitude,
                    self.area,
                    self.event_count.unwrap_or_default(),
                ))
            }
            _ => Err(Error::BadRequest(
                "Venue id, name, latitude and longitude required".to_string(),
            )),
        }
    }

    fn apply(self, loc: &mut Location) {
        if let Some(venue_id) = self.venue_id {
            loc.venue_id = Some(venue_id);
        }
        if let Some(name) = self.name {
            loc.name = name;
        }
        if let Some(latitude) = self.latitude {
            loc.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            loc.longitude = longitude;
        }
        if let Some(area) = self.area {
            loc.area = Some(area);
        }
        if let Some(event_count) = self.event_count {
            loc.event_count = event_count;
        }
    }
}

async fn add_location(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Json(params): Json<LocationParams>,
) -> Result<impl IntoResponse, Error> {
    let mut location = params.validate()?;
    location.insert(&state.db).await?;
    info!(id = location.id, admin = user.username, "Added location");
    let location = Location::load(location.id, &state.db).await?;
    Ok((StatusCode::CREATED, axum::Json(location)))
}

async fn modify_location(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<LocationParams>,
) -> Result<impl IntoResponse, Error> {
    if params.is_empty() {
        return Err(Error::BadRequest("No fields to update".to_string()));
    }
    let mut location = Location::load(id, &state.db)
        .await
        .map_err(Error::not_found("Location not found"))?;
    params.apply(&mut location);
    location.update(&state.db).await?;
    let location = Location::load(id, &state.db).await?;
    Ok(axum::Json(location))
}

async fn delete_location(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let res = Location::delete_id(&id, &state.db).await?;
    if res.rows_affected() == 0 {
        return Err(Error::NotFound("Location not found".to_string()));
    }
    info!(id, admin = user.username, "Deleted location");
    Ok(Message::new("Location deleted"))
}
