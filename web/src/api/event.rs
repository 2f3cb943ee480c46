use super::Message;
use crate::{
    auth::{AdminUser, SqliteUser},
    error::Error,
    state::AppState,
    util::extract::{Json, Path},
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use libvenue::{
    core::loadable::{ExternalRef, Loadable},
    event::Event,
    location::Location,
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;
use time::Date;
use tracing::info;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_event))
        .route("/location/{location_id}", get(list_events))
        .route("/random/pick", get(random_event))
        .route("/{id}", put(modify_event).delete(delete_event))
}

async fn list_events(
    _user: SqliteUser,
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let events = Event::load_for_location(location_id, &state.db).await?;
    Ok(axum::Json(events))
}

async fn random_event(
    _user: SqliteUser,
    State(state): State<AppState>,
) -> Result<Response, Error> {
    let mut rng = StdRng::from_entropy();
    match Event::pick_random(&mut rng, &state.db).await? {
        Some(event) => Ok(axum::Json(event).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventParams {
    location_id: Option<i64>,
    title: Option<String>,
    date: Option<Date>,
    time: Option<String>,
    description: Option<String>,
    presenter: Option<String>,
}

impl EventParams {
    fn is_empty(&self) -> bool {
        self.location_id.is_none()
            && self.title.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.description.is_none()
            && self.presenter.is_none()
    }
}

/// Make sure that the location exists before attaching events to it
async fn require_location(id: i64, state: &AppState) -> Result<(), Error> {
    Location::load(id, &state.db)
        .await
        .map(|_| ())
        .map_err(Error::not_found("Location not found"))
}

async fn add_event(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Json(params): Json<EventParams>,
) -> Result<impl IntoResponse, Error> {
    let (Some(location_id), Some(title), Some(date)) = (
        params.location_id,
        params.title.filter(|t| !t.trim().is_empty()),
        params.date,
    ) else {
        return Err(Error::BadRequest(
            "Location, title and date required".to_string(),
        ));
    };
    require_location(location_id, &state).await?;
    let mut event = Event::new(
        location_id,
        title.trim().to_string(),
        date,
        params.time,
        params.description,
        params.presenter,
    );
    event.insert(&state.db).await?;
    info!(id = event.id, admin = user.username, "Added event");
    Ok((StatusCode::CREATED, axum::Json(event)))
}

async fn modify_event(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(params): Json<EventParams>,
) -> Result<impl IntoResponse, Error> {
    if params.is_empty() {
        return Err(Error::BadRequest("No fields to update".to_string()));
    }
    let mut event = Event::load(id, &state.db)
        .await
        .map_err(Error::not_found("Event not found"))?;
    if let Some(location_id) = params.location_id {
        require_location(location_id, &state).await?;
        event.location = ExternalRef::Stub(location_id);
    }
    if let Some(title) = params.title {
        event.title = title;
    }
    if let Some(date) = params.date {
        event.date = date;
    }
    if let Some(time) = params.time {
        event.time = Some(time);
    }
    if let Some(description) = params.description {
        event.description = Some(description);
    }
    if let Some(presenter) = params.presenter {
        event.presenter = Some(presenter);
    }
    event.update(&state.db).await?;
    Ok(axum::Json(event))
}

async fn delete_event(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let res = Event::delete_id(&id, &state.db).await?;
    if res.rows_affected() == 0 {
        return Err(Error::NotFound("Event not found".to_string()));
    }
    Ok(Message::new("Event deleted"))
}
