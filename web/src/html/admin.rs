//! Pages for administrators to manage locations, events and users
use crate::{
    TemplateKey,
    auth::AdminUser,
    error::Error,
    state::AppState,
    util::{
        app_url,
        extract::{Form, Path},
    },
};
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use libvenue::{
    core::loadable::Loadable,
    empty_string_as_none,
    event::Event,
    location::Location,
    user::{Role, User},
};
use minijinja::context;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum::IntoEnumIterator;
use time::{Date, format_description::well_known::Iso8601};
use tracing::info;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations).post(add_location))
        .route("/locations/{id}/delete", post(delete_location))
        .route("/events", get(list_events).post(add_event))
        .route("/events/{id}/delete", post(delete_event))
        .route("/users", get(list_users).post(add_user))
        .route("/users/{id}/delete", post(delete_user))
}

async fn list_locations(
    AdminUser(user): AdminUser,
    TemplateKey(key): TemplateKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let locations = Location::load_all(None, &state.db).await?;
    Ok(state.render_template(key, context!(user => user, locations => locations)))
}

#[derive(Debug, Deserialize)]
struct LocationForm {
    venue_id: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    area: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    event_count: Option<i64>,
}

async fn add_location(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Form(params): Form<LocationForm>,
) -> Result<impl IntoResponse, Error> {
    let venue_id = params.venue_id.trim();
    let name = params.name.trim();
    let (Some(latitude), Some(longitude)) = (params.latitude, params.longitude) else {
        return Err(Error::BadRequest(
            "Venue id, name, latitude and longitude required".to_string(),
        ));
    };
    if venue_id.is_empty() || name.is_empty() {
        return Err(Error::BadRequest(
            "Venue id, name, latitude and longitude required".to_string(),
        ));
    }
    let mut location = Location::new(
        Some(venue_id.to_string()),
        name.to_string(),
        latitude,
        longitude,
        params.area.map(|a| a.trim().to_string()),
        params.event_count.unwrap_or_default(),
    );
    location.insert(&state.db).await.map_err(|e| {
        if e.is_unique_violation() {
            Error::BadRequest(format!("Venue '{venue_id}' already exists"))
        } else {
            e.into()
        }
    })?;
    info!(id = location.id, admin = %user.username, "Added location");
    Ok(Redirect::to(&app_url("/admin/locations")))
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
    info!(id, admin = %user.username, "Deleted location");
    Ok(Redirect::to(&app_url("/admin/locations")))
}

async fn list_events(
    AdminUser(user): AdminUser,
    TemplateKey(key): TemplateKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let events = Event::load_all(&state.db).await?;
    let locations = Location::load_all(None, &state.db).await?;
    Ok(state.render_template(
        key,
        context!(user => user, events => events, locations => locations),
    ))
}

#[derive(Debug, Deserialize)]
struct EventForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    location_id: Option<i64>,
    title: String,
    date: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    time: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    presenter: Option<String>,
}

async fn add_event(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Form(params): Form<EventForm>,
) -> Result<impl IntoResponse, Error> {
    let title = params.title.trim();
    let date = Date::parse(params.date.trim(), &Iso8601::DATE).ok();
    let (Some(location_id), Some(date)) = (params.location_id, date) else {
        return Err(Error::BadRequest(
            "Location, title and date required".to_string(),
        ));
    };
    if title.is_empty() {
        return Err(Error::BadRequest(
            "Location, title and date required".to_string(),
        ));
    }
    Location::load(location_id, &state.db)
        .await
        .map_err(Error::not_found("Location not found"))?;
    let mut event = Event::new(
        location_id,
        title.to_string(),
        date,
        params.time,
        params.description,
        params.presenter,
    );
    event.insert(&state.db).await?;
    info!(id = event.id, admin = %user.username, "Added event");
    Ok(Redirect::to(&app_url("/admin/events")))
}

async fn delete_event(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let res = Event::delete_id(&id, &state.db).await?;
    if res.rows_affected() == 0 {
        return Err(Error::NotFound("Event not found".to_string()));
    }
    info!(id, admin = %user.username, "Deleted event");
    Ok(Redirect::to(&app_url("/admin/events")))
}

async fn list_users(
    AdminUser(user): AdminUser,
    TemplateKey(key): TemplateKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let users = User::load_all(&state.db).await?;
    let roles: Vec<Role> = Role::iter().collect();
    Ok(state.render_template(
        key,
        context!(user => user, users => users, roles => roles),
    ))
}

#[derive(Debug, Deserialize)]
struct UserForm {
    username: String,
    password: SecretString,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    role: Option<Role>,
}

async fn add_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Form(params): Form<UserForm>,
) -> Result<impl IntoResponse, Error> {
    let username = params.username.trim().to_string();
    User::validate_username(&username)?;
    User::validate_password(params.password.expose_secret())?;
    let pwhash = User::hash_password(params.password.expose_secret())?;
    let mut user = User::new(
        username,
        params.email,
        pwhash,
        params.role.unwrap_or_default(),
    );
    user.insert(&state.db).await.map_err(|e| {
        if e.is_unique_violation() {
            Error::BadRequest(format!("User '{}' already exists", user.username))
        } else {
            e.into()
        }
    })?;
    info!(username = %user.username, admin = %admin.username, "Added user");
    Ok(Redirect::to(&app_url("/admin/users")))
}

async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    if id == admin.id {
        return Err(Error::BadRequest("You cannot delete yourself".to_string()));
    }
    let res = User::delete_id(&id, &state.db).await?;
    if res.rows_affected() == 0 {
        return Err(Error::NotFound("User not found".to_string()));
    }
    info!(id, admin = %admin.username, "Deleted user");
    Ok(Redirect::to(&app_url("/admin/users")))
}
