use crate::state::AppState;
use axum::Router;
use serde::Serialize;

mod auth;
mod comment;
mod event;
mod favorite;
mod location;
#[cfg(test)]
mod tests;
mod user;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/locations", location::router())
        .nest("/events", event::router())
        .nest("/comments", comment::router())
        .nest("/favorites", favorite::router())
        .nest("/users", user::router())
}

/// A simple acknowledgement returned by operations that have no other result
#[derive(Serialize)]
pub(crate) struct Message {
    message: String,
}

impl Message {
    pub(crate) fn new<S: Into<String>>(message: S) -> axum::Json<Self> {
        axum::Json(Self {
            message: message.into(),
        })
    }
}
