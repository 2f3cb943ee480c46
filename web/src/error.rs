use axum::{
    Json,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection, PathRejection},
    },
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use axum_extra::extract::QueryRejection;
use minijinja::context;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::state::AppState;

const MAX_ERROR_BODY: usize = 64 * 1024;

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("You are not logged in: {0}")]
    Unauthorized(String),
    #[error("You are not allowed to perform this action: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Library(#[from] libvenue::Error),
    #[error("Resource Not Found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("The request body was rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("The form data was rejected: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("The query string was rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("The path was rejected: {0}")]
    PathRejection(#[from] PathRejection),
}

impl Error {
    pub(crate) fn to_client_status(&self) -> (StatusCode, String) {
        match self {
            Error::Other(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Error::Library(e) => library_status(e),
            Error::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            Error::Forbidden(message) => (StatusCode::FORBIDDEN, message.clone()),
            Error::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Error::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::JsonRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            Error::FormRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            Error::QueryRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.to_string()),
            Error::PathRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
        }
    }

    /// Convert a library error into a [Error::NotFound] with the given message
    /// if it indicates that the object doesn't exist
    pub(crate) fn not_found(message: &str) -> impl FnOnce(libvenue::Error) -> Error + '_ {
        move |e| {
            if e.is_not_found() {
                Error::NotFound(message.to_string())
            } else {
                e.into()
            }
        }
    }
}

fn library_status(e: &libvenue::Error) -> (StatusCode, String) {
    use libvenue::Error as E;
    match e {
        E::PermissionDenied => (StatusCode::FORBIDDEN, "Not authorized".to_string()),
        E::DuplicateFavorite => (StatusCode::BAD_REQUEST, "Already in favorites".to_string()),
        E::InvalidData(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        E::InvalidStateMissingAttribute(attr) => {
            (StatusCode::BAD_REQUEST, format!("Missing required field '{attr}'"))
        }
        E::AuthInvalidUsernameTooShort | E::AuthInvalidUsernameInvalidCharacters(_) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        E::AuthUserNotFound => (StatusCode::UNAUTHORIZED, e.to_string()),
        e if e.is_not_found() => (StatusCode::NOT_FOUND, "Not found".to_string()),
        e if e.is_unique_violation() => (StatusCode::BAD_REQUEST, "Already exists".to_string()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

// Tell axum how to convert `Error` into a response.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // placeholder, will get refined in the response mapper
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        // insert the error into the response so that we can log it in the response mapper.
        response.extensions_mut().insert(Arc::new(self));
        response
    }
}

fn log_error(err: &Error, status: StatusCode) {
    if status.is_server_error() {
        error!(?err, "Request failed");
    } else {
        debug!(?err, %status, "Request rejected");
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Response mapper for the API. Errors raised by handlers and rejections
/// produced by axum itself are both turned into a json body of the form
/// `{"error": "message"}`.
pub(crate) async fn api_response_mapper(response: Response) -> Response {
    if let Some(err) = response.extensions().get::<Arc<Error>>().cloned() {
        let (status, message) = err.to_client_status();
        log_error(&err, status);
        return (status, Json(json!({ "error": message }))).into_response();
    }
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }
    let text = axum::body::to_bytes(response.into_body(), MAX_ERROR_BODY)
        .await
        .map(|b| String::from_utf8_lossy(&b).trim().to_string())
        .unwrap_or_default();
    let message = if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text
    };
    warn!(%status, message, "Rewriting error response");
    (status, Json(json!({ "error": message }))).into_response()
}

/// Response mapper for the html pages: handler errors are rendered as an
/// error page with the appropriate status
pub(crate) async fn html_response_mapper(
    State(state): State<AppState>,
    response: Response,
) -> Response {
    match response.extensions().get::<Arc<Error>>().cloned() {
        Some(err) => {
            let (status, message) = err.to_client_status();
            log_error(&err, status);
            let page = state.render_template(
                "error.html.j2",
                context!(status => status.as_u16(), message => message),
            );
            let mut response = page.into_response();
            *response.status_mut() = status;
            response
        }
        None => response,
    }
}
