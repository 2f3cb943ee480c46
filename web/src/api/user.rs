use super::Message;
use crate::{
    auth::AdminUser,
    error::Error,
    state::AppState,
    util::extract::{Json, Path},
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use libvenue::{
    core::loadable::Loadable,
    user::{Role, User},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::info;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(add_user))
        .route("/{id}", delete(delete_user))
}

async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let users = User::load_all(&state.db).await?;
    Ok(axum::Json(users))
}

#[derive(Deserialize)]
struct NewUser {
    username: String,
    password: SecretString,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    email: Option<String>,
}

impl NewUser {
    fn validate(self) -> Result<User, Error> {
        User::validate_username(&self.username)?;
        User::validate_password(self.password.expose_secret())?;
        let pwhash = User::hash_password(self.password.expose_secret())?;
        let email = self.email.filter(|e| !e.trim().is_empty());
        Ok(User::new(
            self.username,
            email,
            pwhash,
            self.role.unwrap_or_default(),
        ))
    }
}

async fn add_user(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(params): Json<NewUser>,
) -> Result<impl IntoResponse, Error> {
    let mut user = params.validate()?;
    user.insert(&state.db).await.map_err(|e| {
        if e.is_unique_violation() {
            Error::BadRequest(format!("User '{}' already exists", user.username))
        } else {
            e.into()
        }
    })?;
    info!(username = user.username, admin = admin.username, "Added user");
    Ok((StatusCode::CREATED, axum::Json(user)))
}

async fn delete_user(
    admin: AdminUser,
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
    info!(id, admin = admin.username, "Deleted user");
    Ok(Message::new("User deleted"))
}
