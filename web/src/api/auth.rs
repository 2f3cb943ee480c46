use super::Message;
use crate::{
    auth::{AuthSession, Credentials, SqliteUser},
    error::Error,
    state::AppState,
    util::extract::Json,
};
use anyhow::Context;
use axum::{
    Router,
    response::IntoResponse,
    routing::{get, post},
};
use libvenue::user::User;
use tracing::debug;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    mut auth: AuthSession,
    Json(creds): Json<Credentials>,
) -> Result<impl IntoResponse, Error> {
    let username = creds.username.clone();
    let user = auth
        .authenticate(creds)
        .await
        .context("Unable to authenticate")?
        .ok_or_else(|| Error::Unauthorized("Invalid username or password".to_string()))?;
    auth.login(&user).await.context("Unable to log in")?;
    debug!(username, "Logged in");
    Ok(axum::Json(User::from(user)))
}

async fn logout(mut auth: AuthSession) -> Result<impl IntoResponse, Error> {
    auth.logout().await.context("Unable to log out")?;
    Ok(Message::new("Logged out"))
}

async fn me(user: SqliteUser) -> impl IntoResponse {
    axum::Json(User::from(user))
}
