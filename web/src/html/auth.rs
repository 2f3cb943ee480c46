use crate::{
    TemplateKey,
    auth::{AuthSession, Credentials},
    error::Error,
    state::AppState,
    util::{
        app_url,
        extract::{Form, Query},
    },
};
use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use minijinja::context;
use serde::Deserialize;
use tracing::debug;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(show_login).post(do_login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub(crate) struct NextUrl {
    next: Option<String>,
}

/// Only redirect to paths within the app after logging in
fn local_redirect(next: Option<String>) -> String {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or_else(|| app_url("/locations"))
}

async fn show_login(
    TemplateKey(key): TemplateKey,
    auth: AuthSession,
    State(app): State<AppState>,
    Query(NextUrl { next }): Query<NextUrl>,
) -> Result<impl IntoResponse, Error> {
    Ok(app.render_template(key, context!(user => auth.user, next => next)))
}

async fn do_login(
    TemplateKey(key): TemplateKey,
    mut auth: AuthSession,
    State(app): State<AppState>,
    Form(creds): Form<Credentials>,
) -> Result<Response, Error> {
    let username = creds.username.clone();
    let next = creds.next.clone();
    let Some(user) = auth
        .authenticate(creds)
        .await
        .context("Unable to authenticate")?
    else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            app.render_template(
                key,
                context!(
                    username => username,
                    next => next,
                    error => "Invalid username or password",
                ),
            ),
        )
            .into_response());
    };
    auth.login(&user).await.context("Unable to log in")?;
    debug!(username, "Logged in");
    Ok(Redirect::to(&local_redirect(next)).into_response())
}

async fn logout(mut auth: AuthSession) -> Result<impl IntoResponse, Error> {
    auth.logout().await.context("Unable to log out")?;
    Ok(Redirect::to(&app_url("/auth/login")))
}
