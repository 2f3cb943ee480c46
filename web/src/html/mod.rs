use crate::{auth::AuthSession, state::AppState, util::app_url};
use axum::{
    Router,
    extract::{OriginalUri, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use minijinja::context;

mod admin;
pub(crate) mod auth;
mod event;
mod favorite;
mod location;
#[cfg(test)]
mod tests;

/// Pages behind this middleware answer anonymous visitors with the login form
async fn login_required(
    State(state): State<AppState>,
    auth: AuthSession,
    OriginalUri(uri): OriginalUri,
    request: Request,
    next_layer: Next,
) -> Response {
    if auth.user.is_some() {
        return next_layer.run(request).await;
    }
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    (
        StatusCode::UNAUTHORIZED,
        state.render_template("auth_login.html.j2", context!(next => next)),
    )
        .into_response()
}

pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/locations", location::router())
        .nest("/favorites", favorite::router())
        .nest("/events", event::router())
        .nest("/admin", admin::router())
        /* Anything above here is only available to logged-in users */
        .route_layer(middleware::from_fn_with_state(state, login_required))
        .route("/", get(root))
        .nest("/auth", auth::router())
}

async fn root() -> impl IntoResponse {
    Redirect::to(&app_url("/locations"))
}
