use crate::{
    TemplateKey,
    auth::SqliteUser,
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
use libvenue::favorite::Favorite;
use minijinja::context;
use serde::Deserialize;
use tracing::debug;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/{location_id}/remove", post(remove_favorite))
}

async fn list_favorites(
    user: SqliteUser,
    TemplateKey(key): TemplateKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let locations = Favorite::locations_for_user(user.id, &state.db).await?;
    Ok(state.render_template(key, context!(user => user, locations => locations)))
}

#[derive(Debug, Deserialize)]
struct FavoriteParams {
    location_id: i64,
}

async fn add_favorite(
    user: SqliteUser,
    State(state): State<AppState>,
    Form(params): Form<FavoriteParams>,
) -> Result<impl IntoResponse, Error> {
    Favorite::add(user.id, params.location_id, &state.db)
        .await
        .map_err(Error::not_found("Location not found"))?;
    debug!(location = params.location_id, "Added favorite");
    Ok(Redirect::to(&app_url(&format!(
        "/locations/{}",
        params.location_id
    ))))
}

async fn remove_favorite(
    user: SqliteUser,
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    Favorite::remove(user.id, location_id, &state.db)
        .await
        .map_err(Error::not_found("Favorite not found"))?;
    Ok(Redirect::to(&app_url("/favorites")))
}
