use super::Message;
use crate::{
    auth::SqliteUser,
    error::Error,
    state::AppState,
    util::extract::{Json, Path, Query},
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use libvenue::{empty_string_as_none, favorite::Favorite};
use serde::{Deserialize, Serialize};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/check/{location_id}", get(check_favorite))
        .route("/{location_id}", delete(remove_favorite))
}

async fn list_favorites(
    user: SqliteUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let locations = Favorite::locations_for_user(user.id, &state.db).await?;
    Ok(axum::Json(locations))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewFavorite {
    location_id: Option<i64>,
}

async fn add_favorite(
    user: SqliteUser,
    State(state): State<AppState>,
    Json(params): Json<NewFavorite>,
) -> Result<impl IntoResponse, Error> {
    let location_id = params
        .location_id
        .ok_or_else(|| Error::BadRequest("Location required".to_string()))?;
    let favorite = Favorite::add(user.id, location_id, &state.db)
        .await
        .map_err(Error::not_found("Location not found"))?;
    Ok((StatusCode::CREATED, axum::Json(favorite)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    user_id: Option<i64>,
}

async fn remove_favorite(
    user: SqliteUser,
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
    Query(owner): Query<OwnerParams>,
) -> Result<impl IntoResponse, Error> {
    let owner_id = owner.user_id.unwrap_or(user.id);
    Favorite::remove_as(&user, owner_id, location_id, &state.db)
        .await
        .map_err(Error::not_found("Favorite not found"))?;
    Ok(Message::new("Removed from favorites"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteStatus {
    is_favorited: bool,
}

async fn check_favorite(
    user: SqliteUser,
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let is_favorited = Favorite::is_favorited(user.id, location_id, &state.db).await?;
    Ok(axum::Json(FavoriteStatus { is_favorited }))
}
