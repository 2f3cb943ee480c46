use super::Message;
use crate::{
    auth::SqliteUser,
    error::Error,
    state::AppState,
    util::extract::{Json, Path},
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use libvenue::comment::{Comment, NewComment};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_comment))
        .route("/location/{location_id}", get(list_comments))
        .route("/{id}", delete(delete_comment))
}

async fn list_comments(
    _user: SqliteUser,
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let comments = Comment::load_for_location(location_id, &state.db).await?;
    Ok(axum::Json(comments))
}

async fn add_comment(
    user: SqliteUser,
    State(state): State<AppState>,
    Json(new): Json<NewComment>,
) -> Result<impl IntoResponse, Error> {
    let comment = Comment::create(&new, &user, &state.db)
        .await
        .map_err(Error::not_found("Location not found"))?;
    Ok((StatusCode::CREATED, axum::Json(comment)))
}

async fn delete_comment(
    user: SqliteUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    Comment::delete_as(id, &user, &state.db)
        .await
        .map_err(Error::not_found("Comment not found"))?;
    Ok(Message::new("Comment deleted"))
}
