use crate::{
    TemplateKey,
    auth::SqliteUser,
    error::Error,
    state::AppState,
    util::{
        FilterSortOption, app_url,
        extract::{Form, Path, Query},
    },
};
use axum::{
    Router,
    extract::{OriginalUri, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use libvenue::{
    comment::{Comment, NewComment},
    favorite::Favorite,
    location::{Location, LocationDetail, LocationQuery, LocationQueryParams, SortField},
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::trace;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations))
        .route("/{id}", get(show_location))
        .route("/{id}/comment", post(add_comment))
        .route("/{id}/comments/{comment_id}/delete", post(delete_comment))
}

/// A location in a result list together with its approximate distance from
/// the query's reference point
#[derive(Serialize)]
struct LocationRow {
    #[serde(flatten)]
    location: Location,
    distance_km: f64,
}

fn sort_options(selected: SortField) -> Vec<FilterSortOption<SortField>> {
    SortField::iter()
        .map(|field| FilterSortOption {
            name: match field {
                SortField::Name => "Name",
                SortField::Distance => "Distance",
                SortField::Events => "Number of events",
            }
            .to_string(),
            value: field,
            selected: field == selected,
        })
        .collect()
}

async fn list_locations(
    user: SqliteUser,
    TemplateKey(key): TemplateKey,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<LocationQueryParams>,
) -> Result<impl IntoResponse, Error> {
    let query = LocationQuery::from_params(&params, state.reference_point());
    trace!(?query, "Listing locations");
    // the database has already applied the filter, but re-check the results
    // against the exact same predicate before displaying them
    let locations: Vec<LocationRow> = Location::query(&query, &state.db)
        .await?
        .into_iter()
        .filter(|loc| query.matches(loc))
        .map(|location| LocationRow {
            distance_km: query.distance_km(&location),
            location,
        })
        .collect();
    Ok(state.render_template(
        key,
        context!(
            user => user,
            locations => locations,
            params => params,
            origin => query.origin,
            sort_options => sort_options(query.sort),
            current_url => uri.to_string(),
        ),
    ))
}

async fn show_location(
    user: SqliteUser,
    TemplateKey(key): TemplateKey,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let detail = LocationDetail::load(id, &state.db)
        .await
        .map_err(Error::not_found("Location not found"))?;
    let comments = Comment::load_for_location(id, &state.db).await?;
    let is_favorited = Favorite::is_favorited(user.id, id, &state.db).await?;
    Ok(state.render_template(
        key,
        context!(
            user => user,
            location => detail.location,
            events => detail.events,
            comments => comments,
            is_favorited => is_favorited,
        ),
    ))
}

#[derive(Debug, Deserialize)]
struct CommentParams {
    text: String,
    rating: Option<i64>,
}

async fn add_comment(
    user: SqliteUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(params): Form<CommentParams>,
) -> Result<impl IntoResponse, Error> {
    let new = NewComment {
        location_id: Some(id),
        text: Some(params.text),
        rating: params.rating,
    };
    Comment::create(&new, &user, &state.db)
        .await
        .map_err(Error::not_found("Location not found"))?;
    Ok(Redirect::to(&app_url(&format!("/locations/{id}"))))
}

async fn delete_comment(
    user: SqliteUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, Error> {
    Comment::delete_as(comment_id, &user, &state.db)
        .await
        .map_err(Error::not_found("Comment not found"))?;
    Ok(Redirect::to(&app_url(&format!("/locations/{id}"))))
}
