use crate::{TemplateKey, auth::SqliteUser, error::Error, state::AppState};
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use libvenue::event::Event;
use minijinja::context;
use rand::{SeedableRng, rngs::StdRng};

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/random", get(random_event))
}

async fn random_event(
    user: SqliteUser,
    TemplateKey(key): TemplateKey,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let mut rng = StdRng::from_entropy();
    let event = Event::pick_random(&mut rng, &state.db).await?;
    let location = event
        .as_ref()
        .and_then(|e| e.location.object())
        .cloned();
    Ok(state.render_template(
        key,
        context!(user => user, event => event, location => location),
    ))
}
