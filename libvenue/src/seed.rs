//! Importing venues and their events from the venue dataset
use crate::{Database, Result, event::Event, location::Location};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, info};

/// An event as it appears in the venue dataset
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeedEvent {
    pub title: String,
    pub date: Date,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub presenter: Option<String>,
}

/// A venue as it appears in the venue dataset
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeedVenue {
    pub venue_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub event_count: i64,
    #[serde(default)]
    pub events: Vec<SeedEvent>,
}

/// The result of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    /// venues that were added to the database
    pub venues_added: usize,
    /// venues that were already present and left untouched
    pub venues_skipped: usize,
    pub events_added: usize,
}

/// Parse the venue dataset, a JSON array of venues
pub fn parse_venues(json: &str) -> Result<Vec<SeedVenue>> {
    serde_json::from_str(json).map_err(|e| e.into())
}

/// Add the given venues and their events to the database. A venue whose venue
/// id is already present is skipped along with its events, so importing the
/// same dataset more than once is harmless.
pub async fn import_venues<F>(
    db: &Database,
    venues: Vec<SeedVenue>,
    mut progress: F,
) -> Result<SeedSummary>
where
    F: FnMut(&SeedVenue),
{
    let mut summary = SeedSummary::default();
    for venue in venues {
        if Location::load_by_venue_id(&venue.venue_id, db)
            .await?
            .is_some()
        {
            debug!(venue = venue.venue_id, "Venue already exists, skipping");
            summary.venues_skipped += 1;
            progress(&venue);
            continue;
        }
        let mut location = Location::new(
            Some(venue.venue_id.clone()),
            venue.name.clone(),
            venue.latitude,
            venue.longitude,
            venue.area.clone(),
            venue.event_count,
        );
        location.insert(db).await?;
        summary.venues_added += 1;
        for ev in &venue.events {
            let mut event = Event::new(
                location.id,
                ev.title.clone(),
                ev.date,
                ev.time.clone(),
                ev.description.clone(),
                ev.presenter.clone(),
            );
            event.insert(db).await?;
            summary.events_added += 1;
        }
        progress(&venue);
    }
    info!(?summary, "Imported venues");
    Ok(summary)
}
