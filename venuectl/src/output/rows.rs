use libvenue::{
    event::Event,
    location::{Location, LocationQuery},
    user::User,
};
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct LocationRow {
    id: i64,
    name: String,
    #[tabled(display("tabled::derive::display::option", ""))]
    area: Option<String>,
    events: i64,
    #[tabled(rename = "Distance (km)", display("display_km"))]
    distance_km: f64,
}

fn display_km(km: &f64) -> String {
    format!("{km:.1}")
}

impl LocationRow {
    /// A row for a location in the results of `query`, which provides the
    /// reference point for the distance column
    pub(crate) fn new(location: &Location, query: &LocationQuery) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            area: location.area.clone(),
            events: location.event_count,
            distance_km: query.distance_km(location),
        }
    }
}

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct LocationRowDetails {
    id: i64,
    #[tabled(display("tabled::derive::display::option", ""))]
    venue_id: Option<String>,
    name: String,
    latitude: f64,
    longitude: f64,
    #[tabled(display("tabled::derive::display::option", ""))]
    area: Option<String>,
    event_count: i64,
    last_updated: String,
    #[tabled(display("display_events"))]
    events: Vec<String>,
}

fn display_events(events: &[String]) -> String {
    match events.is_empty() {
        true => "No events".to_string(),
        false => events.join("\n"),
    }
}

impl LocationRowDetails {
    pub(crate) fn new(location: &Location, events: &[Event]) -> Self {
        Self {
            id: location.id,
            venue_id: location.venue_id.clone(),
            name: location.name.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            area: location.area.clone(),
            event_count: location.event_count,
            last_updated: location.last_updated.to_string(),
            events: events
                .iter()
                .map(|e| format!("{} {} ({})", e.date, e.title, e.id))
                .collect(),
        }
    }
}

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct EventRow {
    id: i64,
    date: String,
    #[tabled(display("tabled::derive::display::option", ""))]
    time: Option<String>,
    title: String,
    #[tabled(display("tabled::derive::display::option", ""))]
    presenter: Option<String>,
    #[tabled(display("tabled::derive::display::option", ""))]
    location: Option<String>,
}

impl EventRow {
    pub(crate) fn new(event: &Event) -> Self {
        Self {
            id: event.id,
            date: event.date.to_string(),
            time: event.time.clone(),
            title: event.title.clone(),
            presenter: event.presenter.clone(),
            location: event.location.object().map(|loc| loc.name.clone()),
        }
    }
}

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct UserRow {
    id: i64,
    username: String,
    #[tabled(display("tabled::derive::display::option", ""))]
    email: Option<String>,
    role: String,
}

impl UserRow {
    pub(crate) fn new(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
        }
    }
}
