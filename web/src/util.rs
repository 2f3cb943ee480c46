use crate::APP_PREFIX;
use axum::http::Uri;
use minijinja::ErrorKind;
use serde::Serialize;
use std::collections::BTreeMap;

pub(crate) fn app_url(value: &str) -> String {
    [APP_PREFIX, "/", value.trim_start_matches('/')].join("")
}

/// Extractors that report rejections through [crate::error::Error] so that
/// they are rendered like any other error
pub(crate) mod extract {
    use crate::error::Error;
    use axum::extract::{FromRequest, FromRequestParts};

    #[derive(FromRequest)]
    #[from_request(via(axum::Json), rejection(Error))]
    pub(crate) struct Json<T>(pub(crate) T);

    #[derive(FromRequest)]
    #[from_request(via(axum::Form), rejection(Error))]
    pub(crate) struct Form<T>(pub(crate) T);

    #[derive(FromRequestParts)]
    #[from_request(via(axum_extra::extract::Query), rejection(Error))]
    pub(crate) struct Query<T>(pub(crate) T);

    #[derive(FromRequestParts)]
    #[from_request(via(axum::extract::Path), rejection(Error))]
    pub(crate) struct Path<T>(pub(crate) T);
}

/// An option in a select box for choosing how to sort or filter a list
#[derive(Serialize)]
pub(crate) struct FilterSortOption<T: Serialize> {
    pub(crate) name: String,
    pub(crate) value: T,
    pub(crate) selected: bool,
}

/// A minijinja template filter for appending (or replacing) a given query param
/// to a url.
pub(crate) fn append_query_param(
    uristr: &str,
    key: &str,
    value: &str,
) -> Result<String, minijinja::Error> {
    let uri = uristr.parse::<Uri>().map_err(|e| {
        minijinja::Error::new(ErrorKind::InvalidOperation, "Unable to parse uri string")
            .with_source(e)
    })?;
    let mut query: BTreeMap<String, String> = match uri.query() {
        Some(q) => serde_urlencoded::from_str(q).map_err(|e| {
            minijinja::Error::new(ErrorKind::InvalidOperation, "Unable to decode query params")
                .with_source(e)
        })?,
        None => BTreeMap::new(),
    };
    query.insert(key.to_string(), value.to_string());
    let querystring = serde_urlencoded::to_string(query).map_err(|e| {
        minijinja::Error::new(ErrorKind::InvalidOperation, "Unable to encode query params")
            .with_source(e)
    })?;

    Ok(format!("{path}?{querystring}", path = uri.path()))
}

/// A minijinja template filter for showing an approximate distance
pub(crate) fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{km:.1} km")
    }
}

/// A minijinja template filter for showing a rating as a row of stars
pub(crate) fn stars(rating: i64) -> String {
    let rating = rating.clamp(0, 5) as usize;
    format!("{}{}", "★".repeat(rating), "☆".repeat(5 - rating))
}
