//! Approximate distance calculations between geographic coordinates.
//!
//! Distances are computed with a planar approximation: the differences in
//! latitude and longitude (in degrees) are treated as euclidean coordinates and
//! scaled by a fixed number of kilometers per degree. This is only a rough
//! proxy for the real geodesic distance. It becomes inaccurate over long
//! distances and near the poles, where a degree of longitude is much shorter
//! than a degree of latitude.
use serde::{Deserialize, Serialize};

/// Approximate number of kilometers covered by one degree
pub const KM_PER_DEGREE: f64 = 111.0;

/// The reference point used when a query doesn't specify one (the city centre)
pub const DEFAULT_REFERENCE: Coordinates = Coordinates {
    latitude: 22.3,
    longitude: 114.2,
};

/// A point on the map, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Coordinates {
    fn default() -> Self {
        DEFAULT_REFERENCE
    }
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a reference point from optional coordinates. Each component that
    /// is missing or not a finite number is taken from `fallback`.
    pub fn or_fallback(latitude: Option<f64>, longitude: Option<f64>, fallback: Self) -> Self {
        Self {
            latitude: latitude
                .filter(|v| v.is_finite())
                .unwrap_or(fallback.latitude),
            longitude: longitude
                .filter(|v| v.is_finite())
                .unwrap_or(fallback.longitude),
        }
    }

    /// The squared planar distance to `other`, in square degrees. This is what
    /// the database compares against, so it is also what in-memory filtering
    /// uses to make sure both agree exactly.
    pub fn planar_degrees_squared(&self, other: &Coordinates) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlng = self.longitude - other.longitude;
        dlat * dlat + dlng * dlng
    }

    /// The approximate distance to `other` in kilometers
    pub fn planar_distance_km(&self, other: &Coordinates) -> f64 {
        self.planar_degrees_squared(other).sqrt() * KM_PER_DEGREE
    }
}

/// Convert a distance threshold in kilometers into the squared number of
/// degrees that [Coordinates::planar_degrees_squared()] is compared against.
pub fn km_threshold_to_degrees_squared(km: f64) -> f64 {
    let degrees = km / KM_PER_DEGREE;
    degrees * degrees
}
