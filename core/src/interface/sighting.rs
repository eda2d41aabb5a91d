use crate::math::geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// A single bearing observation reported from a known location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    /// Seconds since the epoch.
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Direction of travel relative to true north, radians in `(-pi, pi]`.
    pub bearing: f64,
}

impl Sighting {
    pub fn new(timestamp: f64, latitude: f64, longitude: f64, bearing: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            bearing,
        }
    }

    pub fn at(timestamp: f64, location: GeoPoint, bearing: f64) -> Self {
        Self::new(timestamp, location.latitude, location.longitude, bearing)
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
