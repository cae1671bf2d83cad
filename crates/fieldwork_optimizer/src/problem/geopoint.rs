use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Parses the upstream `"lat, lon"` form. Failure is a per-appointment
    /// skip condition, never a run-aborting error.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidGps(raw.to_owned());

        let (lat_str, lon_str) = raw.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat_str.trim().parse().map_err(|_| invalid())?;
        let lon: f64 = lon_str.trim().parse().map_err(|_| invalid())?;

        Ok(GeoPoint { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance in kilometers.
    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Travel-time estimate at an average speed, floored to whole minutes.
    pub fn travel_minutes(&self, other: &GeoPoint, speed_kmh: f64) -> i64 {
        (self.haversine_km(other) / speed_kmh * 60.0).floor() as i64
    }
}
