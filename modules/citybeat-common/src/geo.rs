use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoError {
    #[error("coordinate pair {0:?} is not of the form \"lat,lon\"")]
    Malformed(String),

    #[error("coordinate pair {0:?} has a non-numeric component")]
    NotNumeric(String),

    #[error("coordinate pair {0:?} has a non-finite component")]
    NonFinite(String),
}

/// A latitude/longitude pair. The backend serializes these as `"lat,lon"`
/// strings in both URL paths and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

// Coordinates are always finite: FromStr rejects NaN and infinities, and
// the city table holds literal values. Bitwise equality is total here.
impl Eq for LatLon {}

impl Hash for LatLon {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

impl FromStr for LatLon {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| GeoError::Malformed(s.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| GeoError::NotNumeric(s.to_string()))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| GeoError::NotNumeric(s.to_string()))?;
        if !lat.is_finite() || !lon.is_finite() {
            return Err(GeoError::NonFinite(s.to_string()));
        }
        Ok(Self { lat, lon })
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// Haversine great-circle distance between two points in kilometers.
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parses_wire_form() {
        let p: LatLon = "59.93,30.31".parse().unwrap();
        assert_eq!(p, LatLon::new(59.93, 30.31));

        // the backend emits fixed four-decimal precision; spaces never
        // appear on the wire but are tolerated
        let p: LatLon = "59.9272, 30.3232".parse().unwrap();
        assert_eq!(p.lat, 59.9272);
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert_eq!(
            "59.93".parse::<LatLon>(),
            Err(GeoError::Malformed("59.93".to_string()))
        );
        assert_eq!(
            "abc,30.31".parse::<LatLon>(),
            Err(GeoError::NotNumeric("abc,30.31".to_string()))
        );
        assert_eq!(
            "NaN,30.31".parse::<LatLon>(),
            Err(GeoError::NonFinite("NaN,30.31".to_string()))
        );
        assert_eq!(
            "inf,30.31".parse::<LatLon>(),
            Err(GeoError::NonFinite("inf,30.31".to_string()))
        );
    }

    #[test]
    fn display_round_trips() {
        let p = LatLon::new(60.12, 30.11);
        assert_eq!(p.to_string(), "60.12,30.11");
        assert_eq!(p.to_string().parse::<LatLon>().unwrap(), p);
    }

    #[test]
    fn equal_points_collapse_in_sets() {
        let mut set = HashSet::new();
        set.insert(LatLon::new(59.93, 30.31));
        set.insert(LatLon::new(59.93, 30.31));
        set.insert(LatLon::new(59.94, 30.31));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn haversine_known_distance() {
        // Nevsky Prospekt to Peterhof is roughly 25 km
        let nevsky = LatLon::new(59.9343, 30.3351);
        let peterhof = LatLon::new(59.8815, 29.9061);
        let d = haversine_km(nevsky, peterhof);
        assert!((20.0..30.0).contains(&d), "unexpected distance: {d}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let p = LatLon::new(59.93, 30.31);
        assert!(haversine_km(p, p) < 1e-9);
    }
}
