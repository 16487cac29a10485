pub mod cities;
pub mod config;
pub mod geo;
pub mod types;

pub use cities::{city_profile, CityProfile, CITIES};
pub use config::Config;
pub use geo::{haversine_km, GeoError, LatLon};
pub use types::*;
