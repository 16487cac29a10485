use crate::geo::LatLon;

/// Static description of a city the map can show.
///
/// `available` marks cities with ingested data; the rest render on the
/// picker but cannot be selected. Cities without fixed crawl bounds
/// (`top_left`/`bottom_right` of `None`) are always unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    pub center: LatLon,
    pub top_left: Option<LatLon>,
    pub bottom_right: Option<LatLon>,
    pub available: bool,
}

impl CityProfile {
    /// Fixed crawl bounds for hour-keyed fetches. Only meaningful for
    /// available cities, which always carry both corners.
    pub fn fixed_bounds(&self) -> Option<(LatLon, LatLon)> {
        Some((self.top_left?, self.bottom_right?))
    }
}

pub const CITIES: [CityProfile; 4] = [
    CityProfile {
        id: "spb",
        name: "Saint Petersburg",
        country: "Russia",
        center: LatLon::new(59.9271516041233, 30.32315244950895),
        top_left: Some(LatLon::new(60.12, 30.11)),
        bottom_right: Some(LatLon::new(59.84, 30.69)),
        available: true,
    },
    CityProfile {
        id: "nyc",
        name: "New York",
        country: "USA",
        center: LatLon::new(40.701733209232735, -73.99152387944392),
        top_left: Some(LatLon::new(40.8482826, -73.9873646)),
        bottom_right: Some(LatLon::new(40.6185618, -74.0340492)),
        available: false,
    },
    CityProfile {
        id: "moscow",
        name: "Moscow",
        country: "Russia",
        center: LatLon::new(55.73652849918221, 37.61296270571807),
        top_left: None,
        bottom_right: None,
        available: false,
    },
    CityProfile {
        id: "london",
        name: "London",
        country: "United Kingdom",
        center: LatLon::new(0.0, 0.0),
        top_left: None,
        bottom_right: None,
        available: false,
    },
];

pub fn city_profile(id: &str) -> Option<&'static CityProfile> {
    CITIES.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_available_city_by_id() {
        let spb = city_profile("spb").expect("spb is registered");
        assert!(spb.available);
        let (tl, br) = spb.fixed_bounds().expect("spb has crawl bounds");
        assert!(tl.lat > br.lat, "top-left sits north of bottom-right");
        assert!(tl.lon < br.lon, "top-left sits west of bottom-right");
    }

    #[test]
    fn unknown_city_yields_none() {
        assert!(city_profile("atlantis").is_none());
    }

    #[test]
    fn unavailable_cities_may_lack_bounds() {
        let moscow = city_profile("moscow").unwrap();
        assert!(!moscow.available);
        assert!(moscow.fixed_bounds().is_none());
    }

    #[test]
    fn available_cities_always_carry_bounds() {
        for city in CITIES.iter().filter(|c| c.available) {
            assert!(
                city.fixed_bounds().is_some(),
                "available city {} must have crawl bounds",
                city.id
            );
        }
    }
}
