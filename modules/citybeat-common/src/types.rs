use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::LatLon;

// --- Map Records ---

/// A detected event, ready for rendering on the map.
///
/// Identity is session-scoped: `id` is minted at conversion time, so the
/// same backend row fetched twice yields two distinct records. Hour buckets
/// deduplicate on content instead: the `Eq`/`Hash` impls go through
/// `content_key`, which skips `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub postcodes: Vec<String>,
    pub start: i64,
    pub finish: i64,
    pub photo_url: String,
    pub coordinates: LatLon,
}

impl Event {
    fn content_key(&self) -> (&str, &[String], &[String], i64, i64, &str, LatLon) {
        (
            &self.title,
            &self.tags,
            &self.postcodes,
            self.start,
            self.finish,
            &self.photo_url,
            self.coordinates,
        )
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.content_key() == other.content_key()
    }
}

impl Eq for Event {}

impl std::hash::Hash for Event {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.content_key().hash(state);
    }
}

/// One cell of the activity heatmap. The weight stays a string because the
/// rendering layer consumes it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub center: LatLon,
    pub weight: String,
}

/// One point on the day timeline: post and event counts for an hour,
/// plus the pre-formatted local hour label ("00".."23").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: i64,
    pub posts: i64,
    pub events: i64,
    pub local_time: String,
}

/// A search result. Same payload as [`Event`] plus the GeoJSON framing
/// the map's result layer expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "type", default = "feature_tag")]
    pub feature_type: String,
    pub cluster: bool,
    pub id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub postcodes: Vec<String>,
    pub start: i64,
    pub finish: i64,
    pub photo_url: String,
    pub coordinates: LatLon,
}

fn feature_tag() -> String {
    "Feature".to_string()
}

/// A single post shown in the map popup, with all presentation links
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub photo_url: String,
    pub caption: String,
    pub likes: i64,
    pub comments: i64,
    pub location: String,
    pub location_link: String,
    pub profile_pic_url: String,
    pub username: String,
    pub profile_link: String,
    pub post_link: String,
}

// --- Viewport Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLon,
    pub zoom: u8,
}

/// Rectangular map region, north-west and south-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub top_left: LatLon,
    pub bottom_right: LatLon,
}
