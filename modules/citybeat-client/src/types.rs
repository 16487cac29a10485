use serde::{Deserialize, Serialize};

// Wire shapes as the backend emits them. Coordinate pairs arrive as
// "lat,lon" strings in both URL paths and bodies; list-valued fields can
// arrive as JSON null because the backend marshals empty sets that way.

/// One aggregated cell of the heatmap response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeatmapRow {
    /// Cell center, `"lat,lon"`.
    pub c: String,
    /// Post count in the cell.
    pub n: i64,
}

/// One detected event as returned by `/events` and `/search`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventRow {
    pub center: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub post_codes: Vec<String>,
    pub title: String,
    pub start: i64,
    pub finish: i64,
}

/// Handle list fields the backend marshals as JSON null when empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    let rows = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(rows.unwrap_or_default())
}

/// One hour of the day timeline.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimelineRow {
    pub time: i64,
    pub posts: i64,
    pub events: i64,
}

/// A single post as returned by `/singleShortPost`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostRow {
    pub shortcode: String,
    pub caption: String,
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(rename = "LocationID")]
    pub location_id: String,
    #[serde(rename = "AuthorID")]
    pub author_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}
