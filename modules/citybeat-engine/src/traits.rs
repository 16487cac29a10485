// Trait abstractions for the engine's backend dependencies.
//
// MapGateway — every data endpoint of the backend behind one trait.
// ImageProbe — post-image URL building and reachability checks, split out
//   so conversion logic stays testable without a live image proxy.
//
// These enable deterministic testing with MockGateway and MockProbe:
// no backend, no network. `cargo test` in seconds.

use anyhow::Result;
use async_trait::async_trait;

use citybeat_client::{BackendClient, EventRow, HeatmapRow, PostRow, TimelineRow};
use citybeat_common::geo::LatLon;

// ---------------------------------------------------------------------------
// MapGateway — backend data endpoints
// ---------------------------------------------------------------------------

/// City, bounds and hour of one hour-keyed fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourQuery {
    pub city: &'static str,
    pub top_left: LatLon,
    pub bottom_right: LatLon,
    pub hour: i64,
}

#[async_trait]
pub trait MapGateway: Send + Sync {
    /// Establish the backend session used by all later calls.
    async fn login(&self, login: &str, password: &str) -> Result<()>;

    /// Heatmap cells for one hour.
    async fn heatmap(&self, query: &HourQuery) -> Result<Vec<HeatmapRow>>;

    /// Detected events for one hour.
    async fn events(&self, query: &HourQuery) -> Result<Vec<EventRow>>;

    /// Hourly post/event counts over `[start, finish]`.
    async fn timeline(&self, city: &str, start: i64, finish: i64) -> Result<Vec<TimelineRow>>;

    /// Events matching an already-encoded tag list. Empty means no match.
    async fn search(
        &self,
        city: &str,
        encoded_tags: &str,
        start: i64,
        finish: i64,
    ) -> Result<Vec<EventRow>>;

    /// A single post by shortcode.
    async fn single_post(&self, city: &str, postcode: &str) -> Result<PostRow>;
}

#[async_trait]
impl MapGateway for BackendClient {
    async fn login(&self, login: &str, password: &str) -> Result<()> {
        Ok(self.login(login, password).await?)
    }

    async fn heatmap(&self, query: &HourQuery) -> Result<Vec<HeatmapRow>> {
        Ok(self
            .heatmap(query.city, query.top_left, query.bottom_right, query.hour)
            .await?)
    }

    async fn events(&self, query: &HourQuery) -> Result<Vec<EventRow>> {
        Ok(self
            .events(query.city, query.top_left, query.bottom_right, query.hour)
            .await?)
    }

    async fn timeline(&self, city: &str, start: i64, finish: i64) -> Result<Vec<TimelineRow>> {
        Ok(self.timeline(city, start, finish).await?)
    }

    async fn search(
        &self,
        city: &str,
        encoded_tags: &str,
        start: i64,
        finish: i64,
    ) -> Result<Vec<EventRow>> {
        Ok(self.search(city, encoded_tags, start, finish).await?)
    }

    async fn single_post(&self, city: &str, postcode: &str) -> Result<PostRow> {
        Ok(self.single_post(city, postcode).await?)
    }
}

// ---------------------------------------------------------------------------
// ImageProbe — post image resolution
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ImageProbe: Send + Sync {
    /// URL of the proxied image for a post shortcode.
    fn image_url(&self, postcode: &str) -> String;

    /// Whether that image answers with a success status.
    async fn exists(&self, postcode: &str) -> bool;
}

#[async_trait]
impl ImageProbe for BackendClient {
    fn image_url(&self, postcode: &str) -> String {
        self.image_url(postcode)
    }

    async fn exists(&self, postcode: &str) -> bool {
        self.image_exists(postcode).await
    }
}
