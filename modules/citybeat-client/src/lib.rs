pub mod error;
pub mod types;

pub use error::{ClientError, Result};
pub use types::{EventRow, HeatmapRow, LoginRequest, PostRow, TimelineRow};

use citybeat_common::geo::LatLon;
use serde::de::DeserializeOwned;

/// HTTP client for the event-monitoring backend.
///
/// Holds a cookie jar: `login` stores the session cookie the backend sets,
/// and every later request carries it automatically.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { client, base_url })
    }

    /// Establish a session. The backend answers a successful login with a
    /// `session` cookie; any non-success status means rejected credentials.
    pub async fn login(&self, login: &str, password: &str) -> Result<()> {
        let url = format!("{}/login", self.base_url);
        let body = LoginRequest {
            login: login.to_string(),
            password: password.to_string(),
        };
        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::AuthRejected(status.as_u16()));
        }
        Ok(())
    }

    /// Heatmap cells for one hour inside the given bounds.
    pub async fn heatmap(
        &self,
        city: &str,
        top_left: LatLon,
        bottom_right: LatLon,
        hour: i64,
    ) -> Result<Vec<HeatmapRow>> {
        let url = format!(
            "{}/heatmap/{}/{}/{}/{}",
            self.base_url, city, top_left, bottom_right, hour
        );
        self.get_list(&url).await
    }

    /// Detected events for one hour inside the given bounds.
    pub async fn events(
        &self,
        city: &str,
        top_left: LatLon,
        bottom_right: LatLon,
        hour: i64,
    ) -> Result<Vec<EventRow>> {
        let url = format!(
            "{}/events/{}/{}/{}/{}",
            self.base_url, city, top_left, bottom_right, hour
        );
        self.get_list(&url).await
    }

    /// Hourly post/event counts over `[start, finish]`.
    pub async fn timeline(&self, city: &str, start: i64, finish: i64) -> Result<Vec<TimelineRow>> {
        let url = format!("{}/timeline/{}/{}/{}", self.base_url, city, start, finish);
        self.get_list(&url).await
    }

    /// Events matching the already-encoded tag list over `[start, finish]`.
    /// An empty vec means nothing matched (the backend answers with null).
    pub async fn search(
        &self,
        city: &str,
        encoded_tags: &str,
        start: i64,
        finish: i64,
    ) -> Result<Vec<EventRow>> {
        let url = format!(
            "{}/search/{}/{}/{}/{}",
            self.base_url, city, encoded_tags, start, finish
        );
        self.get_list(&url).await
    }

    /// A single post by shortcode.
    pub async fn single_post(&self, city: &str, postcode: &str) -> Result<PostRow> {
        let url = format!("{}/singleShortPost/{}/{}", self.base_url, city, postcode);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let row: Option<PostRow> = serde_json::from_str(&body)?;
        row.ok_or_else(|| ClientError::Parse(format!("post {postcode} came back empty")))
    }

    /// URL of the proxied image for a post shortcode.
    pub fn image_url(&self, postcode: &str) -> String {
        format!("{}/image/{}", self.base_url, postcode)
    }

    /// Whether the proxied image for a shortcode is actually reachable.
    /// Network trouble reads as unreachable.
    pub async fn image_exists(&self, postcode: &str) -> bool {
        let url = self.image_url(postcode);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(postcode, error = %e, "image probe failed");
                false
            }
        }
    }

    /// GET a list endpoint. The backend marshals empty result sets as JSON
    /// null, so the body is decoded as an optional list and normalized.
    async fn get_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let rows: Option<Vec<T>> = serde_json::from_str(&body)?;
        Ok(rows.unwrap_or_default())
    }
}
