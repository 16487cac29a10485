// Test mocks for the map engine.
//
// Two mocks matching the two trait boundaries:
// - MockGateway (MapGateway) — HashMap-based fixtures keyed by hour / tags /
//   postcode, with a call log for the zero-network assertions
// - MockProbe (ImageProbe) — allow-list of reachable postcodes
//
// Plus wire-row constructors for fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::time::{sleep, Duration};

use citybeat_client::{EventRow, HeatmapRow, PostRow, TimelineRow};

use crate::traits::{HourQuery, ImageProbe, MapGateway};

// ---------------------------------------------------------------------------
// Row fixtures
// ---------------------------------------------------------------------------

/// Event row with the given center, title and post codes.
pub fn event_row(center: &str, title: &str, codes: &[&str]) -> EventRow {
    EventRow {
        center: center.to_string(),
        tags: vec![format!("#{}", title.to_lowercase())],
        post_codes: codes.iter().map(|c| c.to_string()).collect(),
        title: title.to_string(),
        start: 1_557_428_400,
        finish: 1_557_432_000,
    }
}

/// Heatmap row at the given center.
pub fn heatmap_row(center: &str, n: i64) -> HeatmapRow {
    HeatmapRow {
        c: center.to_string(),
        n,
    }
}

/// A day chart of `count` hourly rows starting at `day_start`.
pub fn chart_rows(day_start: i64, count: usize) -> Vec<TimelineRow> {
    (0..count as i64)
        .map(|i| TimelineRow {
            time: day_start + i * 3600,
            posts: 10 + i,
            events: i,
        })
        .collect()
}

/// Post row for a shortcode, with fixed counts and ids.
pub fn post_row(code: &str) -> PostRow {
    PostRow {
        shortcode: code.to_string(),
        caption: format!("caption for {code}"),
        likes_count: 42,
        comments_count: 7,
        location_id: "213526".to_string(),
        author_id: "987654".to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

/// Which gateway endpoints were hit, in call order.
#[derive(Debug, Default)]
pub struct CallLog {
    pub heatmap: Vec<i64>,
    pub events: Vec<i64>,
    pub timeline: Vec<(i64, i64)>,
    pub search: Vec<String>,
    pub single_post: Vec<String>,
    pub login: usize,
}

/// HashMap-based gateway. Hour endpoints answer unregistered hours with
/// empty rows (a quiet hour, not an error) unless the hour is marked
/// failing. Builder pattern: `.on_heatmap()`, `.on_events()`,
/// `.on_timeline()`, `.on_search()`, `.on_post()`.
pub struct MockGateway {
    heatmaps: HashMap<i64, Vec<HeatmapRow>>,
    events: HashMap<i64, Vec<EventRow>>,
    timelines: HashMap<i64, Vec<TimelineRow>>,
    searches: HashMap<String, Vec<EventRow>>,
    search_delays: HashMap<String, Duration>,
    posts: HashMap<String, PostRow>,
    failing_heatmap_hours: HashSet<i64>,
    failing_event_hours: HashSet<i64>,
    failing_searches: HashSet<String>,
    reject_login: bool,
    delay: Option<Duration>,
    calls: Mutex<CallLog>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            heatmaps: HashMap::new(),
            events: HashMap::new(),
            timelines: HashMap::new(),
            searches: HashMap::new(),
            search_delays: HashMap::new(),
            posts: HashMap::new(),
            failing_heatmap_hours: HashSet::new(),
            failing_event_hours: HashSet::new(),
            failing_searches: HashSet::new(),
            reject_login: false,
            delay: None,
            calls: Mutex::new(CallLog::default()),
        }
    }

    pub fn on_heatmap(mut self, hour: i64, rows: Vec<HeatmapRow>) -> Self {
        self.heatmaps.insert(hour, rows);
        self
    }

    pub fn on_events(mut self, hour: i64, rows: Vec<EventRow>) -> Self {
        self.events.insert(hour, rows);
        self
    }

    pub fn on_timeline(mut self, start: i64, rows: Vec<TimelineRow>) -> Self {
        self.timelines.insert(start, rows);
        self
    }

    pub fn on_search(mut self, encoded_tags: &str, rows: Vec<EventRow>) -> Self {
        self.searches.insert(encoded_tags.to_string(), rows);
        self
    }

    /// Register a search that also sleeps before answering, for
    /// completion-order races.
    pub fn on_search_delayed(mut self, encoded_tags: &str, rows: Vec<EventRow>, delay: Duration) -> Self {
        self.searches.insert(encoded_tags.to_string(), rows);
        self.search_delays.insert(encoded_tags.to_string(), delay);
        self
    }

    pub fn on_post(mut self, code: &str, row: PostRow) -> Self {
        self.posts.insert(code.to_string(), row);
        self
    }

    /// Make the events endpoint fail for one hour.
    pub fn failing_events(mut self, hour: i64) -> Self {
        self.failing_event_hours.insert(hour);
        self
    }

    /// Make the heatmap endpoint fail for one hour.
    pub fn failing_heatmap(mut self, hour: i64) -> Self {
        self.failing_heatmap_hours.insert(hour);
        self
    }

    /// Make the search endpoint fail for one encoded tag string.
    pub fn failing_search(mut self, encoded_tags: &str) -> Self {
        self.failing_searches.insert(encoded_tags.to_string());
        self
    }

    pub fn reject_login(mut self) -> Self {
        self.reject_login = true;
        self
    }

    /// Sleep this long before answering any endpoint.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    // --- call log accessors ---

    pub fn heatmap_calls(&self) -> Vec<i64> {
        self.calls.lock().unwrap().heatmap.clone()
    }

    pub fn event_calls(&self) -> Vec<i64> {
        self.calls.lock().unwrap().events.clone()
    }

    pub fn timeline_calls(&self) -> Vec<(i64, i64)> {
        self.calls.lock().unwrap().timeline.clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().search.clone()
    }

    pub fn post_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().single_post.clone()
    }

    /// Heatmap plus events calls together, for "zero network" assertions.
    pub fn total_hour_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.heatmap.len() + calls.events.len()
    }

    async fn apply_delay(&self) {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
    }
}

#[async_trait]
impl MapGateway for MockGateway {
    async fn login(&self, _login: &str, _password: &str) -> Result<()> {
        self.calls.lock().unwrap().login += 1;
        if self.reject_login {
            bail!("MockGateway: login rejected");
        }
        Ok(())
    }

    async fn heatmap(&self, query: &HourQuery) -> Result<Vec<HeatmapRow>> {
        self.calls.lock().unwrap().heatmap.push(query.hour);
        self.apply_delay().await;
        if self.failing_heatmap_hours.contains(&query.hour) {
            bail!("MockGateway: heatmap set to fail for hour {}", query.hour);
        }
        Ok(self.heatmaps.get(&query.hour).cloned().unwrap_or_default())
    }

    async fn events(&self, query: &HourQuery) -> Result<Vec<EventRow>> {
        self.calls.lock().unwrap().events.push(query.hour);
        self.apply_delay().await;
        if self.failing_event_hours.contains(&query.hour) {
            bail!("MockGateway: events set to fail for hour {}", query.hour);
        }
        Ok(self.events.get(&query.hour).cloned().unwrap_or_default())
    }

    async fn timeline(&self, _city: &str, start: i64, finish: i64) -> Result<Vec<TimelineRow>> {
        self.calls.lock().unwrap().timeline.push((start, finish));
        self.apply_delay().await;
        self.timelines
            .get(&start)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockGateway: no timeline registered for {start}"))
    }

    async fn search(
        &self,
        _city: &str,
        encoded_tags: &str,
        _start: i64,
        _finish: i64,
    ) -> Result<Vec<EventRow>> {
        self.calls
            .lock()
            .unwrap()
            .search
            .push(encoded_tags.to_string());
        self.apply_delay().await;
        if let Some(delay) = self.search_delays.get(encoded_tags) {
            sleep(*delay).await;
        }
        if self.failing_searches.contains(encoded_tags) {
            bail!("MockGateway: search set to fail for {encoded_tags}");
        }
        Ok(self.searches.get(encoded_tags).cloned().unwrap_or_default())
    }

    async fn single_post(&self, _city: &str, postcode: &str) -> Result<PostRow> {
        self.calls
            .lock()
            .unwrap()
            .single_post
            .push(postcode.to_string());
        self.apply_delay().await;
        self.posts
            .get(postcode)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockGateway: no post registered for {postcode}"))
    }
}

// ---------------------------------------------------------------------------
// MockProbe
// ---------------------------------------------------------------------------

/// Probe with a fixed base URL and an allow-list of reachable postcodes.
/// Logs every `exists` call so tests can assert a path never probed.
pub struct MockProbe {
    base: String,
    reachable: HashSet<String>,
    everything: bool,
    probed: Mutex<Vec<String>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self {
            base: "http://img.test".to_string(),
            reachable: HashSet::new(),
            everything: false,
            probed: Mutex::new(Vec::new()),
        }
    }

    /// Probe for which every image resolves.
    pub fn permissive() -> Self {
        Self {
            everything: true,
            ..Self::new()
        }
    }

    /// Mark postcodes whose images resolve.
    pub fn reachable(mut self, codes: &[&str]) -> Self {
        for code in codes {
            self.reachable.insert(code.to_string());
        }
        self
    }

    /// Postcodes whose existence was checked, in call order.
    pub fn probe_calls(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProbe for MockProbe {
    fn image_url(&self, postcode: &str) -> String {
        format!("{}/image/{}", self.base, postcode)
    }

    async fn exists(&self, postcode: &str) -> bool {
        self.probed.lock().unwrap().push(postcode.to_string());
        self.everything || self.reachable.contains(postcode)
    }
}
