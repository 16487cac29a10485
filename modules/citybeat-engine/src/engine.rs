//! The engine facade: one method per map intent.

use std::sync::Arc;

use anyhow::Result;
use futures::{stream, StreamExt};
use tokio::sync::RwLock;
use tracing::{info, warn};

use citybeat_common::cities::CityProfile;
use citybeat_common::types::{Bounds, Event, Viewport};

use crate::convert;
use crate::orchestrator::FetchOrchestrator;
use crate::playback::{start_playback, PlaybackHandle};
use crate::search::{SearchParams, SearchPipeline};
use crate::session::SessionManager;
use crate::sort::{sort_events, FilterSpec};
use crate::store::{MapState, MapStats, SearchState};
use crate::traits::{ImageProbe, MapGateway};

/// Concurrent popup post fetches.
const POPUP_CONCURRENCY: usize = 5;

pub struct MapEngine {
    state: Arc<RwLock<MapState>>,
    orchestrator: Arc<FetchOrchestrator>,
    search: SearchPipeline,
    session: SessionManager,
    gateway: Arc<dyn MapGateway>,
    probe: Arc<dyn ImageProbe>,
}

impl MapEngine {
    /// Build an engine for one city, seeded the way city selection leaves
    /// the map: viewport on the city center at street zoom, bounds on the
    /// city's crawl rectangle, demo date and hour selected.
    pub fn new(
        gateway: Arc<dyn MapGateway>,
        probe: Arc<dyn ImageProbe>,
        city: &'static CityProfile,
    ) -> Self {
        let state = Arc::new(RwLock::new(MapState::new(city)));
        let orchestrator = Arc::new(FetchOrchestrator::new(
            Arc::clone(&gateway),
            Arc::clone(&probe),
            Arc::clone(&state),
        ));
        let search = SearchPipeline::new(
            Arc::clone(&gateway),
            Arc::clone(&probe),
            Arc::clone(&state),
        );
        let session = SessionManager::new(Arc::clone(&gateway), Arc::clone(&state));

        Self {
            state,
            orchestrator,
            search,
            session,
            gateway,
            probe,
        }
    }

    pub fn state(&self) -> Arc<RwLock<MapState>> {
        Arc::clone(&self.state)
    }

    // --- Session ---

    pub async fn login(&self, login: &str, password: &str) -> bool {
        self.session.login(login, password).await
    }

    // --- Fetch intents ---

    /// Select an hour and fetch its layers.
    pub async fn select_hour(&self, hour: i64) -> Result<()> {
        self.state.write().await.selected_hour = hour;
        self.orchestrator.fetch_hour(hour).await
    }

    /// Select a date, carrying the hour-of-day offset across. Any search
    /// result belongs to the old window and is dropped. In "all events"
    /// mode the whole day is refetched, otherwise just the selected hour
    /// plus the chart.
    pub async fn select_date(&self, date: i64) -> Result<()> {
        let show_all = {
            let mut state = self.state.write().await;
            let offset = state.selected_hour - state.selected_date;
            state.selected_date = date;
            state.selected_hour = date + offset;
            state.search = SearchState::NotSearched;
            state.show_all_events
        };
        info!(date, show_all, "date selected");

        if show_all {
            self.orchestrator.refresh_chart(date).await?;
            let hours = self.chart_hours().await;
            self.orchestrator.fetch_bulk(&hours).await
        } else {
            self.orchestrator.fetch_all_for_hour().await
        }
    }

    /// Initial fetch for the current selection: hour layers plus day chart.
    pub async fn refresh(&self) -> Result<()> {
        self.orchestrator.fetch_all_for_hour().await
    }

    /// Flip "all events" mode. Switching on fills every hour already on
    /// the chart; switching off is a pure state change.
    pub async fn toggle_all_events(&self) -> Result<()> {
        let now_on = {
            let mut state = self.state.write().await;
            state.show_all_events = !state.show_all_events;
            state.show_all_events
        };
        if now_on {
            let hours = self.chart_hours().await;
            self.orchestrator.fetch_bulk(&hours).await?;
        }
        Ok(())
    }

    // --- Viewport ---

    pub async fn set_viewport(&self, viewport: Viewport) {
        self.state.write().await.viewport = viewport;
    }

    pub async fn set_bounds(&self, bounds: Bounds) {
        self.state.write().await.bounds = bounds;
    }

    // --- Playback ---

    /// Start playback over the current chart from the selected hour.
    pub async fn play(&self) -> PlaybackHandle {
        let (chart, from_hour) = {
            let state = self.state.read().await;
            (state.chart.clone(), state.selected_hour)
        };
        start_playback(Arc::clone(&self.orchestrator), chart, from_hour)
    }

    // --- Search ---

    pub async fn search(&self, params: &SearchParams) -> Result<()> {
        self.search.run(params).await
    }

    // --- Popup ---

    /// Load the posts behind an event's postcodes into the popup, keeping
    /// the given order. Failed post fetches are dropped, the rest still
    /// show; an empty popup is a valid outcome.
    pub async fn load_popup(&self, postcodes: &[String]) -> Result<()> {
        let city = {
            let mut state = self.state.write().await;
            state.popup.clear();
            state.loading = true;
            state.city.id
        };

        let fetched = stream::iter(
            postcodes
                .iter()
                .map(|code| async move { (code, self.gateway.single_post(city, code).await) }),
        )
        .buffered(POPUP_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

        let mut posts = Vec::new();
        for (code, result) in fetched {
            match result {
                Ok(row) => posts.push(convert::convert_post(row, self.probe.as_ref())),
                Err(e) => warn!(postcode = %code, error = %e, "popup post failed"),
            }
        }
        info!(
            requested = postcodes.len(),
            loaded = posts.len(),
            "popup loaded"
        );

        let mut state = self.state.write().await;
        state.popup = posts;
        state.loading = false;
        Ok(())
    }

    // --- Derived views ---

    /// Events visible under the current selection: the selected hour's
    /// bucket, or the union of every fetched hour in "all events" mode;
    /// filtered and ordered per `filter` against the viewport center.
    pub async fn visible_events(&self, filter: &FilterSpec) -> Vec<Event> {
        let (events, center) = {
            let state = self.state.read().await;
            let events: Vec<Event> = if state.show_all_events {
                state
                    .events
                    .iter()
                    .flat_map(|(_, bucket)| bucket.iter().cloned())
                    .collect()
            } else {
                state
                    .events
                    .get(state.selected_hour)
                    .map(|bucket| bucket.iter().cloned().collect())
                    .unwrap_or_default()
            };
            (events, state.viewport.center)
        };
        sort_events(filter, events, center)
    }

    pub async fn stats(&self) -> MapStats {
        self.state.read().await.stats()
    }

    async fn chart_hours(&self) -> Vec<i64> {
        self.state.read().await.chart.iter().map(|p| p.time).collect()
    }
}
