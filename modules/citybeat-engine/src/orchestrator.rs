//! Hour-keyed fetch orchestration: cache gating, parallel kind fetches,
//! day-chart refresh and bulk fan-out.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::convert;
use crate::store::MapState;
use crate::traits::{HourQuery, ImageProbe, MapGateway};

/// Seconds from a day's first chart hour to its last (23 hours on), so the
/// timeline window covers one local day.
pub const DAY_WINDOW_SECS: i64 = 82_800;

/// Concurrent per-hour fetches during bulk fan-out.
const BULK_CONCURRENCY: usize = 10;

pub struct FetchOrchestrator {
    gateway: Arc<dyn MapGateway>,
    probe: Arc<dyn ImageProbe>,
    state: Arc<RwLock<MapState>>,
}

impl FetchOrchestrator {
    pub fn new(
        gateway: Arc<dyn MapGateway>,
        probe: Arc<dyn ImageProbe>,
        state: Arc<RwLock<MapState>>,
    ) -> Self {
        Self {
            gateway,
            probe,
            state,
        }
    }

    pub fn state(&self) -> Arc<RwLock<MapState>> {
        Arc::clone(&self.state)
    }

    /// Fetch heatmap and events for one hour.
    ///
    /// A cached events bucket for the hour short-circuits the whole intent
    /// with zero network calls. Otherwise both kinds are fetched in
    /// parallel; either failure fails the intent, but a side that already
    /// succeeded keeps its merge.
    pub async fn fetch_hour(&self, hour: i64) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if state.events.has(hour) {
                return Ok(());
            }
            state.loading = true;
        }

        let query = self.hour_query(hour).await;
        let (heatmap, events) = tokio::join!(self.load_heatmap(&query), self.load_events(&query));
        let result = heatmap.and(events);
        self.finish_intent(&result).await;
        result
    }

    /// Initial-load combined fetch: the selected hour's layers plus the
    /// selected day's chart.
    ///
    /// The hour gate keys on the heatmap bucket here where `fetch_hour`
    /// keys on the events bucket; the asymmetry is inherited behavior the
    /// rest of the pipeline relies on. The chart is never gated: every call
    /// replaces it.
    pub async fn fetch_all_for_hour(&self) -> Result<()> {
        let (hour, day_start, cached) = {
            let mut state = self.state.write().await;
            state.loading = true;
            (
                state.selected_hour,
                state.selected_date,
                state.heatmap.has(state.selected_hour),
            )
        };

        let result = async {
            if !cached {
                let query = self.hour_query(hour).await;
                let (heatmap, events) =
                    tokio::join!(self.load_heatmap(&query), self.load_events(&query));
                heatmap.and(events)?;
            }
            self.refresh_chart(day_start).await
        }
        .await;

        self.finish_intent(&result).await;
        result
    }

    /// Fetch many hours at once, each hour checking both kind buckets
    /// independently. Per-hour failures are logged and counted, never
    /// aborting the other hours; the intent itself always completes.
    pub async fn fetch_bulk(&self, hours: &[i64]) -> Result<()> {
        self.state.write().await.loading = true;

        let results = stream::iter(
            hours
                .iter()
                .copied()
                .map(|hour| async move { (hour, self.fill_hour(hour).await) }),
        )
        .buffer_unordered(BULK_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

        let mut failed = 0;
        for (hour, result) in results {
            if let Err(e) = result {
                warn!(hour, error = %e, "bulk hour fetch failed");
                failed += 1;
            }
        }
        info!(requested = hours.len(), failed, "bulk fetch complete");

        let mut state = self.state.write().await;
        state.loading = false;
        if failed > 0 {
            state.last_error = Some(format!("{failed} of {} hours failed", hours.len()));
        }
        Ok(())
    }

    /// Fetch the day's timeline and replace the chart wholesale. Chart data
    /// is never cached.
    pub async fn refresh_chart(&self, day_start: i64) -> Result<()> {
        let city = self.state.read().await.city.id;
        let rows = self
            .gateway
            .timeline(city, day_start, day_start + DAY_WINDOW_SECS)
            .await
            .context("timeline fetch failed")?;

        let chart = convert::convert_chart(rows);
        info!(day_start, points = chart.len(), "chart replaced");
        self.state.write().await.chart = chart;
        Ok(())
    }

    /// Per-kind gated fill for one hour: each side consults its own bucket
    /// and only fetches what is missing.
    async fn fill_hour(&self, hour: i64) -> Result<()> {
        let (need_heatmap, need_events) = {
            let state = self.state.read().await;
            (!state.heatmap.has(hour), !state.events.has(hour))
        };
        if !need_heatmap && !need_events {
            return Ok(());
        }

        let query = self.hour_query(hour).await;
        let (heatmap, events) = tokio::join!(
            async {
                if need_heatmap {
                    self.load_heatmap(&query).await
                } else {
                    Ok(())
                }
            },
            async {
                if need_events {
                    self.load_events(&query).await
                } else {
                    Ok(())
                }
            }
        );
        heatmap.and(events)
    }

    async fn load_heatmap(&self, query: &HourQuery) -> Result<()> {
        let rows = self
            .gateway
            .heatmap(query)
            .await
            .context("heatmap fetch failed")?;
        let converted = convert::convert_heatmap(rows);
        if converted.rejected > 0 {
            warn!(
                hour = query.hour,
                rejected = converted.rejected,
                "dropped malformed heatmap cells"
            );
        }

        let mut state = self.state.write().await;
        state.heatmap.merge(query.hour, converted.items);
        Ok(())
    }

    async fn load_events(&self, query: &HourQuery) -> Result<()> {
        let rows = self
            .gateway
            .events(query)
            .await
            .context("events fetch failed")?;
        let converted = convert::convert_events(rows, self.probe.as_ref()).await;
        if converted.rejected > 0 {
            warn!(
                hour = query.hour,
                rejected = converted.rejected,
                "dropped malformed event rows"
            );
        }

        let mut state = self.state.write().await;
        state.events.merge(query.hour, converted.items);
        Ok(())
    }

    /// Snapshot the query inputs for an hour from current state. Bounds are
    /// whatever the map last wrote; they start as the city's fixed crawl
    /// rectangle.
    async fn hour_query(&self, hour: i64) -> HourQuery {
        let state = self.state.read().await;
        HourQuery {
            city: state.city.id,
            top_left: state.bounds.top_left,
            bottom_right: state.bounds.bottom_right,
            hour,
        }
    }

    /// Terminal transition of a fetch intent. A fast second intent can
    /// clear the flag before a slower first one finishes; overlapping
    /// intents are not coalesced.
    async fn finish_intent(&self, result: &Result<()>) {
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(()) => state.last_error = None,
            Err(e) => state.last_error = Some(format!("{e:#}")),
        }
    }
}
