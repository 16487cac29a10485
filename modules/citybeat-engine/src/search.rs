//! Tag search: normalization, fetch, and result-state writes.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::convert;
use crate::store::{MapState, SearchState};
use crate::traits::{ImageProbe, MapGateway};

/// What one search submission asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub tags: Vec<String>,
    pub start: i64,
    pub finish: i64,
}

/// Percent-encode tags for the search path. A leading `@` marks a mention
/// (`%40name`); a leading `#`, or no marker at all, marks a hashtag
/// (`%23name`). Tokens join with `,`.
pub fn normalize_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| match tag.strip_prefix('@') {
            Some(rest) => format!("%40{rest}"),
            None => format!("%23{}", tag.strip_prefix('#').unwrap_or(tag)),
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub struct SearchPipeline {
    gateway: Arc<dyn MapGateway>,
    probe: Arc<dyn ImageProbe>,
    state: Arc<RwLock<MapState>>,
}

impl SearchPipeline {
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

    /// Run one search and write the outcome into shared state wholesale.
    ///
    /// Overlapping calls are all processed, not debounced; whichever call
    /// finishes last owns the final search state.
    pub async fn run(&self, params: &SearchParams) -> Result<()> {
        let encoded = normalize_tags(&params.tags);
        let city = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.city.id
        };

        let result = self
            .gateway
            .search(city, &encoded, params.start, params.finish)
            .await
            .context("search fetch failed");

        match result {
            Ok(rows) => {
                let outcome = if rows.is_empty() {
                    info!(tags = %encoded, "search matched nothing");
                    SearchState::NoResults
                } else {
                    let converted = convert::convert_search(rows, self.probe.as_ref());
                    if converted.rejected > 0 {
                        warn!(
                            rejected = converted.rejected,
                            "dropped malformed search rows"
                        );
                    }
                    info!(tags = %encoded, hits = converted.items.len(), "search finished");
                    SearchState::Results(converted.items)
                };

                let mut state = self.state.write().await;
                state.search = outcome;
                state.loading = false;
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.last_error = Some(format!("{e:#}"));
                Err(e)
            }
        }
    }
}
