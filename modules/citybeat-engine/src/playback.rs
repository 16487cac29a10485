//! Timed hour-by-hour playback over the day chart.
//!
//! Playback runs as a spawned task owned by a [`PlaybackHandle`]. Remaining
//! hours are prefetched in bulk before the first advance so ticks never
//! wait on the network. Stop is a watch signal observed between ticks: an
//! in-flight prefetch completes and keeps its results cached.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use citybeat_common::types::ChartPoint;

use crate::orchestrator::FetchOrchestrator;

/// Wall-clock spacing between playback advances.
pub const PLAYBACK_TICK: Duration = Duration::from_secs(1);

/// What a running playback emits to its observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    /// The selected hour advanced.
    Advanced { hour: i64 },
    /// Playback ended, by natural completion or by stop. Always the final
    /// signal, emitted exactly once.
    Stopped,
}

/// Owner's handle to a running playback task.
pub struct PlaybackHandle {
    stop: watch::Sender<bool>,
    pub signals: mpsc::UnboundedReceiver<PlaybackSignal>,
    task: JoinHandle<()>,
}

impl PlaybackHandle {
    /// Ask the playback to stop. Safe to call any number of times, before
    /// or after the task has already wound down.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Wait for the task to finish. Use after [`stop`](Self::stop), or to
    /// ride a playback to natural completion.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Start playback over `chart` from the hour after `from_hour`. A
/// `from_hour` that is not on the chart starts playback from the top.
pub fn start_playback(
    orchestrator: Arc<FetchOrchestrator>,
    chart: Vec<ChartPoint>,
    from_hour: i64,
) -> PlaybackHandle {
    let (stop_tx, stop_rx) = watch::channel(false);
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(run_playback(
        orchestrator,
        chart,
        from_hour,
        stop_rx,
        signal_tx,
    ));

    PlaybackHandle {
        stop: stop_tx,
        signals: signal_rx,
        task,
    }
}

async fn run_playback(
    orchestrator: Arc<FetchOrchestrator>,
    chart: Vec<ChartPoint>,
    from_hour: i64,
    mut stop: watch::Receiver<bool>,
    signals: mpsc::UnboundedSender<PlaybackSignal>,
) {
    let state = orchestrator.state();
    state.write().await.playing = true;

    // One past the selected hour, or the top of the chart on no match.
    let start_index = chart
        .iter()
        .position(|p| p.time == from_hour)
        .map(|i| i + 1)
        .unwrap_or(0);

    let remaining: Vec<i64> = chart[start_index..].iter().map(|p| p.time).collect();
    if !remaining.is_empty() {
        if let Err(e) = orchestrator.fetch_bulk(&remaining).await {
            warn!(error = %e, "playback prefetch failed");
        }
    }

    info!(
        from_hour,
        start_index,
        ticks = remaining.len(),
        "playback starting"
    );

    let mut ticker = interval(PLAYBACK_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval's first tick is immediate; consume it so the first
    // advance lands a full tick after the prefetch.
    ticker.tick().await;

    let mut index = start_index;
    loop {
        if index >= chart.len() || *stop.borrow() {
            break;
        }
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let hour = chart[index].time;
                state.write().await.selected_hour = hour;
                let _ = signals.send(PlaybackSignal::Advanced { hour });
                index += 1;
            }
        }
    }

    state.write().await.playing = false;
    let _ = signals.send(PlaybackSignal::Stopped);
    debug!(advanced = index - start_index, "playback stopped");
}
