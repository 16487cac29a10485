//! In-memory map state: hour-keyed record buckets plus the flags and
//! layers the rendering side reads.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use citybeat_common::cities::CityProfile;
use citybeat_common::types::{Bounds, ChartPoint, Event, HeatmapCell, Post, SearchHit, Viewport};

/// Timestamp of the demo day (midnight, local to the dataset).
pub const DEMO_DATE: i64 = 1_557_349_200;

/// Hour within the demo day that city selection lands on.
pub const DEMO_HOUR: i64 = 1_557_428_400;

pub const DEFAULT_ZOOM: u8 = 13;

// --- Hour buckets ---

/// Hour-keyed cache of converted records.
///
/// Buckets are only ever created or unioned, never replaced and never
/// evicted. An entry's presence, even an empty one, means the hour has
/// been fetched and must not be fetched again. Memory grows with the
/// number of distinct hours touched; that is accepted for a session-sized
/// working set.
#[derive(Debug)]
pub struct HourBuckets<T> {
    buckets: HashMap<i64, HashSet<T>>,
}

impl<T: Eq + Hash> HourBuckets<T> {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// Whether the hour has been fetched, regardless of how much it holds.
    pub fn has(&self, hour: i64) -> bool {
        self.buckets.contains_key(&hour)
    }

    /// Insert records for an hour, unioning with whatever is already there.
    /// Merging an empty batch still creates the bucket.
    pub fn merge(&mut self, hour: i64, records: impl IntoIterator<Item = T>) {
        self.buckets.entry(hour).or_default().extend(records);
    }

    pub fn get(&self, hour: i64) -> Option<&HashSet<T>> {
        self.buckets.get(&hour)
    }

    pub fn hours(&self) -> usize {
        self.buckets.len()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(HashSet::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i64, &HashSet<T>)> {
        self.buckets.iter()
    }
}

impl<T: Eq + Hash> Default for HourBuckets<T> {
    fn default() -> Self {
        Self::new()
    }
}

// --- Search layer ---

/// State of the search result layer. `NotSearched` and `NoResults` both
/// leave the layer empty but render differently: the former shows nothing,
/// the latter an explicit "no results" notice.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    #[default]
    NotSearched,
    NoResults,
    Results(Vec<SearchHit>),
}

// --- Map state ---

/// Everything the map renders from, behind one lock in the orchestrator.
#[derive(Debug)]
pub struct MapState {
    pub city: &'static CityProfile,
    pub viewport: Viewport,
    pub bounds: Bounds,

    pub selected_date: i64,
    pub selected_hour: i64,
    pub show_all_events: bool,
    pub playing: bool,
    pub loading: bool,

    pub authenticated: bool,
    pub auth_error: String,
    pub last_error: Option<String>,

    pub chart: Vec<ChartPoint>,
    pub events: HourBuckets<Event>,
    pub heatmap: HourBuckets<HeatmapCell>,
    pub search: SearchState,
    pub popup: Vec<Post>,
}

impl MapState {
    /// Fresh state for a city, seeded the way city selection leaves it:
    /// viewport on the city center at street zoom, bounds pinned to the
    /// city's fixed crawl rectangle, date and hour on the demo day.
    pub fn new(city: &'static CityProfile) -> Self {
        let bounds = match city.fixed_bounds() {
            Some((top_left, bottom_right)) => Bounds {
                top_left,
                bottom_right,
            },
            // Cities without crawl bounds cannot be fetched against;
            // collapse to the center so the fields stay well-formed.
            None => Bounds {
                top_left: city.center,
                bottom_right: city.center,
            },
        };

        Self {
            city,
            viewport: Viewport {
                center: city.center,
                zoom: DEFAULT_ZOOM,
            },
            bounds,
            selected_date: DEMO_DATE,
            selected_hour: DEMO_HOUR,
            show_all_events: false,
            playing: false,
            loading: false,
            authenticated: false,
            auth_error: String::new(),
            last_error: None,
            chart: Vec::new(),
            events: HourBuckets::new(),
            heatmap: HourBuckets::new(),
            search: SearchState::NotSearched,
            popup: Vec::new(),
        }
    }

    pub fn stats(&self) -> MapStats {
        MapStats {
            event_hours: self.events.hours(),
            events: self.events.total(),
            heatmap_hours: self.heatmap.hours(),
            heatmap_cells: self.heatmap.total(),
            chart_points: self.chart.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapStats {
    pub event_hours: usize,
    pub events: usize,
    pub heatmap_hours: usize,
    pub heatmap_cells: usize,
    pub chart_points: usize,
}

impl fmt::Display for MapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} event hours ({} events), {} heatmap hours ({} cells), {} chart points",
            self.event_hours, self.events, self.heatmap_hours, self.heatmap_cells, self.chart_points
        )
    }
}
