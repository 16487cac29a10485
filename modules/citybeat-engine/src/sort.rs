//! Keyword filtering and ordering for the visible event list.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use citybeat_common::geo::{haversine_km, LatLon};
use citybeat_common::types::Event;

static KEYWORD_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-.,\s!]+").unwrap());

/// Ordering choices offered by the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Alphabetical,
    Popular,
    Nearby,
    ByTime,
}

impl SortKey {
    /// Parse the labels the sort dropdown uses.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "A - Z" => Some(SortKey::Alphabetical),
            "Popular" => Some(SortKey::Popular),
            "Nearby" => Some(SortKey::Nearby),
            "By time" => Some(SortKey::ByTime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub keyword: Option<String>,
    pub sort_by: Option<SortKey>,
}

/// Keep events whose title or any tag contains any word of the keyword,
/// case-insensitively. Words come from splitting on separator runs
/// (whitespace and light punctuation); a keyword with no usable words
/// keeps everything.
pub fn filter_by_keyword(keyword: &str, events: Vec<Event>) -> Vec<Event> {
    let words: Vec<String> = KEYWORD_SPLIT_RE
        .split(keyword)
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        return events;
    }

    events
        .into_iter()
        .filter(|event| {
            let title = event.title.to_lowercase();
            words.iter().any(|word| {
                title.contains(word)
                    || event
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(word))
            })
        })
        .collect()
}

/// Filter, then order the event list. All sorts are stable: ties keep
/// their incoming order. `Nearby` measures from the viewport center.
pub fn sort_events(filter: &FilterSpec, events: Vec<Event>, viewport_center: LatLon) -> Vec<Event> {
    let mut events = match filter.keyword.as_deref().filter(|k| !k.is_empty()) {
        Some(keyword) => filter_by_keyword(keyword, events),
        None => events,
    };

    match filter.sort_by {
        Some(SortKey::Alphabetical) => events.sort_by(|a, b| a.title.cmp(&b.title)),
        Some(SortKey::Popular) => {
            // More attached posts reads as more popular.
            events.sort_by(|a, b| b.postcodes.len().cmp(&a.postcodes.len()));
        }
        Some(SortKey::Nearby) => {
            // Distance is sort scratch, not part of the record.
            let mut with_distance: Vec<(f64, Event)> = events
                .into_iter()
                .map(|e| (haversine_km(viewport_center, e.coordinates), e))
                .collect();
            with_distance.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            return with_distance.into_iter().map(|(_, e)| e).collect();
        }
        Some(SortKey::ByTime) => events.sort_by_key(|e| e.start),
        None => {}
    }
    events
}
