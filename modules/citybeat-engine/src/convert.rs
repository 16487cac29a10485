//! Raw backend rows → map-ready records.
//!
//! Every function here is a per-shape mapping. Batch conversions isolate
//! per-record failures: a row with an unparseable center is dropped and
//! counted, the rest of the batch converts normally.

use std::collections::HashSet;

use futures::{stream, StreamExt};
use tracing::warn;
use uuid::Uuid;

use citybeat_client::{EventRow, HeatmapRow, PostRow, TimelineRow};
use citybeat_common::geo::{GeoError, LatLon};
use citybeat_common::types::{ChartPoint, Event, HeatmapCell, Post, SearchHit};

use crate::traits::ImageProbe;

/// Photo reference used when an event carries no usable post codes.
pub const PLACEHOLDER_IMAGE: &str = "/img/placeholder.png";

/// How many image probes run at once during an event batch.
const PROBE_CONCURRENCY: usize = 10;

/// Batch conversion output: converted records plus how many rows were
/// dropped for malformed data.
#[derive(Debug)]
pub struct Converted<C> {
    pub items: C,
    pub rejected: usize,
}

// --- Events ---

/// Convert event rows, resolving each record's photo.
///
/// The first post code is probed; if its image is unreachable the second
/// code is used on faith. Records without post codes get the placeholder.
/// Image trouble never drops a record.
pub async fn convert_events(
    rows: Vec<EventRow>,
    probe: &dyn ImageProbe,
) -> Converted<HashSet<Event>> {
    let results = stream::iter(rows.into_iter().map(|row| convert_event(row, probe)))
        .buffer_unordered(PROBE_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

    let mut items = HashSet::new();
    let mut rejected = 0;
    for result in results {
        match result {
            Ok(event) => {
                items.insert(event);
            }
            Err(e) => {
                warn!(error = %e, "dropping event row with malformed center");
                rejected += 1;
            }
        }
    }
    Converted { items, rejected }
}

async fn convert_event(row: EventRow, probe: &dyn ImageProbe) -> Result<Event, GeoError> {
    let coordinates: LatLon = row.center.parse()?;
    let photo_url = resolve_photo(&row.post_codes, probe).await;
    Ok(Event {
        id: Uuid::new_v4(),
        title: row.title,
        tags: row.tags,
        postcodes: row.post_codes,
        start: row.start,
        finish: row.finish,
        photo_url,
        coordinates,
    })
}

async fn resolve_photo(postcodes: &[String], probe: &dyn ImageProbe) -> String {
    let Some(first) = postcodes.first() else {
        return PLACEHOLDER_IMAGE.to_string();
    };
    if probe.exists(first).await {
        return probe.image_url(first);
    }
    // Second code is taken on faith; probing it too would double the
    // network cost of every dead image for little gain.
    match postcodes.get(1) {
        Some(second) => probe.image_url(second),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

// --- Heatmap ---

/// Convert heatmap rows. The count rides along as a string because the
/// rendering layer consumes it verbatim.
pub fn convert_heatmap(rows: Vec<HeatmapRow>) -> Converted<HashSet<HeatmapCell>> {
    let mut items = HashSet::new();
    let mut rejected = 0;
    for row in rows {
        match row.c.parse::<LatLon>() {
            Ok(center) => {
                items.insert(HeatmapCell {
                    center,
                    weight: row.n.to_string(),
                });
            }
            Err(e) => {
                warn!(error = %e, "dropping heatmap cell with malformed center");
                rejected += 1;
            }
        }
    }
    Converted { items, rejected }
}

// --- Search ---

/// Convert search rows, preserving input order (the server returns results
/// by relevance). Always uses the first post code, no probe, no fallback.
pub fn convert_search(rows: Vec<EventRow>, probe: &dyn ImageProbe) -> Converted<Vec<SearchHit>> {
    let mut items = Vec::with_capacity(rows.len());
    let mut rejected = 0;
    for row in rows {
        match row.center.parse::<LatLon>() {
            Ok(coordinates) => {
                let photo_url = match row.post_codes.first() {
                    Some(code) => probe.image_url(code),
                    None => PLACEHOLDER_IMAGE.to_string(),
                };
                items.push(SearchHit {
                    feature_type: "Feature".to_string(),
                    cluster: false,
                    id: Uuid::new_v4(),
                    title: row.title,
                    tags: row.tags,
                    postcodes: row.post_codes,
                    start: row.start,
                    finish: row.finish,
                    photo_url,
                    coordinates,
                });
            }
            Err(e) => {
                warn!(error = %e, "dropping search row with malformed center");
                rejected += 1;
            }
        }
    }
    Converted { items, rejected }
}

// --- Timeline ---

/// Convert timeline rows into chart points, ordered by time ascending.
/// The sort is stable, so equal timestamps keep their input order.
pub fn convert_chart(mut rows: Vec<TimelineRow>) -> Vec<ChartPoint> {
    rows.sort_by_key(|r| r.time);
    rows.into_iter()
        .map(|r| ChartPoint {
            time: r.time,
            posts: r.posts,
            events: r.events,
            local_time: local_hour_label(r.time),
        })
        .collect()
}

/// Zero-padded hour-of-day in the deployment's local time zone.
fn local_hour_label(timestamp: i64) -> String {
    use chrono::{Local, TimeZone};
    Local
        .timestamp_opt(timestamp, 0)
        .earliest()
        .map(|dt| dt.format("%H").to_string())
        .unwrap_or_else(|| "00".to_string())
}

// --- Posts ---

/// Map a raw post into its popup display record.
pub fn convert_post(row: PostRow, probe: &dyn ImageProbe) -> Post {
    Post {
        photo_url: probe.image_url(&row.shortcode),
        caption: row.caption,
        likes: row.likes_count,
        comments: row.comments_count,
        location: row.location_id.clone(),
        location_link: format!(
            "https://www.instagram.com/explore/locations/{}",
            row.location_id
        ),
        profile_pic_url: format!(
            "https://www.instagram.com/p/{}/media/?size=l",
            row.shortcode
        ),
        username: format!("user id: {}", row.author_id),
        profile_link: format!("https://www.instagram.com/p/{}/", row.shortcode),
        post_link: format!("https://www.instagram.com/p/{}/", row.shortcode),
        id: row.shortcode,
    }
}
