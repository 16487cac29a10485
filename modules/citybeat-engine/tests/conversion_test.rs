//! Conversion pipeline tests: raw backend rows through the per-shape
//! converters, with photo resolution driven by a mock image probe.

use citybeat_client::TimelineRow;
use citybeat_engine::convert::{
    convert_chart, convert_events, convert_heatmap, convert_post, convert_search,
    PLACEHOLDER_IMAGE,
};
use citybeat_engine::testing::{event_row, heatmap_row, post_row, MockProbe};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn event_photo_comes_from_first_code_when_reachable() {
    let probe = MockProbe::new().reachable(&["AAA"]);
    let rows = vec![event_row("59.93,30.31", "Jazz", &["AAA", "BBB"])];

    let converted = convert_events(rows, &probe).await;

    let event = converted.items.iter().next().expect("one event");
    assert_eq!(event.photo_url, "http://img.test/image/AAA");
    assert_eq!(
        probe.probe_calls(),
        vec!["AAA"],
        "only the first code should be probed"
    );
}

#[tokio::test]
async fn event_photo_falls_back_to_second_code() {
    // First image dead, second taken on faith without a probe.
    let probe = MockProbe::new();
    let rows = vec![event_row("59.93,30.31", "Jazz", &["AAA", "BBB"])];

    let converted = convert_events(rows, &probe).await;

    let event = converted.items.iter().next().expect("one event");
    assert_eq!(event.photo_url, "http://img.test/image/BBB");
    assert_eq!(
        probe.probe_calls(),
        vec!["AAA"],
        "the fallback code must not be probed"
    );
    assert_eq!(event.coordinates.lat, 59.93);
    assert_eq!(event.coordinates.lon, 30.31);
}

#[tokio::test]
async fn event_without_codes_gets_the_placeholder() {
    let probe = MockProbe::new();
    let rows = vec![
        event_row("59.93,30.31", "NoCodes", &[]),
        event_row("59.94,30.32", "OneDeadCode", &["ZZZ"]),
    ];

    let converted = convert_events(rows, &probe).await;

    assert_eq!(converted.items.len(), 2);
    for event in &converted.items {
        assert_eq!(
            event.photo_url, PLACEHOLDER_IMAGE,
            "{} should fall through to the placeholder",
            event.title
        );
    }
}

#[tokio::test]
async fn malformed_center_drops_only_that_row() {
    let probe = MockProbe::permissive();
    let rows = vec![
        event_row("59.93,30.31", "Good", &["AAA"]),
        event_row("59.93;30.31", "Broken", &["BBB"]),
        event_row("59.95,30.35", "AlsoGood", &["CCC"]),
    ];

    let converted = convert_events(rows, &probe).await;

    assert_eq!(converted.rejected, 1, "one row has an unparseable center");
    assert_eq!(converted.items.len(), 2);
    assert!(converted.items.iter().all(|e| e.title != "Broken"));
}

#[tokio::test]
async fn identical_rows_collapse_to_one_event() {
    // Fresh ids per conversion, but identity is content, so the same row
    // seen twice lands as a single record.
    let probe = MockProbe::permissive();
    let rows = vec![
        event_row("59.93,30.31", "Jazz", &["AAA"]),
        event_row("59.93,30.31", "Jazz", &["AAA"]),
    ];

    let converted = convert_events(rows, &probe).await;

    assert_eq!(converted.items.len(), 1, "duplicate content must collapse");
    assert_eq!(converted.rejected, 0);
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

#[test]
fn heatmap_weight_stays_textual() {
    let converted = convert_heatmap(vec![heatmap_row("59.9300,30.3100", 17)]);

    let cell = converted.items.iter().next().expect("one cell");
    assert_eq!(cell.weight, "17");
    assert_eq!(cell.center.lat, 59.93);
}

#[test]
fn heatmap_skips_malformed_cells() {
    let converted = convert_heatmap(vec![
        heatmap_row("59.93,30.31", 3),
        heatmap_row("garbage", 4),
        heatmap_row("59.94,30.32", 5),
    ]);

    assert_eq!(converted.items.len(), 2);
    assert_eq!(converted.rejected, 1);
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn search_results_keep_server_order() {
    let probe = MockProbe::new();
    let rows = vec![
        event_row("59.93,30.31", "First", &["AAA"]),
        event_row("59.94,30.32", "Second", &["BBB"]),
        event_row("59.95,30.33", "Third", &["CCC"]),
    ];

    let converted = convert_search(rows, &probe);

    let titles: Vec<&str> = converted.items.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["First", "Second", "Third"],
        "relevance order from the server must survive conversion"
    );
}

#[test]
fn search_photo_uses_first_code_without_probing() {
    let probe = MockProbe::new();
    let rows = vec![event_row("59.93,30.31", "Jazz", &["AAA", "BBB"])];

    let converted = convert_search(rows, &probe);

    assert_eq!(converted.items[0].photo_url, "http://img.test/image/AAA");
    assert!(
        probe.probe_calls().is_empty(),
        "search conversion never checks reachability"
    );
}

#[test]
fn search_hit_without_codes_gets_the_placeholder() {
    let probe = MockProbe::new();
    let converted = convert_search(vec![event_row("59.93,30.31", "Bare", &[])], &probe);

    let hit = &converted.items[0];
    assert_eq!(hit.photo_url, PLACEHOLDER_IMAGE);
    assert_eq!(hit.feature_type, "Feature");
    assert!(!hit.cluster);
}

#[test]
fn search_skips_malformed_rows() {
    let probe = MockProbe::new();
    let converted = convert_search(
        vec![
            event_row("nope", "Broken", &["AAA"]),
            event_row("59.93,30.31", "Good", &["BBB"]),
        ],
        &probe,
    );

    assert_eq!(converted.rejected, 1);
    assert_eq!(converted.items.len(), 1);
    assert_eq!(converted.items[0].title, "Good");
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

fn timeline_row(time: i64, posts: i64, events: i64) -> TimelineRow {
    TimelineRow {
        time,
        posts,
        events,
    }
}

#[test]
fn chart_points_come_out_time_ordered() {
    let rows = vec![
        timeline_row(1_557_360_000, 5, 1),
        timeline_row(1_557_349_200, 9, 2),
        timeline_row(1_557_356_400, 7, 0),
        timeline_row(1_557_352_800, 3, 4),
    ];

    let chart = convert_chart(rows);

    let times: Vec<i64> = chart.iter().map(|p| p.time).collect();
    let mut sorted = times.clone();
    sorted.sort_unstable();
    assert_eq!(times, sorted, "chart must be ascending no matter the input order");
    assert_eq!(chart[0].posts, 9, "values must travel with their timestamps");
}

#[test]
fn chart_keeps_input_order_for_equal_timestamps() {
    let rows = vec![
        timeline_row(1_557_349_200, 1, 0),
        timeline_row(1_557_349_200, 2, 0),
        timeline_row(1_557_349_200, 3, 0),
    ];

    let chart = convert_chart(rows);

    let posts: Vec<i64> = chart.iter().map(|p| p.posts).collect();
    assert_eq!(posts, vec![1, 2, 3], "ties must not be reshuffled");
}

#[test]
fn chart_labels_are_zero_padded_hours() {
    let chart = convert_chart(vec![
        timeline_row(1_557_349_200, 0, 0),
        timeline_row(1_557_352_800, 0, 0),
    ]);

    for point in &chart {
        assert_eq!(point.local_time.len(), 2, "label is always two digits");
        let hour: u32 = point
            .local_time
            .parse()
            .expect("label should be a plain hour number");
        assert!(hour < 24);
    }
    // One hour apart on the clock too.
    assert_ne!(chart[0].local_time, chart[1].local_time);
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[test]
fn post_links_follow_the_instagram_templates() {
    let probe = MockProbe::new();

    let post = convert_post(post_row("XYZ"), &probe);

    assert_eq!(post.id, "XYZ");
    assert_eq!(post.photo_url, "http://img.test/image/XYZ");
    assert_eq!(post.caption, "caption for XYZ");
    assert_eq!(post.likes, 42);
    assert_eq!(post.comments, 7);
    assert_eq!(post.location, "213526");
    assert_eq!(
        post.location_link,
        "https://www.instagram.com/explore/locations/213526"
    );
    assert_eq!(
        post.profile_pic_url,
        "https://www.instagram.com/p/XYZ/media/?size=l"
    );
    assert_eq!(post.username, "user id: 987654");
    assert_eq!(post.profile_link, "https://www.instagram.com/p/XYZ/");
    assert_eq!(post.post_link, "https://www.instagram.com/p/XYZ/");
}
