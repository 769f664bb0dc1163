use chalkboards_core::{CategoryTable, Coordinates, Radius, RawRow};
use chalkboards_feed::{
    build_markers, card_lines, distance_text, pretty_window, run_pipeline, split_top, EntryStatus,
    EvalClock, FeedMode, FeedQuery, TOP_COUNT,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

const ORIGIN: Coordinates = Coordinates {
    lat: 40.88,
    lng: -74.07,
};

/// Tuesday 2025-03-04 at the given wall time, evaluated in UTC.
fn tuesday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, hour, minute, 0).unwrap()
}

fn weekly(
    id: &str,
    name: &str,
    address: &str,
    deal: &str,
    day: &str,
    start: &str,
    end: &str,
) -> RawRow {
    RawRow {
        id: Some(id.to_string()),
        created_at: Some("2025-02-01T12:00:00Z".to_string()),
        kind: Some("weekly".to_string()),
        business_name: Some(name.to_string()),
        deal: Some(deal.to_string()),
        address: Some(address.to_string()),
        expires_at: None,
        status: None,
        extra: Some(json!({"day": day, "start": start, "end": end})),
        lat: Some(ORIGIN.lat),
        lng: Some(ORIGIN.lng),
    }
}

fn flash(id: &str, name: &str, address: &str, deal: &str, created: &str, expires: &str) -> RawRow {
    RawRow {
        id: Some(id.to_string()),
        created_at: Some(created.to_string()),
        kind: Some("flash".to_string()),
        business_name: Some(name.to_string()),
        deal: Some(deal.to_string()),
        address: Some(address.to_string()),
        expires_at: Some(expires.to_string()),
        status: Some("approved".to_string()),
        extra: None,
        lat: Some(ORIGIN.lat + 0.01),
        lng: Some(ORIGIN.lng),
    }
}

#[test]
fn single_weekly_row_end_to_end() {
    let rows = vec![weekly(
        "1",
        "A",
        "1 Elm St, X, NJ 07000",
        "$1 wings",
        "Tuesday",
        "17:00",
        "19:00",
    )];
    let clock = EvalClock::from_datetime(&tuesday_at(18, 0));
    let query = FeedQuery::new(ORIGIN, Radius::Miles(5.0));

    let groups = run_pipeline(&rows, &clock, &query, &CategoryTable::builtin());

    assert_eq!(groups.len(), 1);
    let g = &groups[0];
    assert_eq!(g.business_name, "A");
    assert!(g.has_active);
    assert!(g.flash.is_empty());
    assert_eq!(g.recurring.len(), 1);
    let item = &g.recurring[0];
    assert_eq!(item.description, "$1 wings");
    assert_eq!(item.status, EntryStatus::Active);
    assert_eq!(pretty_window(item.start, item.end), "5:00 PM – 7:00 PM");
    assert_eq!(distance_text(g.distance_miles), "0.0 mi");

    let lines = card_lines(g);
    assert_eq!(lines[0].line, "🔥 $1 wings");
    assert_eq!(lines[0].sub, "5:00 PM – 7:00 PM");
}

#[test]
fn mode_controls_later_specials() {
    let rows = vec![
        weekly(
            "1",
            "A",
            "1 Elm St, X, NJ 07000",
            "$1 wings",
            "Tue",
            "17:00",
            "19:00",
        ),
        weekly(
            "2",
            "B",
            "2 Oak Ave, X, NJ 07000",
            "taco night",
            "tues",
            "21:00",
            "23:00",
        ),
    ];
    let clock = EvalClock::from_datetime(&tuesday_at(18, 0));
    let categories = CategoryTable::builtin();

    let mut query = FeedQuery::new(ORIGIN, Radius::Miles(5.0));
    let now_only = run_pipeline(&rows, &clock, &query, &categories);
    assert_eq!(now_only.len(), 1);

    query.mode = FeedMode::Upcoming;
    let upcoming = run_pipeline(&rows, &clock, &query, &categories);
    assert_eq!(upcoming.len(), 2);
    assert_eq!(upcoming[0].business_name, "A");
    assert_eq!(
        upcoming[1].recurring[0].status,
        EntryStatus::Later {
            starts_in_minutes: 180
        }
    );
}

#[test]
fn flash_and_weekly_at_same_address_share_a_card() {
    let rows = vec![
        weekly(
            "1",
            "Joe's Pizza",
            "123 Main Street, City, NJ 07000",
            "pie night",
            "Tuesday",
            "17:00",
            "22:00",
        ),
        flash(
            "2",
            "JOES PIZZA LLC",
            "123 MAIN ST, City, NJ 07000",
            "free garlic knots",
            "2025-03-04T17:30:00Z",
            "2025-03-04T18:20:30Z",
        ),
        flash(
            "3",
            "Expired",
            "9 Gone Rd, City, NJ 07000",
            "old deal",
            "2025-03-04T12:00:00Z",
            "2025-03-04T13:00:00Z",
        ),
    ];
    let clock = EvalClock::from_datetime(&tuesday_at(18, 0));
    let query = FeedQuery::new(ORIGIN, Radius::Miles(5.0));
    let groups = run_pipeline(&rows, &clock, &query, &CategoryTable::builtin());

    assert_eq!(groups.len(), 1);
    let g = &groups[0];
    assert_eq!(g.business_name, "Joe's Pizza");
    assert_eq!(g.flash.len(), 1);
    assert_eq!(g.flash[0].expires_in_minutes, 21);
    assert_eq!(g.recurring.len(), 1);
    assert!(g.distance_miles < 0.01);
}

#[test]
fn search_and_category_filters() {
    let rows = vec![
        weekly(
            "1",
            "Wing Hut",
            "1 Elm St, X, NJ 07000",
            "50 cent wings",
            "Tuesday",
            "17:00",
            "19:00",
        ),
        weekly(
            "2",
            "Sushi Go",
            "2 Oak Ave, X, NJ 07000",
            "half off rolls",
            "Tuesday",
            "17:00",
            "19:00",
        ),
    ];
    let clock = EvalClock::from_datetime(&tuesday_at(18, 0));
    let categories = CategoryTable::builtin();

    let mut query = FeedQuery::new(ORIGIN, Radius::Anywhere);
    query.search = "SUSHI".to_string();
    let groups = run_pipeline(&rows, &clock, &query, &categories);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].business_name, "Sushi Go");

    query.search.clear();
    query.category = Some("wings".to_string());
    let groups = run_pipeline(&rows, &clock, &query, &categories);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].business_name, "Wing Hut");

    query.category = Some("all".to_string());
    assert_eq!(run_pipeline(&rows, &clock, &query, &categories).len(), 2);
}

#[test]
fn midnight_carryover_reaches_the_feed() {
    let rows = vec![weekly(
        "1",
        "Night Owl",
        "5 Late Ln, X, NJ 07000",
        "late night sliders",
        "Monday",
        "22:00",
        "02:00",
    )];
    let clock = EvalClock::from_datetime(&tuesday_at(1, 30));
    let query = FeedQuery::new(ORIGIN, Radius::Miles(5.0));
    let groups = run_pipeline(&rows, &clock, &query, &CategoryTable::builtin());
    assert_eq!(groups.len(), 1);
    assert!(groups[0].has_active);

    let clock = EvalClock::from_datetime(&tuesday_at(3, 0));
    assert!(run_pipeline(&rows, &clock, &query, &CategoryTable::builtin()).is_empty());
}

#[test]
fn markers_and_top_strip_follow_feed_order() {
    let rows: Vec<RawRow> = (0..7)
        .map(|i| {
            let mut row = weekly(
                &i.to_string(),
                &format!("Spot {i}"),
                &format!("{i} Elm St, X, NJ 07000"),
                "deal",
                "Tuesday",
                "17:00",
                "19:00",
            );
            row.lat = Some(ORIGIN.lat + f64::from(i) * 0.01);
            row
        })
        .collect();
    let clock = EvalClock::from_datetime(&tuesday_at(18, 0));
    let query = FeedQuery::new(ORIGIN, Radius::Anywhere);
    let groups = run_pipeline(&rows, &clock, &query, &CategoryTable::builtin());

    let (top, rest) = split_top(&groups, TOP_COUNT);
    assert_eq!(top.len(), 5);
    assert_eq!(rest.len(), 2);
    assert_eq!(top[0].business_name, "Spot 0");

    let markers = build_markers(&groups, "help@example.com");
    let titles: Vec<_> = markers.iter().map(|m| m.title.as_str()).collect();
    let names: Vec<_> = groups.iter().map(|g| g.business_name.as_str()).collect();
    assert_eq!(titles, names);
}

#[test]
fn bad_rows_do_not_break_the_batch() {
    let mut broken = weekly("bad", "B", "2 Oak Ave", "deal", "Tuesday", "17:00", "19:00");
    broken.extra = Some(json!("{not json"));
    let mut pending = weekly("p", "C", "3 Pine Rd", "deal", "Tuesday", "17:00", "19:00");
    pending.status = Some("pending".to_string());
    let rows = vec![
        broken,
        pending,
        weekly(
            "ok",
            "A",
            "1 Elm St",
            "deal",
            "Tuesday",
            "17:00",
            "19:00",
        ),
    ];
    let clock = EvalClock::from_datetime(&tuesday_at(18, 0));
    let query = FeedQuery::new(ORIGIN, Radius::Miles(5.0));
    let groups = run_pipeline(&rows, &clock, &query, &CategoryTable::builtin());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].business_name, "A");
}
