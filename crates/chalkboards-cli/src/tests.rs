use super::*;

use chalkboards_core::{
    AppConfig, Coordinates, Environment, ModerationStatus, RawRow, SpecialKind,
};
use chalkboards_feed::{run_pipeline, EvalClock, FeedQuery};
use chalkboards_store::SubmissionReceipt;
use chrono::{TimeZone, Utc};

fn test_config() -> AppConfig {
    AppConfig {
        store_url: "http://127.0.0.1:9".to_string(),
        store_key: "anon".to_string(),
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "info".to_string(),
        categories_path: None,
        geocoder_url: "http://127.0.0.1:9".to_string(),
        request_timeout_secs: 5,
        user_agent: "chalkboards-test".to_string(),
        fetch_limit: 800,
        fetch_max_retries: 0,
        fetch_backoff_base_secs: 0,
        refresh_interval_secs: 240,
        default_origin: Coordinates {
            lat: 40.88,
            lng: -74.07,
        },
        default_radius: Radius::Miles(10.0),
        page_size: 10,
        support_email: "support@example.com".to_string(),
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["chalkboards-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_feed_with_defaults() {
    let cli = Cli::try_parse_from(["chalkboards-cli", "feed"]).unwrap();
    let Some(Commands::Feed { filters }) = cli.command else {
        panic!("expected feed command");
    };
    assert!(filters.lat.is_none());
    assert!(filters.radius.is_none());
    assert_eq!(filters.mode, FeedMode::Now);
    assert_eq!(filters.search, "");
}

#[test]
fn parses_feed_filters() {
    let cli = Cli::try_parse_from([
        "chalkboards-cli",
        "feed",
        "--lat",
        "40.9",
        "--lng",
        "-74.1",
        "--radius",
        "any",
        "--search",
        "wings",
        "--category",
        "beer",
        "--mode",
        "upcoming",
        "--limit",
        "3",
    ])
    .unwrap();
    let Some(Commands::Feed { filters }) = cli.command else {
        panic!("expected feed command");
    };
    assert_eq!(filters.lng, Some(-74.1));
    assert_eq!(filters.radius, Some(Radius::Anywhere));
    assert_eq!(filters.mode, FeedMode::Upcoming);
    assert_eq!(filters.category.as_deref(), Some("beer"));
    assert_eq!(filters.limit, Some(3));
}

#[test]
fn lat_without_lng_is_rejected() {
    assert!(Cli::try_parse_from(["chalkboards-cli", "feed", "--lat", "40.9"]).is_err());
}

#[test]
fn bad_mode_is_rejected() {
    assert!(Cli::try_parse_from(["chalkboards-cli", "feed", "--mode", "someday"]).is_err());
}

#[test]
fn parses_watch_interval() {
    let cli =
        Cli::try_parse_from(["chalkboards-cli", "watch", "--interval-secs", "30"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Watch {
            interval_secs: Some(30),
            ..
        })
    ));
}

#[test]
fn parses_submit_weekly() {
    let cli = Cli::try_parse_from([
        "chalkboards-cli",
        "submit-weekly",
        "--business-name",
        "Wing Hut",
        "--street",
        "1 Elm St",
        "--city",
        "X",
        "--state",
        "NJ",
        "--zip",
        "07000",
        "--description",
        "$1 wings",
        "--weekday",
        "tue",
        "--start",
        "17:00",
        "--end",
        "19:00",
    ])
    .unwrap();
    let Some(Commands::SubmitWeekly {
        listing,
        weekday,
        start,
        end,
    }) = cli.command
    else {
        panic!("expected submit-weekly command");
    };
    assert_eq!(listing.business_name, "Wing Hut");
    assert_eq!(weekday, Weekday::Tuesday);
    assert_eq!(start.to_string(), "17:00");
    assert_eq!(end.to_string(), "19:00");
}

#[test]
fn submit_weekly_rejects_bad_time() {
    let result = Cli::try_parse_from([
        "chalkboards-cli",
        "submit-weekly",
        "--business-name",
        "A",
        "--street",
        "1 Elm St",
        "--city",
        "X",
        "--state",
        "NJ",
        "--zip",
        "07000",
        "--description",
        "deal",
        "--weekday",
        "tue",
        "--start",
        "5pm",
        "--end",
        "19:00",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_submit_flash_duration() {
    let cli = Cli::try_parse_from([
        "chalkboards-cli",
        "submit-flash",
        "--business-name",
        "A",
        "--street",
        "1 Elm St",
        "--city",
        "X",
        "--state",
        "NJ",
        "--zip",
        "07000",
        "--description",
        "deal",
        "--duration-minutes",
        "45",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::SubmitFlash {
            duration_minutes: Some(45),
            ..
        })
    ));
}

#[test]
fn build_query_falls_back_to_config() {
    let cli = Cli::try_parse_from(["chalkboards-cli", "feed", "--search", "taco"]).unwrap();
    let Some(Commands::Feed { filters }) = cli.command else {
        panic!("expected feed command");
    };
    let config = test_config();
    let query = feed::build_query(&config, &filters).unwrap();
    assert_eq!(query.origin, config.default_origin);
    assert_eq!(query.radius, config.default_radius);
    assert_eq!(query.search, "taco");
}

/// Tuesday 17:00-19:00 deal `i` at Wing Hut.
fn wing_hut_deal(i: usize) -> RawRow {
    RawRow {
        id: Some(format!("w{i}")),
        created_at: Some("2025-02-01T12:00:00Z".to_string()),
        kind: Some("weekly".to_string()),
        business_name: Some("Wing Hut".to_string()),
        deal: Some(format!("deal {i}")),
        address: Some("1 Elm St, X, NJ 07000".to_string()),
        extra: Some(serde_json::json!({
            "day": "Tuesday",
            "start": "17:00",
            "end": "19:00"
        })),
        lat: Some(40.88),
        lng: Some(-74.07),
        ..RawRow::default()
    }
}

fn tuesday_evening_groups(deals: &[RawRow]) -> Vec<chalkboards_feed::RestaurantGroup> {
    let config = test_config();
    let clock = EvalClock::from_datetime(&Utc.with_ymd_and_hms(2025, 3, 4, 18, 0, 0).unwrap());
    let query = FeedQuery::new(config.default_origin, config.default_radius);
    run_pipeline(deals, &clock, &query, &CategoryTable::builtin())
}

#[test]
fn render_cards_numbers_and_collapses() {
    let deals: Vec<_> = (0..8).map(wing_hut_deal).collect();
    let groups = tuesday_evening_groups(&deals);
    assert_eq!(groups.len(), 1);

    let text = feed::render_cards(&groups, 1);
    assert!(text.starts_with(" 1. Wing Hut  (0.0 mi)\n    1 Elm St, X, NJ 07000\n"));
    assert!(text.contains("[5:00 PM – 7:00 PM]"));
    assert!(text.contains("… 2 more"));
}

#[test]
fn render_cards_titles_blank_names_like_the_map() {
    let mut groups = tuesday_evening_groups(&[wing_hut_deal(0)]);
    groups[0].business_name = "  ".to_string();

    let text = feed::render_cards(&groups, 3);
    assert!(text.starts_with(" 3. Business  (0.0 mi)\n"));
    assert!(text.ends_with("[5:00 PM – 7:00 PM]\n"));
}

#[test]
fn receipt_mentions_status() {
    let receipt = SubmissionReceipt {
        kind: SpecialKind::Weekly,
        business_name: "Wing Hut".to_string(),
        address: "1 Elm St, X, NJ 07000".to_string(),
        coordinates: Coordinates {
            lat: 40.88,
            lng: -74.07,
        },
        status: ModerationStatus::Pending,
        expires_at: None,
    };
    let text = submit::describe_receipt(&receipt);
    assert!(text.starts_with("saved weekly special for Wing Hut"));
    assert!(text.contains("status: pending"));
    assert!(!text.contains("expires"));
}

#[test]
fn flash_receipt_ends_with_expiry_line() {
    let receipt = SubmissionReceipt {
        kind: SpecialKind::Flash,
        business_name: "Wing Hut".to_string(),
        address: "1 Elm St, X, NJ 07000".to_string(),
        coordinates: Coordinates {
            lat: 40.88,
            lng: -74.07,
        },
        status: ModerationStatus::Approved,
        expires_at: Some(Utc.with_ymd_and_hms(2025, 3, 4, 19, 0, 0).unwrap()),
    };
    let text = submit::describe_receipt(&receipt);
    let (head, expiry) = text.rsplit_once('\n').expect("expiry line");
    assert!(head.ends_with("status: approved"));
    assert!(expiry.starts_with("  expires: "));
    assert!(expiry.ends_with('M'));
}
