//! Integration tests for `SpecialsStore` and `Geocoder` using wiremock HTTP mocks.

use chalkboards_core::{ModerationStatus, NewSpecialRow, SpecialKind, WeeklyMeta};
use chalkboards_store::{GeocodeError, Geocoder, SpecialsStore, StoreError};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_store(base_url: &str) -> SpecialsStore {
    SpecialsStore::with_base_url("anon-key", 30, base_url)
        .expect("store construction should not fail")
}

#[tokio::test]
async fn fetch_recent_sends_query_and_auth_headers() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "id": 1,
            "created_at": "2025-03-04T17:00:00+00:00",
            "type": "flash",
            "business_name": "Wing Hut",
            "deal": "half-price wings",
            "address": "1 Elm St, X, NJ 07000",
            "expires_at": "2025-03-04T19:00:00+00:00",
            "status": "approved",
            "extra": null,
            "lat": 40.88,
            "lng": -74.07
        },
        {
            "id": "w-2",
            "type": "weekly",
            "extra": "{\"day\":\"Tue\",\"start\":\"17:00\",\"end\":\"19:00\"}"
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/specials"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "800"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let rows = test_store(&server.uri())
        .fetch_recent()
        .await
        .expect("should fetch rows");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id.as_deref(), Some("1"));
    assert_eq!(rows[0].business_name.as_deref(), Some("Wing Hut"));
    assert_eq!(rows[1].kind.as_deref(), Some("weekly"));
    let extra = rows[1].extra.as_ref();
    assert!(extra.is_some_and(serde_json::Value::is_string));
}

#[tokio::test]
async fn fetch_recent_skips_undecodable_elements() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        { "id": "ok", "type": "flash" },
        { "id": "bad", "lat": "not a number" },
        "not even an object",
        { "id": "ok-2", "type": "weekly" }
    ]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/specials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let rows = test_store(&server.uri()).fetch_recent().await.unwrap();
    let ids: Vec<_> = rows.iter().filter_map(|r| r.id.as_deref()).collect();
    assert_eq!(ids, vec!["ok", "ok-2"]);
}

#[tokio::test]
async fn api_error_uses_message_from_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specials"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Invalid API key",
            "hint": null
        })))
        .mount(&server)
        .await;

    let err = test_store(&server.uri()).fetch_recent().await.unwrap_err();
    match err {
        StoreError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_array_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specials"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"rows\": []}"))
        .mount(&server)
        .await;

    let err = test_store(&server.uri()).fetch_recent().await.unwrap_err();
    assert!(matches!(err, StoreError::Deserialize { .. }), "got {err:?}");
}

#[tokio::test]
async fn transient_read_failure_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specials"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/specials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": "x" }])))
        .mount(&server)
        .await;

    let rows = test_store(&server.uri())
        .with_retry(2, 0)
        .fetch_recent()
        .await
        .expect("second attempt should succeed");
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn insert_posts_single_row_with_minimal_return() {
    let server = MockServer::start().await;

    let row = NewSpecialRow {
        kind: SpecialKind::Weekly,
        business_name: "A".to_string(),
        deal: "$1 wings".to_string(),
        address: "1 Elm St, X, NJ 07000".to_string(),
        expires_at: None,
        status: ModerationStatus::Pending,
        extra: Some(WeeklyMeta {
            day: "Tuesday".to_string(),
            start: "17:00".to_string(),
            end: "19:00".to_string(),
        }),
        lat: 40.88,
        lng: -74.07,
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/specials"))
        .and(header("prefer", "return=minimal"))
        .and(header("apikey", "anon-key"))
        .and(body_json(serde_json::json!([{
            "type": "weekly",
            "business_name": "A",
            "deal": "$1 wings",
            "address": "1 Elm St, X, NJ 07000",
            "expires_at": null,
            "status": "pending",
            "extra": { "day": "Tuesday", "start": "17:00", "end": "19:00" },
            "lat": 40.88,
            "lng": -74.07
        }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    test_store(&server.uri())
        .insert(&row)
        .await
        .expect("insert should succeed");
}

#[tokio::test]
async fn insert_failure_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/specials"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .expect(1)
        .mount(&server)
        .await;

    let row = NewSpecialRow {
        kind: SpecialKind::Flash,
        business_name: "A".to_string(),
        deal: "deal".to_string(),
        address: "1 Elm St".to_string(),
        expires_at: None,
        status: ModerationStatus::Approved,
        extra: None,
        lat: 0.0,
        lng: 0.0,
    };
    let err = test_store(&server.uri())
        .with_retry(3, 0)
        .insert(&row)
        .await
        .unwrap_err();
    assert!(
        matches!(err, StoreError::Api { status: 500, ref message } if message == "db down"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn geocode_parses_first_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(query_param("q", "1 Elm St, X, NJ 07000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "lat": "40.8801", "lon": "-74.0702", "display_name": "1 Elm St" }
        ])))
        .mount(&server)
        .await;

    let geocoder = Geocoder::with_base_url(&server.uri(), 30).unwrap();
    let coords = geocoder
        .geocode("1 Elm St, X, NJ 07000")
        .await
        .unwrap()
        .expect("should find a match");
    assert!((coords.lat - 40.8801).abs() < 1e-9);
    assert!((coords.lng + 74.0702).abs() < 1e-9);
}

#[tokio::test]
async fn geocode_miss_and_garbage_are_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "nowhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "garbled"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "lat": "north", "lon": "-74.0" }])),
        )
        .mount(&server)
        .await;

    let geocoder = Geocoder::with_base_url(&server.uri(), 30).unwrap();
    assert!(geocoder.geocode("nowhere").await.unwrap().is_none());
    assert!(geocoder.geocode("garbled").await.unwrap().is_none());
}

#[tokio::test]
async fn geocode_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let geocoder = Geocoder::with_base_url(&server.uri(), 30).unwrap();
    let err = geocoder.geocode("1 Elm St").await.unwrap_err();
    assert!(matches!(
        err,
        GeocodeError::UnexpectedStatus { status: 502 }
    ));
}
