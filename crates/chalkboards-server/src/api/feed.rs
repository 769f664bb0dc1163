use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chalkboards_core::categories::ALL_CATEGORIES_KEY;
use chalkboards_core::{Coordinates, Radius};
use chalkboards_feed::format::COLLAPSED_CARD_LINES;
use chalkboards_feed::{
    build_markers, card_lines, distance_text, maps_url, page, report_mailto, run_pipeline,
    split_top, CardLine, EvalClock, FeedMode, FeedQuery, MarkerDescriptor, ReportTarget,
    RestaurantGroup, TOP_COUNT,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct FeedParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Miles, or `any`/`anywhere`.
    pub radius: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub mode: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// A restaurant card ready to render.
#[derive(Debug, Serialize)]
pub(super) struct GroupCard {
    #[serde(flatten)]
    pub group: RestaurantGroup,
    pub distance_text: String,
    pub lines: Vec<CardLine>,
    /// More lines than fit a collapsed card.
    pub expandable: bool,
    pub maps_url: String,
    pub report_url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct FeedData {
    pub evaluated_at: DateTime<Utc>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub store_error: Option<String>,
    pub top: Vec<GroupCard>,
    /// Cards after the top strip, windowed by `offset`/`limit`.
    pub groups: Vec<GroupCard>,
    /// Count of all cards, top strip included.
    pub total: usize,
    pub next_offset: Option<usize>,
}

fn validation(rid: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(rid, "validation_error", message)
}

fn parse_origin(
    rid: &str,
    params: &FeedParams,
    default: Coordinates,
) -> Result<Coordinates, ApiError> {
    match (params.lat, params.lng) {
        (None, None) => Ok(default),
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(validation(rid, "lat must be within ±90, lng within ±180"));
            }
            Coordinates::new(lat, lng).ok_or_else(|| validation(rid, "lat and lng must be finite"))
        }
        _ => Err(validation(rid, "lat and lng must be given together")),
    }
}

/// Turn query parameters into a pipeline query, falling back to the
/// configured origin and radius.
pub(super) fn build_query(
    rid: &str,
    params: &FeedParams,
    state: &AppState,
) -> Result<FeedQuery, ApiError> {
    let origin = parse_origin(rid, params, state.config.default_origin)?;
    let radius = match params.radius.as_deref() {
        Some(raw) => raw.parse::<Radius>().map_err(|e| validation(rid, e))?,
        None => state.config.default_radius,
    };
    let mode = params
        .mode
        .as_deref()
        .unwrap_or_default()
        .parse::<FeedMode>()
        .map_err(|e| validation(rid, e))?;

    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES_KEY));
    if let Some(key) = category {
        if state.categories.get(key).is_none() {
            return Err(validation(rid, format!("unknown category '{key}'")));
        }
    }

    Ok(FeedQuery {
        origin,
        radius,
        search: params.q.clone().unwrap_or_default(),
        category: category.map(ToOwned::to_owned),
        mode,
    })
}

fn card(group: &RestaurantGroup, support_email: &str) -> GroupCard {
    let lines = card_lines(group);
    let report_url = report_mailto(support_email, &ReportTarget::for_group(group));
    GroupCard {
        distance_text: distance_text(group.distance_miles),
        expandable: lines.len() > COLLAPSED_CARD_LINES,
        lines,
        maps_url: maps_url(&group.address),
        report_url,
        group: group.clone(),
    }
}

struct Computed {
    clock: EvalClock,
    fetched_at: Option<DateTime<Utc>>,
    store_error: Option<String>,
    groups: Vec<RestaurantGroup>,
}

fn compute(state: &AppState, query: &FeedQuery) -> Computed {
    let snapshot = state.snapshot();
    let clock = state.clock.now();
    let groups = run_pipeline(&snapshot.rows, &clock, query, &state.categories);
    Computed {
        clock,
        fetched_at: snapshot.fetched_at,
        store_error: snapshot.error,
        groups,
    }
}

/// `GET /api/v1/feed`: ranked restaurant cards around an origin.
pub(super) async fn get_feed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<FeedParams>,
) -> Result<Json<ApiResponse<FeedData>>, ApiError> {
    let query = build_query(&req_id.0, &params, &state)?;
    let limit = normalize_limit(params.limit, state.config.page_size);
    let offset = params.offset.unwrap_or(0);

    let computed = compute(&state, &query);
    let support_email = state.config.support_email.as_str();
    let (top, rest) = split_top(&computed.groups, TOP_COUNT);
    let window = page(rest, offset, limit);

    Ok(Json(ApiResponse {
        data: FeedData {
            evaluated_at: computed.clock.now,
            fetched_at: computed.fetched_at,
            store_error: computed.store_error,
            top: top.iter().map(|g| card(g, support_email)).collect(),
            groups: window
                .items
                .iter()
                .map(|g| card(g, support_email))
                .collect(),
            total: computed.groups.len(),
            next_offset: window.next_offset,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/markers`: one map marker per card, same filters as the feed.
pub(super) async fn list_markers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<FeedParams>,
) -> Result<Json<ApiResponse<Vec<MarkerDescriptor>>>, ApiError> {
    let query = build_query(&req_id.0, &params, &state)?;
    let computed = compute(&state, &query);

    Ok(Json(ApiResponse {
        data: build_markers(&computed.groups, &state.config.support_email),
        meta: ResponseMeta::new(req_id.0),
    }))
}
