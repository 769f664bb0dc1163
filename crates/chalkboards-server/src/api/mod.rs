mod feed;
mod specials;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chalkboards_core::{AppConfig, Category, CategoryTable};
use chalkboards_feed::EvalClock;
use chalkboards_store::{FeedSnapshot, Submitter};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

/// Source of "now" for feed evaluation.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// The server's local wall clock.
    System,
    #[cfg(test)]
    Fixed(EvalClock),
}

impl Clock {
    #[must_use]
    pub fn now(self) -> EvalClock {
        match self {
            Clock::System => EvalClock::local_now(),
            #[cfg(test)]
            Clock::Fixed(clock) => clock,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub categories: Arc<CategoryTable>,
    pub feed: watch::Receiver<FeedSnapshot>,
    pub submitter: Arc<Submitter>,
    pub clock: Clock,
}

impl AppState {
    /// Copy of the latest published snapshot. Cheap: rows are behind an `Arc`.
    pub(super) fn snapshot(&self) -> FeedSnapshot {
        self.feed.borrow().clone()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    generation: u64,
    rows: usize,
    last_refresh: Option<DateTime<Utc>>,
    store_error: Option<String>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "address_not_found" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Page size for list endpoints: the configured default, capped at 100.
pub(super) fn normalize_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, 100)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

fn submission_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/specials/flash", post(specials::submit_flash))
        .route("/api/v1/specials/weekly", post(specials::submit_weekly))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/feed", get(feed::get_feed))
        .route("/api/v1/markers", get(feed::list_markers));

    Router::new()
        .merge(public_routes)
        .merge(submission_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let snapshot = state.snapshot();

    let (status_code, status) = match (&snapshot.error, snapshot.generation) {
        (Some(e), _) => {
            tracing::warn!(error = %e, "health check: last refresh failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
        (None, 0) => (StatusCode::SERVICE_UNAVAILABLE, "starting"),
        (None, _) => (StatusCode::OK, "ok"),
    };

    (
        status_code,
        Json(ApiResponse {
            data: HealthData {
                status,
                generation: snapshot.generation,
                rows: snapshot.rows.len(),
                last_refresh: snapshot.fetched_at,
                store_error: snapshot.error,
            },
            meta,
        }),
    )
}

async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<Category>>> {
    Json(ApiResponse {
        data: state.categories.categories.clone(),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(30, Duration::from_mins(1))
}
