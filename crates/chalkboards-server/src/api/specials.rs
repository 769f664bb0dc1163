use axum::{extract::State, http::StatusCode, Extension, Json};
use chalkboards_feed::{classify, Classified};
use chalkboards_store::{FlashDraft, SubmissionReceipt, SubmitError, WeeklyDraft};
use chrono::Utc;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

type Created = (StatusCode, Json<ApiResponse<SubmissionReceipt>>);

fn map_submit_error(request_id: &str, error: &SubmitError) -> ApiError {
    match error {
        SubmitError::MissingFields(_) | SubmitError::EmptyWindow | SubmitError::InvalidDuration => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        SubmitError::AddressNotFound(_) => {
            ApiError::new(request_id, "address_not_found", error.to_string())
        }
        SubmitError::Geocode(e) => {
            tracing::warn!(error = %e, "geocoder unavailable");
            ApiError::new(
                request_id,
                "upstream_error",
                "address lookup failed, try again",
            )
        }
        SubmitError::Store(e) => {
            tracing::error!(error = %e, "row store insert failed");
            ApiError::new(
                request_id,
                "upstream_error",
                "could not save special, try again",
            )
        }
    }
}

/// The feed as currently published, for reusing names already on file.
fn existing(state: &AppState) -> Classified {
    classify(&state.snapshot().rows)
}

fn created(receipt: SubmissionReceipt, req_id: RequestId) -> Created {
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            data: receipt,
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

/// `POST /api/v1/specials/flash`: publish a flash special immediately.
pub(super) async fn submit_flash(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(draft): Json<FlashDraft>,
) -> Result<Created, ApiError> {
    let existing = existing(&state);
    let receipt = state
        .submitter
        .submit_flash(&draft, &existing, Utc::now())
        .await
        .map_err(|e| map_submit_error(&req_id.0, &e))?;
    Ok(created(receipt, req_id))
}

/// `POST /api/v1/specials/weekly`: queue a weekly special for moderation.
pub(super) async fn submit_weekly(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(draft): Json<WeeklyDraft>,
) -> Result<Created, ApiError> {
    let existing = existing(&state);
    let receipt = state
        .submitter
        .submit_weekly(&draft, &existing)
        .await
        .map_err(|e| map_submit_error(&req_id.0, &e))?;
    Ok(created(receipt, req_id))
}
