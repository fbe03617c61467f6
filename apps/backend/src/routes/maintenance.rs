//! Maintenance endpoints

use axum::{extract::State, Json};
use chrono::Utc;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

const DEFAULT_SHIFT_MINUTES: i64 = 10;

/// POST /api/maintenance/shift-reviews
///
/// Moves every due date by one delta so the earliest lands `minutes` from now.
pub async fn shift_reviews(
    State(state): State<AppState>,
    Json(payload): Json<ShiftReviewsRequest>,
) -> Result<Json<ShiftReviewsResponse>> {
    let minutes = payload.minutes.unwrap_or(DEFAULT_SHIFT_MINUTES);
    if minutes < 0 {
        return Err(ApiError::BadRequest("minutes must not be negative".to_string()));
    }

    let response = match state.db.shift_reviews(Utc::now(), minutes).await? {
        Some((shifted, delta)) => {
            tracing::info!(shifted, delta_seconds = delta.num_seconds(), "shifted reviews");
            ShiftReviewsResponse {
                shifted,
                delta_seconds: delta.num_seconds(),
            }
        }
        None => ShiftReviewsResponse {
            shifted: 0,
            delta_seconds: 0,
        },
    };

    Ok(Json(response))
}
