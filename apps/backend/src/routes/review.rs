//! Review endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};

use repertoire_core::QuizResult;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// Number of past results served with a variation
const HISTORY_LIMIT: i64 = 20;

/// GET /api/review
///
/// Serves the earliest due variation for a live review.
pub async fn next_due(State(state): State<AppState>) -> Result<Json<ReviewResponse>> {
    let now = Utc::now();
    let variation_id = state.db.get_next_due_variation(now).await?.map(|v| v.id);
    let response = build_review(&state, variation_id, false, now).await?;
    Ok(Json(response))
}

/// GET /api/review/{id}
///
/// Serves one variation as extra study. Results are never reported.
pub async fn extra_study(State(state): State<AppState>, Path(variation_id): Path<i64>) -> Result<Json<ReviewResponse>> {
    let now = Utc::now();
    if state.db.get_variation(variation_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Variation {variation_id}")));
    }
    let response = build_review(&state, Some(variation_id), true, now).await?;
    Ok(Json(response))
}

/// POST /api/report-result
pub async fn report_result(
    State(state): State<AppState>,
    Json(payload): Json<ReportResultRequest>,
) -> Result<Json<ReportResultResponse>> {
    let now = Utc::now();
    let result = state
        .db
        .report_result(payload.variation_id, payload.passed, now, state.scheduler.as_ref())
        .await?;

    tracing::info!(
        variation_id = payload.variation_id,
        passed = payload.passed,
        previous_level = result.previous_level,
        new_level = result.new_state.level,
        "recorded quiz result"
    );

    let counts = state.db.get_due_counts(now).await?;
    Ok(Json(ReportResultResponse::success(counts.due_now, counts.due_soon)))
}

async fn build_review(
    state: &AppState,
    variation_id: Option<i64>,
    extra_study: bool,
    now: DateTime<Utc>,
) -> Result<ReviewResponse> {
    let counts = state.db.get_due_counts(now).await?;

    let (variation, history) = match variation_id {
        Some(id) => {
            let store = state.db.load_store(&[id], &[]).await?;
            let variation = ReviewVariation::from_store(&store, id)?;
            let history: Vec<QuizResult> = state
                .db
                .get_quiz_results(id, HISTORY_LIMIT)
                .await?
                .iter()
                .map(DbQuizResult::to_core)
                .collect();
            (Some(variation), history)
        }
        None => (None, Vec::new()),
    };

    Ok(ReviewResponse {
        variation,
        extra_study,
        total_due_now: counts.due_now,
        total_due_soon: counts.due_soon,
        history,
        annotations: annotation_options(),
    })
}
