//! Home screen endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use repertoire_core::planner;

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/home-upcoming
pub async fn upcoming(
    State(state): State<AppState>,
    Query(query): Query<HomeUpcomingQuery>,
) -> Result<Json<HomeUpcoming>> {
    let filter = query.filter()?;
    let rows = state.db.get_due_rows(&filter).await?;
    let now = Utc::now();

    let due_dates: Vec<_> = rows.iter().map(|r| r.next_review).collect();
    let levels: Vec<u32> = rows.iter().map(|r| r.review_state().level).collect();

    Ok(Json(HomeUpcoming {
        next_due: planner::next_due_summary(&due_dates, now),
        upcoming: planner::upcoming_buckets(&due_dates, now),
        levels: planner::level_report(&levels, &state.scheduler.table),
    }))
}
