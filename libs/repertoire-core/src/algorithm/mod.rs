//! Spaced repetition scheduling.

pub mod leveled;

pub use leveled::{FailPenalty, IntervalTable, LevelScheduler};

use crate::types::ReviewState;
use chrono::{DateTime, Duration, Utc};

/// Result of scheduling a variation after a live review.
#[derive(Debug, Clone)]
pub struct SchedulingResult {
    pub previous_level: u32,
    pub new_state: ReviewState,
    pub next_due: DateTime<Utc>,
}

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate the next review state after a live pass or fail.
    fn schedule(&self, state: &ReviewState, passed: bool, now: DateTime<Utc>) -> SchedulingResult;

    /// Initial state for a variation that has never been reviewed.
    fn initial_state(&self, now: DateTime<Utc>) -> ReviewState {
        ReviewState::unreviewed(now)
    }

    /// Interval granted at a level.
    fn interval(&self, level: u32) -> Duration;
}

/// Whether a variation is due at `now`.
pub fn is_due(state: &ReviewState, now: DateTime<Utc>) -> bool {
    state.due_at <= now
}

/// Whether a variation becomes due after `now` but within `horizon`.
pub fn is_due_soon(state: &ReviewState, now: DateTime<Utc>, horizon: Duration) -> bool {
    state.due_at > now && state.due_at <= now + horizon
}

/// How far ahead "due soon" looks. The horizon grows with the backlog because
/// a long queue takes longer to clear.
pub fn soon_horizon(total_due_now: usize) -> Duration {
    let minutes = if total_due_now < 5 {
        2
    } else if total_due_now < 10 {
        5
    } else {
        8
    };
    Duration::minutes(minutes)
}

/// Counts of due and soon-due variations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueCounts {
    pub due_now: usize,
    pub due_soon: usize,
}

impl DueCounts {
    pub fn is_clear(&self) -> bool {
        self.due_now == 0 && self.due_soon == 0
    }
}

/// Count due and soon-due variations among `states`.
pub fn count_due<'a>(states: impl IntoIterator<Item = &'a ReviewState>, now: DateTime<Utc>) -> DueCounts {
    let due_dates: Vec<DateTime<Utc>> = states.into_iter().map(|s| s.due_at).collect();
    let due_now = due_dates.iter().filter(|d| **d <= now).count();
    let soon = now + soon_horizon(due_now);
    let due_soon = due_dates.iter().filter(|d| **d > now && **d <= soon).count();
    DueCounts { due_now, due_soon }
}
