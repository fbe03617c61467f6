//! Review session aggregator.
//!
//! Tracks pass/fail tallies across variations and decides when a session is
//! over. All scheduling goes through a [`SchedulerGateway`]; counters move
//! only after the gateway has accepted a report.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::{count_due, DueCounts, SpacedRepetitionAlgorithm};
use crate::error::GatewayError;
use crate::planner::{self, NextDueDisplay};
use crate::quiz::{QuizOutcome, ReportLedger};
use crate::types::{NextDue, QuizResult, ReportResultResponse, ReviewState, VariationId};

/// Gateway result type.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// The scheduler as seen from a review session.
pub trait SchedulerGateway {
    /// Apply a live outcome. Never called for extra study.
    fn report_result(
        &mut self,
        variation_id: VariationId,
        passed: bool,
        now: DateTime<Utc>,
    ) -> GatewayResult<ReportResultResponse>;

    /// Earliest variation due at `now`.
    fn next_due(&self, now: DateTime<Utc>) -> GatewayResult<Option<VariationId>>;

    fn due_counts(&self, now: DateTime<Utc>) -> GatewayResult<DueCounts>;

    fn next_due_summary(&self, now: DateTime<Utc>) -> GatewayResult<NextDue>;
}

/// In-process gateway holding review states in memory.
#[derive(Debug)]
pub struct LocalGateway<S> {
    scheduler: S,
    reviews: BTreeMap<VariationId, ReviewState>,
    history: Vec<QuizResult>,
}

impl<S: SpacedRepetitionAlgorithm> LocalGateway<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            reviews: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Track a variation with an explicit review state.
    pub fn insert(&mut self, variation_id: VariationId, state: ReviewState) {
        self.reviews.insert(variation_id, state);
    }

    /// Track a never-reviewed variation.
    pub fn track(&mut self, variation_id: VariationId, now: DateTime<Utc>) {
        let state = self.scheduler.initial_state(now);
        self.reviews.entry(variation_id).or_insert(state);
    }

    pub fn review(&self, variation_id: VariationId) -> Option<&ReviewState> {
        self.reviews.get(&variation_id)
    }

    pub fn history(&self) -> &[QuizResult] {
        &self.history
    }

    fn due_dates(&self) -> Vec<DateTime<Utc>> {
        self.reviews.values().map(|s| s.due_at).collect()
    }
}

impl<S: SpacedRepetitionAlgorithm> SchedulerGateway for LocalGateway<S> {
    fn report_result(
        &mut self,
        variation_id: VariationId,
        passed: bool,
        now: DateTime<Utc>,
    ) -> GatewayResult<ReportResultResponse> {
        let state = self
            .reviews
            .get_mut(&variation_id)
            .ok_or(GatewayError::UnknownVariation(variation_id))?;

        let result = self.scheduler.schedule(state, passed, now);
        *state = result.new_state;
        self.history.push(QuizResult {
            variation_id,
            reviewed_at: now,
            level: result.previous_level,
            passed,
        });

        let counts = count_due(self.reviews.values(), now);
        Ok(ReportResultResponse::success(counts.due_now, counts.due_soon))
    }

    fn next_due(&self, now: DateTime<Utc>) -> GatewayResult<Option<VariationId>> {
        Ok(self
            .reviews
            .iter()
            .filter(|(_, state)| state.due_at <= now)
            .min_by_key(|(id, state)| (state.due_at, **id))
            .map(|(id, _)| *id))
    }

    fn due_counts(&self, now: DateTime<Utc>) -> GatewayResult<DueCounts> {
        Ok(count_due(self.reviews.values(), now))
    }

    fn next_due_summary(&self, now: DateTime<Utc>) -> GatewayResult<NextDue> {
        Ok(planner::next_due_summary(&self.due_dates(), now))
    }
}

/// Session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Idle time after which the tallies start over.
    pub inactivity_timeout_secs: i64,
    /// Countdowns are shown only up to this many seconds.
    pub countdown_threshold_secs: i64,
    /// Added to the remaining time so the countdown never ends early.
    pub countdown_fudge_secs: i64,
}

impl SessionSettings {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::seconds(self.inactivity_timeout_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: 30 * 60,
            countdown_threshold_secs: 300,
            countdown_fudge_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSessionCounters {
    pub passed: u32,
    pub failed: u32,
    pub session_complete: bool,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl ReviewSessionCounters {
    pub fn total(&self) -> u32 {
        self.passed + self.failed
    }
}

pub struct ReviewSession<G> {
    gateway: G,
    ledger: ReportLedger,
    settings: SessionSettings,
    counters: ReviewSessionCounters,
}

impl<G: SchedulerGateway> ReviewSession<G> {
    pub fn new(gateway: G, ledger: ReportLedger) -> Self {
        Self {
            gateway,
            ledger,
            settings: SessionSettings::default(),
            counters: ReviewSessionCounters::default(),
        }
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn counters(&self) -> &ReviewSessionCounters {
        &self.counters
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn ledger(&self) -> &ReportLedger {
        &self.ledger
    }

    /// Next variation to review, if any is due.
    pub fn next_due(&mut self, now: DateTime<Utc>) -> GatewayResult<Option<VariationId>> {
        self.expire_if_idle(now);
        let next = self.gateway.next_due(now)?;
        if next.is_some() {
            self.counters.session_complete = false;
        }
        Ok(next)
    }

    /// Report a quiz outcome.
    ///
    /// Extra-study outcomes are ignored. A failed report leaves the counters
    /// untouched and releases the attempt's ledger mark so it can be retried.
    pub fn record_outcome(
        &mut self,
        outcome: QuizOutcome,
        now: DateTime<Utc>,
    ) -> GatewayResult<Option<ReportResultResponse>> {
        if outcome.extra_study {
            tracing::debug!(variation_id = outcome.variation_id, "extra study outcome not recorded");
            return Ok(None);
        }
        self.expire_if_idle(now);

        let response = match self.gateway.report_result(outcome.variation_id, outcome.passed, now) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(variation_id = outcome.variation_id, error = %e, "failed to report outcome");
                self.ledger.release(outcome.variation_id);
                return Err(e);
            }
        };

        if outcome.passed {
            self.counters.passed += 1;
        } else {
            self.counters.failed += 1;
        }
        self.counters.last_completed_at = Some(now);
        self.counters.session_complete = response.total_due_now == 0 && response.total_due_soon == 0;

        tracing::info!(
            variation_id = outcome.variation_id,
            passed = outcome.passed,
            due_now = response.total_due_now,
            due_soon = response.total_due_soon,
            "recorded outcome"
        );
        Ok(Some(response))
    }

    /// The scheduler has nothing due now or soon, or the session has been
    /// idle too long. Refreshes `counters().session_complete`.
    pub fn is_session_complete(&mut self, now: DateTime<Utc>) -> GatewayResult<bool> {
        let complete = self.is_idle(now) || self.gateway.due_counts(now)?.is_clear();
        self.counters.session_complete = complete;
        Ok(complete)
    }

    /// Countdown or label for the next review. `None` while something is due.
    pub fn time_until_next_due(&self, now: DateTime<Utc>) -> GatewayResult<Option<NextDueDisplay>> {
        let summary = self.gateway.next_due_summary(now)?;
        Ok(planner::countdown_display(
            &summary,
            self.settings.countdown_threshold_secs,
            self.settings.countdown_fudge_secs,
        ))
    }

    pub fn reset(&mut self) {
        self.counters = ReviewSessionCounters::default();
    }

    fn is_idle(&self, now: DateTime<Utc>) -> bool {
        self.counters
            .last_completed_at
            .is_some_and(|last| now - last > self.settings.inactivity_timeout())
    }

    fn expire_if_idle(&mut self, now: DateTime<Utc>) {
        if self.is_idle(now) {
            tracing::info!(
                passed = self.counters.passed,
                failed = self.counters.failed,
                "session idle, resetting counters"
            );
            self.reset();
        }
    }
}
