//! Level-based scheduler.
//!
//! Each variation sits at an integer level. A pass climbs one level, a fail
//! drops by the configured penalty, and the level indexes an interval table.

use std::str::FromStr;

use super::{SchedulingResult, SpacedRepetitionAlgorithm};
use crate::error::{CoreError, Result};
use crate::types::ReviewState;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hours per level: relearn, 4 hours, 1 day, 3 days, 1 week, 2 weeks,
/// 1 month, 2 months, 4 months, 6 months.
pub const DEFAULT_INTERVAL_HOURS: [u32; 10] = [1, 4, 24, 72, 168, 336, 720, 1440, 2880, 4320];

/// Interval per level. Non-empty and non-decreasing; the last entry is the cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct IntervalTable {
    hours: Vec<u32>,
}

impl IntervalTable {
    pub fn from_hours(hours: Vec<u32>) -> Result<Self> {
        if hours.is_empty() {
            return Err(CoreError::InvalidIntervalTable("no levels".to_string()));
        }
        if let Some(pos) = hours.windows(2).position(|w| w[1] < w[0]) {
            return Err(CoreError::InvalidIntervalTable(format!(
                "level {} is shorter than level {}",
                pos + 1,
                pos
            )));
        }
        Ok(Self { hours })
    }

    /// Highest reachable level.
    pub fn max_level(&self) -> u32 {
        (self.hours.len() - 1) as u32
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    /// Interval at `level`, capped at the last entry.
    pub fn interval(&self, level: u32) -> Duration {
        let index = (level as usize).min(self.hours.len() - 1);
        Duration::hours(i64::from(self.hours[index]))
    }
}

impl Default for IntervalTable {
    fn default() -> Self {
        Self {
            hours: DEFAULT_INTERVAL_HOURS.to_vec(),
        }
    }
}

impl TryFrom<Vec<u32>> for IntervalTable {
    type Error = CoreError;

    fn try_from(hours: Vec<u32>) -> Result<Self> {
        Self::from_hours(hours)
    }
}

impl From<IntervalTable> for Vec<u32> {
    fn from(table: IntervalTable) -> Self {
        table.hours
    }
}

impl FromStr for IntervalTable {
    type Err = CoreError;

    /// Parse a comma separated hour list such as `1,4,24,72`.
    fn from_str(s: &str) -> Result<Self> {
        let hours = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| CoreError::InvalidIntervalTable(format!("not a number of hours: {part:?}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_hours(hours)
    }
}

/// How far a failed review drops a variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "levels", rename_all = "snake_case")]
pub enum FailPenalty {
    /// Drop this many levels, never below 0.
    StepBack(u32),
    /// Drop straight to a fixed level (only ever downwards).
    ResetTo(u32),
}

impl FailPenalty {
    pub fn apply(self, level: u32) -> u32 {
        match self {
            Self::StepBack(steps) => level.saturating_sub(steps),
            Self::ResetTo(target) => level.min(target),
        }
    }
}

impl Default for FailPenalty {
    fn default() -> Self {
        Self::StepBack(2)
    }
}

/// Level scheduler over an interval table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScheduler {
    #[serde(default)]
    pub table: IntervalTable,
    #[serde(default)]
    pub penalty: FailPenalty,
}

impl LevelScheduler {
    pub fn new(table: IntervalTable, penalty: FailPenalty) -> Self {
        Self { table, penalty }
    }

    fn next_level(&self, level: u32, passed: bool) -> u32 {
        let max = self.table.max_level();
        let level = level.min(max);
        if passed {
            (level + 1).min(max)
        } else {
            self.penalty.apply(level)
        }
    }
}

impl SpacedRepetitionAlgorithm for LevelScheduler {
    fn name(&self) -> &'static str {
        "leveled"
    }

    fn schedule(&self, state: &ReviewState, passed: bool, now: DateTime<Utc>) -> SchedulingResult {
        let level = self.next_level(state.level, passed);
        let next_due = now + self.table.interval(level);

        tracing::debug!(
            from = state.level,
            to = level,
            passed,
            next_due = %next_due,
            "scheduled variation"
        );

        SchedulingResult {
            previous_level: state.level,
            new_state: ReviewState { level, due_at: next_due },
            next_due,
        }
    }

    fn interval(&self, level: u32) -> Duration {
        self.table.interval(level)
    }
}
