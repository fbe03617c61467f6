//! Home screen summaries: next-due label, upcoming planner and level report.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::IntervalTable;
use crate::types::{LevelCount, NextDue, UpcomingBucket};

/// Cumulative planner horizons, in hours.
pub const UPCOMING_RANGES: &[(&str, i64)] = &[
    ("Now", 0),
    ("1 hour", 1),
    ("2 hours", 2),
    ("4 hours", 4),
    ("8 hours", 8),
    ("16 hours", 16),
    ("1 day", 24),
    ("2 days", 2 * 24),
    ("3 days", 3 * 24),
    ("4 days", 4 * 24),
    ("5 days", 5 * 24),
    ("6 days", 6 * 24),
    ("1 week", 7 * 24),
    ("2 weeks", 2 * 7 * 24),
    ("3 weeks", 3 * 7 * 24),
    ("1 month", 30 * 24),
    ("2 months", 2 * 30 * 24),
    ("4 months", 4 * 30 * 24),
    ("6 months", 6 * 30 * 24),
];

/// Shown when nothing is scheduled at all.
pub const NOTHING_SCHEDULED: &str = "♾️";

/// How the next review is surfaced while a session is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextDueDisplay {
    /// Live countdown in seconds.
    Countdown { seconds: i64 },
    /// Static text, refreshed only on the next interaction.
    Label { text: String },
}

fn pluralize(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Human text for the time until the next review.
pub fn next_due_label(has_due_now: bool, next_future: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(next) = next_future else {
        return format!("Next review: {NOTHING_SCHEDULED}");
    };

    let total = (next - now).num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(pluralize(days, "day"));
    }
    if hours > 0 {
        parts.push(pluralize(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(pluralize(minutes, "minute"));
    }
    if (hours == 0 && minutes == 0) || minutes < 2 {
        parts.push(pluralize(seconds, "second"));
    }

    let prefix = if has_due_now { "Right now, and then " } else { "" };
    format!("Next review: {prefix}{}", parts.join(" "))
}

/// Next-due summary over a set of due dates.
pub fn next_due_summary(due_dates: &[DateTime<Utc>], now: DateTime<Utc>) -> NextDue {
    let has_due_now = due_dates.iter().any(|d| *d <= now);
    let next_future = due_dates.iter().filter(|d| **d > now).min().copied();
    NextDue {
        has_due_now,
        seconds_until: next_future.map(|d| (d - now).num_seconds()),
        label: next_due_label(has_due_now, next_future, now),
    }
}

/// Cumulative counts of variations due before each planner horizon, keeping
/// a bucket only when its count differs from the previous one.
pub fn upcoming_buckets(due_dates: &[DateTime<Utc>], now: DateTime<Utc>) -> Vec<UpcomingBucket> {
    let mut buckets: Vec<UpcomingBucket> = Vec::new();
    for (label, hours) in UPCOMING_RANGES {
        let end = now + Duration::hours(*hours);
        let count = due_dates.iter().filter(|d| **d < end).count();
        if buckets.last().map(|b| b.count) != Some(count) {
            buckets.push(UpcomingBucket {
                label: (*label).to_string(),
                count,
            });
        }
    }
    buckets
}

/// Readable span for an interval in hours, e.g. `4 hours`, `3 days`, `2 months`.
pub fn hours_label(hours: u32) -> String {
    let hours = i64::from(hours);
    if hours >= 30 * 24 && hours % (30 * 24) == 0 {
        pluralize(hours / (30 * 24), "month")
    } else if hours >= 7 * 24 && hours % (7 * 24) == 0 {
        pluralize(hours / (7 * 24), "week")
    } else if hours >= 24 && hours % 24 == 0 {
        pluralize(hours / 24, "day")
    } else {
        pluralize(hours, "hour")
    }
}

/// Variation counts per level, labelled with the level's interval.
///
/// Levels past the table's end are folded into the last level. Empty levels
/// are omitted.
pub fn level_report(levels: &[u32], table: &IntervalTable) -> Vec<LevelCount> {
    let max = table.max_level();
    let mut counts = vec![0usize; max as usize + 1];
    for level in levels {
        counts[(*level).min(max) as usize] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .map(|(level, count)| {
            let level = level as u32;
            let span = if level == 0 {
                "Not started".to_string()
            } else {
                hours_label(table.hours()[level as usize])
            };
            let number = if level == max && max > 0 {
                format!("{level}+")
            } else {
                level.to_string()
            };
            LevelCount {
                level,
                label: format!("{number} - {span}"),
                count,
            }
        })
        .collect()
}

/// Decide between a live countdown and a static label.
///
/// Nothing is shown while something is already due. A countdown is used
/// only when `seconds_until + fudge` is within `threshold`.
pub fn countdown_display(next_due: &NextDue, threshold_secs: i64, fudge_secs: i64) -> Option<NextDueDisplay> {
    if next_due.has_due_now {
        return None;
    }
    match next_due.seconds_until {
        Some(seconds) if seconds + fudge_secs <= threshold_secs => Some(NextDueDisplay::Countdown {
            seconds: seconds + fudge_secs,
        }),
        _ => Some(NextDueDisplay::Label {
            text: next_due.label.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn in_secs(secs: i64) -> DateTime<Utc> {
        now() + Duration::seconds(secs)
    }

    #[test]
    fn label_spells_out_components() {
        let label = next_due_label(false, Some(in_secs(86_400 + 3 * 3_600 + 5 * 60)), now());
        assert_eq!(label, "Next review: 1 day 3 hours 5 minutes");
    }

    #[test]
    fn label_shows_seconds_when_close() {
        assert_eq!(
            next_due_label(false, Some(in_secs(90)), now()),
            "Next review: 1 minute 30 seconds"
        );
        assert_eq!(next_due_label(false, Some(in_secs(42)), now()), "Next review: 42 seconds");
    }

    #[test]
    fn label_prefixes_due_now() {
        assert_eq!(
            next_due_label(true, Some(in_secs(2 * 3_600 + 10 * 60)), now()),
            "Next review: Right now, and then 2 hours 10 minutes"
        );
    }

    #[test]
    fn label_without_future_reviews() {
        assert_eq!(next_due_label(true, None, now()), "Next review: ♾️");
    }

    #[test]
    fn summary_picks_earliest_future_date() {
        let dates = vec![in_secs(-10), in_secs(600), in_secs(120)];
        let summary = next_due_summary(&dates, now());
        assert!(summary.has_due_now);
        assert_eq!(summary.seconds_until, Some(120));
    }

    #[test]
    fn buckets_are_cumulative_and_deduplicated() {
        let dates = vec![in_secs(-60), in_secs(30 * 60), in_secs(90 * 60), in_secs(5 * 86_400)];
        let buckets = upcoming_buckets(&dates, now());
        let flat: Vec<(&str, usize)> = buckets.iter().map(|b| (b.label.as_str(), b.count)).collect();
        assert_eq!(flat, vec![("Now", 1), ("1 hour", 2), ("2 hours", 3), ("6 days", 4)]);
    }

    #[test]
    fn five_day_bucket_is_five_days() {
        let dates = vec![in_secs(5 * 86_400 - 1)];
        let buckets = upcoming_buckets(&dates, now());
        assert_eq!(buckets.last().map(|b| b.label.as_str()), Some("5 days"));
    }

    #[test]
    fn level_report_labels_intervals() {
        let table = IntervalTable::default();
        let report = level_report(&[0, 1, 1, 2, 6, 9, 12], &table);
        let labels: Vec<(String, usize)> = report.into_iter().map(|l| (l.label, l.count)).collect();
        assert_eq!(
            labels,
            vec![
                ("0 - Not started".to_string(), 1),
                ("1 - 4 hours".to_string(), 2),
                ("2 - 1 day".to_string(), 1),
                ("6 - 1 month".to_string(), 1),
                ("9+ - 6 months".to_string(), 2),
            ]
        );
    }

    #[test]
    fn hours_labels() {
        assert_eq!(hours_label(1), "1 hour");
        assert_eq!(hours_label(72), "3 days");
        assert_eq!(hours_label(336), "2 weeks");
        assert_eq!(hours_label(4320), "6 months");
        assert_eq!(hours_label(30), "30 hours");
    }

    #[test]
    fn countdown_threshold_is_inclusive() {
        let at = |seconds| NextDue {
            has_due_now: false,
            seconds_until: Some(seconds),
            label: "Next review: later".to_string(),
        };
        assert_eq!(
            countdown_display(&at(298), 300, 2),
            Some(NextDueDisplay::Countdown { seconds: 300 })
        );
        assert_eq!(
            countdown_display(&at(299), 300, 2),
            Some(NextDueDisplay::Label {
                text: "Next review: later".to_string()
            })
        );
    }

    #[test]
    fn no_countdown_while_due() {
        let due = NextDue {
            has_due_now: true,
            seconds_until: Some(10),
            label: String::new(),
        };
        assert_eq!(countdown_display(&due, 300, 2), None);
    }
}
