//! Move classification for quiz sessions.

use serde::{Deserialize, Serialize};

use crate::notation::{normalize_san, normalize_san_among};
use crate::shapes::Brush;

/// How a played move relates to the expected answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveClass {
    Correct,
    AcceptableNonFailing,
    AcceptableFailing,
    Wrong,
}

impl MoveClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::AcceptableNonFailing => "acceptable_non_failing",
            Self::AcceptableFailing => "acceptable_failing",
            Self::Wrong => "wrong",
        }
    }

    /// Whether the class marks the whole attempt as failed.
    pub fn counts_as_failure(&self) -> bool {
        matches!(self, Self::AcceptableFailing | Self::Wrong)
    }

    /// Arrow and square brushes used to annotate a rejected move.
    pub fn brush_pair(&self) -> Option<(Brush, Brush)> {
        match self {
            Self::Correct => None,
            Self::AcceptableNonFailing => Some((Brush::Blue, Brush::PaleBlue)),
            Self::AcceptableFailing => Some((Brush::Yellow, Brush::PaleRed)),
            Self::Wrong => Some((Brush::Red, Brush::PaleRed)),
        }
    }
}

/// Result of comparing a played move to the expected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub class: MoveClass,
    /// Normalized played move (for display).
    pub played_normalized: String,
    /// Normalized expected move (for display).
    pub expected_normalized: String,
}

/// Classify a played move against the mainline answer and both alt sets.
///
/// Checked in order: mainline, `alt`, `alt_fail`. Anything else is wrong.
pub fn classify_move(played: &str, expected: &str, alt: &[String], alt_fail: &[String]) -> MatchResult {
    classify_with(played, expected, alt, alt_fail, normalize_san)
}

/// Like [`classify_move`], but disambiguators are only ignored when `legal`
/// holds no other move they would be confused with.
pub fn classify_move_among(
    played: &str,
    expected: &str,
    alt: &[String],
    alt_fail: &[String],
    legal: &[String],
) -> MatchResult {
    classify_with(played, expected, alt, alt_fail, |san| normalize_san_among(san, legal))
}

fn classify_with(
    played: &str,
    expected: &str,
    alt: &[String],
    alt_fail: &[String],
    normalize: impl Fn(&str) -> String,
) -> MatchResult {
    let played_normalized = normalize(played);
    let expected_normalized = normalize(expected);
    let member = |set: &[String]| set.iter().any(|m| normalize(m) == played_normalized);

    let class = if played_normalized == expected_normalized {
        MoveClass::Correct
    } else if member(alt) {
        MoveClass::AcceptableNonFailing
    } else if member(alt_fail) {
        MoveClass::AcceptableFailing
    } else {
        MoveClass::Wrong
    };

    MatchResult {
        class,
        played_normalized,
        expected_normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sets() -> (Vec<String>, Vec<String>) {
        (vec!["Nc3".to_string()], vec!["Na3".to_string()])
    }

    #[test]
    fn classifies_every_tier() {
        let (alt, alt_fail) = sets();
        let class = |played| classify_move(played, "Nf3", &alt, &alt_fail).class;
        assert_eq!(class("Nf3"), MoveClass::Correct);
        assert_eq!(class("Nc3"), MoveClass::AcceptableNonFailing);
        assert_eq!(class("Na3"), MoveClass::AcceptableFailing);
        assert_eq!(class("e4"), MoveClass::Wrong);
    }

    #[test]
    fn failure_flags() {
        assert!(!MoveClass::Correct.counts_as_failure());
        assert!(!MoveClass::AcceptableNonFailing.counts_as_failure());
        assert!(MoveClass::AcceptableFailing.counts_as_failure());
        assert!(MoveClass::Wrong.counts_as_failure());
    }

    #[test]
    fn disambiguated_answer_still_matches() {
        let result = classify_move("Nge7", "Ne7+", &[], &[]);
        assert_eq!(result.class, MoveClass::Correct);
        assert_eq!(result.expected_normalized, "Ne7");
    }

    #[test]
    fn needed_disambiguation_is_compared() {
        let legal: Vec<String> = ["Nbd2", "Nfd2", "c4"].iter().map(|s| s.to_string()).collect();
        let alt_fail = vec!["Nfd2".to_string()];
        let class = |played| classify_move_among(played, "Nbd2", &[], &alt_fail, &legal).class;
        assert_eq!(class("Nbd2"), MoveClass::Correct);
        assert_eq!(class("Nfd2"), MoveClass::AcceptableFailing);
        assert_eq!(class("c4"), MoveClass::Wrong);

        let single = vec!["Ne7".to_string()];
        assert_eq!(classify_move_among("Ne7", "Nge7", &[], &[], &single).class, MoveClass::Correct);
    }

    #[test]
    fn mainline_wins_over_alt_sets() {
        let both = vec!["Nf3".to_string()];
        assert_eq!(classify_move("Nf3", "Nf3", &both, &both).class, MoveClass::Correct);
    }

    #[test]
    fn unparseable_input_falls_through_to_wrong() {
        let (alt, alt_fail) = sets();
        assert_eq!(classify_move("??", "Nf3", &alt, &alt_fail).class, MoveClass::Wrong);
    }

    #[test]
    fn rejected_classes_have_distinct_brushes() {
        let pairs: Vec<_> = [
            MoveClass::AcceptableNonFailing,
            MoveClass::AcceptableFailing,
            MoveClass::Wrong,
        ]
        .iter()
        .filter_map(MoveClass::brush_pair)
        .collect();
        assert_eq!(pairs.len(), 3);
        assert_ne!(pairs[0], pairs[1]);
        assert_ne!(pairs[1], pairs[2]);
        assert_eq!(MoveClass::Correct.brush_pair(), None);
    }
}
