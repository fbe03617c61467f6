//! Core library for the opening repertoire trainer.
//!
//! Provides:
//! - Move-tree store with deduplicated shared move content
//! - Level-based spaced repetition scheduler
//! - Quiz session engine (an explicit state machine over one variation)
//! - Review session aggregator with due counts and countdowns
//! - SAN normalization, alt-list parsing and the shapes codec

pub mod algorithm;
pub mod error;
pub mod matching;
pub mod notation;
pub mod planner;
pub mod quiz;
pub mod session;
pub mod shapes;
pub mod tree;
pub mod types;

pub use algorithm::{
    count_due, soon_horizon, DueCounts, FailPenalty, IntervalTable, LevelScheduler, SchedulingResult,
    SpacedRepetitionAlgorithm,
};
pub use error::{CoreError, GatewayError, Result};
pub use matching::{classify_move, MatchResult, MoveClass};
pub use notation::{normalize_san, parse_san_list};
pub use planner::NextDueDisplay;
pub use quiz::{
    ChessRules, LoadKind, QuizEffect, QuizEngine, QuizEvent, QuizLine, QuizOutcome, QuizState, QuizTiming,
    ReportLedger,
};
pub use session::{LocalGateway, ReviewSession, ReviewSessionCounters, SchedulerGateway, SessionSettings};
pub use shapes::{Brush, Shape};
pub use tree::{MoveTreeStore, RelinkTarget};
pub use types::{
    Color, HomeUpcoming, LevelCount, Move, MoveContent, NextDue, QuizResult, ReportResultRequest,
    ReportResultResponse, ReviewState, SharedMove, SharedMoveKey, UpcomingBucket, Variation,
};
