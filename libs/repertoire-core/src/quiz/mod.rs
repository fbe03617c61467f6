//! Quiz session engine and its collaborators.

pub mod engine;
pub mod ledger;
pub mod line;
pub mod rules;
pub mod timer;

pub use engine::{
    LoadKind, QuizEffect, QuizEngine, QuizEvent, QuizOutcome, QuizSession, QuizState, QuizTiming,
};
pub use ledger::ReportLedger;
pub use line::{QuizLine, QuizPly};
pub use rules::{AppliedMove, ChessRules, STARTING_FEN};
pub use timer::{TimerAction, TimerHandle};
