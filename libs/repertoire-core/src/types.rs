//! Core types for the repertoire trainer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notation;
use crate::shapes::{self, Shape};

pub type VariationId = i64;
pub type MoveId = i64;
pub type SharedMoveId = i64;
pub type ChapterId = i64;

/// Side of the board a repertoire is drilled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Get the color name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "white" => Some(Self::White),
            "black" => Some(Self::Black),
            _ => None,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Color that plays the ply at a 0-based index from the initial position.
    pub fn of_ply(ply: usize) -> Self {
        if ply % 2 == 0 {
            Self::White
        } else {
            Self::Black
        }
    }
}

/// Per-variation review state. Only the scheduler produces new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    pub level: u32,
    pub due_at: DateTime<Utc>,
}

impl ReviewState {
    /// State of a variation that has never been reviewed: level 0, due immediately.
    pub fn unreviewed(now: DateTime<Utc>) -> Self {
        Self { level: 0, due_at: now }
    }
}

/// Editable content attached to a move, either owned or shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveContent {
    #[serde(default)]
    pub annotation: String,
    #[serde(default)]
    pub text: String,
    /// Raw comma/whitespace separated SAN list of non-failing alternatives.
    #[serde(default)]
    pub alt: String,
    /// Raw comma/whitespace separated SAN list of alternatives that still fail the quiz.
    #[serde(default)]
    pub alt_fail: String,
    #[serde(default, with = "shapes::as_string")]
    pub shapes: Vec<Shape>,
}

impl MoveContent {
    pub fn alt_moves(&self) -> Vec<String> {
        notation::parse_san_list(&self.alt)
    }

    pub fn alt_fail_moves(&self) -> Vec<String> {
        notation::parse_san_list(&self.alt_fail)
    }
}

/// A single ply inside a variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub id: MoveId,
    /// 0-based ply index inside the variation.
    pub sequence: usize,
    pub san: String,
    /// Position after this move.
    pub fen: String,
    #[serde(flatten)]
    pub content: MoveContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_move_id: Option<SharedMoveId>,
}

impl Move {
    pub fn new(id: MoveId, sequence: usize, san: impl Into<String>, fen: impl Into<String>) -> Self {
        Self {
            id,
            sequence,
            san: san.into(),
            fen: fen.into(),
            content: MoveContent::default(),
            shared_move_id: None,
        }
    }

    pub fn with_content(mut self, content: MoveContent) -> Self {
        self.content = content;
        self
    }

    pub fn mover(&self) -> Color {
        Color::of_ply(self.sequence)
    }

    pub fn move_number(&self) -> u32 {
        notation::move_number(self.sequence)
    }
}

/// Identity of a shared move. Never changes once the shared move exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SharedMoveKey {
    /// Position the move is played into.
    pub fen: String,
    pub san: String,
    /// Repertoire color of the variations that may share this content.
    pub color: Color,
}

impl SharedMoveKey {
    pub fn new(fen: impl Into<String>, san: impl Into<String>, color: Color) -> Self {
        Self {
            fen: fen.into(),
            san: san.into(),
            color,
        }
    }
}

/// Deduplicated content shared by transposing moves across variations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedMove {
    id: SharedMoveId,
    key: SharedMoveKey,
    pub content: MoveContent,
}

impl SharedMove {
    pub fn new(id: SharedMoveId, key: SharedMoveKey, content: MoveContent) -> Self {
        Self { id, key, content }
    }

    pub fn id(&self) -> SharedMoveId {
        self.id
    }

    pub fn key(&self) -> &SharedMoveKey {
        &self.key
    }
}

/// A drilled line of moves belonging to a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub id: VariationId,
    pub title: String,
    pub chapter_id: ChapterId,
    pub color: Color,
    /// Full-move number at which the player starts answering.
    pub start_move: u32,
    pub moves: Vec<Move>,
    pub review: ReviewState,
}

impl Variation {
    /// 0-based ply index of the first move the player must supply.
    pub fn start_index(&self) -> usize {
        notation::start_index(self.start_move, self.color)
    }

    /// Mainline in move-number notation, e.g. `1.e4 e5 2.Nf3`.
    pub fn mainline(&self) -> String {
        notation::mainline(self.moves.iter().map(|m| m.san.as_str()))
    }

    pub fn shared_key_for(&self, mv: &Move) -> SharedMoveKey {
        SharedMoveKey::new(mv.fen.clone(), mv.san.clone(), self.color)
    }
}

/// A recorded live review outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub variation_id: VariationId,
    pub reviewed_at: DateTime<Utc>,
    /// Level before the review was applied.
    pub level: u32,
    pub passed: bool,
}

// === Collaborator contract ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResultRequest {
    pub variation_id: VariationId,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResultResponse {
    pub status: String,
    pub total_due_now: usize,
    pub total_due_soon: usize,
}

impl ReportResultResponse {
    pub fn success(total_due_now: usize, total_due_soon: usize) -> Self {
        Self {
            status: "success".to_string(),
            total_due_now,
            total_due_soon,
        }
    }
}

/// Summary of the next review, as shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextDue {
    pub has_due_now: bool,
    pub seconds_until: Option<i64>,
    pub label: String,
}

/// Cumulative number of variations due before a horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingBucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: u32,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeUpcoming {
    pub next_due: NextDue,
    pub upcoming: Vec<UpcomingBucket>,
    #[serde(default)]
    pub levels: Vec<LevelCount>,
}
