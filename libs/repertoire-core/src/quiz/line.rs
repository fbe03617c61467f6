//! The quiz view of a variation: resolved plies and where answering starts.

use crate::error::Result;
use crate::quiz::rules::STARTING_FEN;
use crate::tree::MoveTreeStore;
use crate::types::{Color, VariationId};

/// One ply with its acceptance sets already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPly {
    pub san: String,
    /// Position after the ply.
    pub fen: String,
    pub alt: Vec<String>,
    pub alt_fail: Vec<String>,
}

impl QuizPly {
    pub fn new(san: impl Into<String>, fen: impl Into<String>) -> Self {
        Self {
            san: san.into(),
            fen: fen.into(),
            alt: Vec::new(),
            alt_fail: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizLine {
    pub variation_id: VariationId,
    pub color: Color,
    /// First ply the player answers.
    pub start_index: usize,
    pub initial_fen: String,
    pub plies: Vec<QuizPly>,
}

impl QuizLine {
    pub fn new(variation_id: VariationId, color: Color, start_index: usize, plies: Vec<QuizPly>) -> Self {
        Self {
            variation_id,
            color,
            start_index,
            initial_fen: STARTING_FEN.to_string(),
            plies,
        }
    }

    /// Build a line from the store, resolving shared content per move.
    pub fn from_store(store: &MoveTreeStore, variation_id: VariationId) -> Result<Self> {
        let variation = store.get_variation(variation_id)?;
        let plies = variation
            .moves
            .iter()
            .map(|mv| {
                let content = store.resolve_content(mv);
                QuizPly {
                    san: mv.san.clone(),
                    fen: mv.fen.clone(),
                    alt: content.alt_moves(),
                    alt_fail: content.alt_fail_moves(),
                }
            })
            .collect();
        Ok(Self::new(variation.id, variation.color, variation.start_index(), plies))
    }

    /// No move is left for the player to answer.
    pub fn is_degenerate(&self) -> bool {
        self.start_index >= self.plies.len()
    }

    /// Position before `ply` is played.
    pub fn fen_before(&self, ply: usize) -> &str {
        match ply.checked_sub(1).and_then(|prev| self.plies.get(prev)) {
            Some(prev) => &prev.fen,
            None => &self.initial_fen,
        }
    }
}
