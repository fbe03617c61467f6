//! Error types for repertoire-core.

use thiserror::Error;

use crate::types::{MoveId, SharedMoveId, VariationId};

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the move-tree store, the codecs and the scheduler policy.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("variation {0} not found")]
    VariationNotFound(VariationId),

    #[error("duplicate variation id {0}")]
    DuplicateVariation(VariationId),

    #[error("move {0} not found")]
    MoveNotFound(MoveId),

    #[error("duplicate move id {0}")]
    DuplicateMove(MoveId),

    #[error("shared move {0} not found")]
    SharedMoveNotFound(SharedMoveId),

    #[error("no moves to relink")]
    NothingToRelink,

    #[error("move {move_id} cannot use shared move {shared_move_id}: {reason}")]
    SharedMoveMismatch {
        move_id: MoveId,
        shared_move_id: SharedMoveId,
        reason: String,
    },

    #[error("invalid shapes payload: {0}")]
    InvalidShapes(String),

    #[error("invalid interval table: {0}")]
    InvalidIntervalTable(String),
}

/// Errors surfaced by a scheduler gateway to the review session.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown variation {0}")]
    UnknownVariation(VariationId),

    #[error("report failed: {0}")]
    Report(String),
}
