//! Chess rules capability used by the quiz engine.

/// Position before any move.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move accepted by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// SAN as the rules engine spells it.
    pub san: String,
    /// Resulting position.
    pub fen: String,
}

/// Legality checks and FEN generation.
///
/// The quiz engine never inspects positions itself; it only forwards them.
pub trait ChessRules {
    /// Play `san` from `fen`. `None` means the move is illegal.
    fn apply(&self, fen: &str, san: &str) -> Option<AppliedMove>;

    /// Legal moves from `fen`, in SAN.
    fn legal_moves(&self, fen: &str) -> Vec<String>;
}

impl<T: ChessRules + ?Sized> ChessRules for &T {
    fn apply(&self, fen: &str, san: &str) -> Option<AppliedMove> {
        (**self).apply(fen, san)
    }

    fn legal_moves(&self, fen: &str) -> Vec<String> {
        (**self).legal_moves(fen)
    }
}
