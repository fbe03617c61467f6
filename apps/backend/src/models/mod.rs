//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use repertoire_core::notation::{self, ANNOTATIONS};
use repertoire_core::shapes::{self, parse_shapes, serialize_shapes, Shape};
use repertoire_core::{
    Color, CoreError, Move, MoveContent, MoveTreeStore, QuizResult, ReviewState, SharedMove, SharedMoveKey,
    Variation,
};

use crate::error::{ApiError, Result};

// Re-export the collaborator contract from repertoire-core
pub use repertoire_core::{HomeUpcoming, ReportResultRequest, ReportResultResponse};

fn parse_color(raw: &str) -> Result<Color> {
    Color::from_str(raw).ok_or_else(|| ApiError::Parse(format!("unknown color {raw:?}")))
}

fn level_from_db(level: i32) -> u32 {
    u32::try_from(level).unwrap_or(0)
}

pub fn level_to_db(level: u32) -> i32 {
    i32::try_from(level).unwrap_or(i32::MAX)
}

// === Database Entity Types ===

/// Variation stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbVariation {
    pub id: i64,
    pub chapter_id: i64,
    pub title: String,
    pub color: String,
    pub start_move: i32,
    pub level: i32,
    pub next_review: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl DbVariation {
    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            level: level_from_db(self.level),
            due_at: self.next_review,
        }
    }

    /// Convert to a core variation owning `moves`
    pub fn to_core(&self, moves: Vec<Move>) -> Result<Variation> {
        Ok(Variation {
            id: self.id,
            title: self.title.clone(),
            chapter_id: self.chapter_id,
            color: parse_color(&self.color)?,
            start_move: u32::try_from(self.start_move).unwrap_or(1),
            moves,
            review: self.review_state(),
        })
    }
}

/// Move stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMove {
    pub id: i64,
    pub variation_id: i64,
    pub sequence: i32,
    pub san: String,
    pub fen: String,
    pub annotation: String,
    pub text: String,
    pub alt: String,
    pub alt_fail: String,
    pub shapes: String,
    pub shared_move_id: Option<i64>,
}

impl DbMove {
    /// Convert to core move
    pub fn to_core(&self) -> Result<Move> {
        let content = MoveContent {
            annotation: self.annotation.clone(),
            text: self.text.clone(),
            alt: self.alt.clone(),
            alt_fail: self.alt_fail.clone(),
            shapes: parse_shapes(Some(self.shapes.as_str()))?,
        };
        let mut mv = Move::new(
            self.id,
            usize::try_from(self.sequence).unwrap_or(0),
            self.san.clone(),
            self.fen.clone(),
        )
        .with_content(content);
        mv.shared_move_id = self.shared_move_id;
        Ok(mv)
    }
}

/// Shared move content stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSharedMove {
    pub id: i64,
    pub fen: String,
    pub san: String,
    pub opening_color: String,
    pub annotation: String,
    pub text: String,
    pub alt: String,
    pub alt_fail: String,
    pub shapes: String,
}

impl DbSharedMove {
    /// Convert to core shared move
    pub fn to_core(&self) -> Result<SharedMove> {
        let key = SharedMoveKey::new(self.fen.clone(), self.san.clone(), parse_color(&self.opening_color)?);
        let content = MoveContent {
            annotation: self.annotation.clone(),
            text: self.text.clone(),
            alt: self.alt.clone(),
            alt_fail: self.alt_fail.clone(),
            shapes: parse_shapes(Some(self.shapes.as_str()))?,
        };
        Ok(SharedMove::new(self.id, key, content))
    }
}

/// Quiz result history row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuizResult {
    pub id: i64,
    pub variation_id: i64,
    pub reviewed_at: DateTime<Utc>,
    pub level: i32,
    pub passed: bool,
}

impl DbQuizResult {
    pub fn to_core(&self) -> QuizResult {
        QuizResult {
            variation_id: self.variation_id,
            reviewed_at: self.reviewed_at,
            level: level_from_db(self.level),
            passed: self.passed,
        }
    }
}

/// Level and due date of one variation, for the home summaries
#[derive(Debug, Clone, FromRow)]
pub struct DbDueRow {
    pub level: i32,
    pub next_review: DateTime<Utc>,
}

impl DbDueRow {
    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            level: level_from_db(self.level),
            due_at: self.next_review,
        }
    }
}

/// Optional color / chapter restriction on variation queries
#[derive(Debug, Clone, Default)]
pub struct VariationFilter {
    pub color: Option<Color>,
    pub chapter_id: Option<i64>,
}

// === Variation Input Types ===

/// A variation to insert, with its moves in ply order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVariation {
    pub chapter_id: i64,
    pub title: String,
    pub color: Color,
    #[serde(default = "default_start_move")]
    pub start_move: u32,
    pub moves: Vec<NewMove>,
}

fn default_start_move() -> u32 {
    1
}

impl NewVariation {
    /// `start_move` as stored. Must be a full-move number of at least 1.
    pub fn start_move_column(&self) -> Result<i32> {
        match i32::try_from(self.start_move) {
            Ok(start_move) if start_move >= 1 => Ok(start_move),
            _ => Err(ApiError::BadRequest(format!(
                "start_move {} is out of range",
                self.start_move
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMove {
    pub san: String,
    pub fen: String,
    #[serde(flatten)]
    pub content: MoveContent,
}

/// Column values for a move's content
pub struct ContentColumns<'a> {
    pub annotation: &'a str,
    pub text: &'a str,
    pub alt: &'a str,
    pub alt_fail: &'a str,
    pub shapes: String,
}

impl<'a> From<&'a MoveContent> for ContentColumns<'a> {
    fn from(content: &'a MoveContent) -> Self {
        Self {
            annotation: &content.annotation,
            text: &content.text,
            alt: &content.alt,
            alt_fail: &content.alt_fail,
            shapes: serialize_shapes(&content.shapes),
        }
    }
}

// === API Request/Response Types ===

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HomeUpcomingQuery {
    pub color: Option<String>,
    pub chapter_id: Option<i64>,
}

impl HomeUpcomingQuery {
    pub fn filter(&self) -> Result<VariationFilter> {
        Ok(VariationFilter {
            color: self.color.as_deref().map(parse_color).transpose()?,
            chapter_id: self.chapter_id,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationOption {
    pub glyph: String,
    pub label: String,
}

pub fn annotation_options() -> Vec<AnnotationOption> {
    ANNOTATIONS
        .iter()
        .map(|(glyph, label)| AnnotationOption {
            glyph: (*glyph).to_string(),
            label: (*label).to_string(),
        })
        .collect()
}

/// A move as served to the quiz, with shared content already resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMove {
    pub san: String,
    pub fen: String,
    pub move_verbose: String,
    pub annotation: String,
    pub text: String,
    pub alt: String,
    pub alt_fail: String,
    #[serde(with = "shapes::as_string")]
    pub shapes: Vec<Shape>,
    pub shared_move_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewVariation {
    pub variation_id: i64,
    pub title: String,
    pub chapter_id: i64,
    pub color: Color,
    pub start_index: usize,
    pub level: u32,
    pub mainline: String,
    pub moves: Vec<ReviewMove>,
}

impl ReviewVariation {
    pub fn from_store(store: &MoveTreeStore, variation_id: i64) -> std::result::Result<Self, CoreError> {
        let variation = store.get_variation(variation_id)?;
        let moves = variation
            .moves
            .iter()
            .map(|mv| {
                let content = store.resolve_content(mv);
                ReviewMove {
                    san: mv.san.clone(),
                    fen: mv.fen.clone(),
                    move_verbose: notation::move_verbose(mv.sequence, &mv.san, &content.annotation),
                    annotation: content.annotation.clone(),
                    text: content.text.clone(),
                    alt: content.alt.clone(),
                    alt_fail: content.alt_fail.clone(),
                    shapes: content.shapes.clone(),
                    shared_move_id: mv.shared_move_id,
                }
            })
            .collect();

        Ok(Self {
            variation_id: variation.id,
            title: variation.title.clone(),
            chapter_id: variation.chapter_id,
            color: variation.color,
            start_index: variation.start_index(),
            level: variation.review.level,
            mainline: variation.mainline(),
            moves,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewResponse {
    /// `None` when nothing is due.
    pub variation: Option<ReviewVariation>,
    pub extra_study: bool,
    pub total_due_now: usize,
    pub total_due_soon: usize,
    /// Live review history of the served variation, newest first.
    pub history: Vec<QuizResult>,
    pub annotations: Vec<AnnotationOption>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedMoveQuery {
    pub fen: String,
    pub san: String,
    pub color: String,
}

impl SharedMoveQuery {
    pub fn key(&self) -> Result<SharedMoveKey> {
        Ok(SharedMoveKey::new(self.fen.clone(), self.san.clone(), parse_color(&self.color)?))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedMoveInfo {
    pub id: i64,
    #[serde(flatten)]
    pub content: MoveContent,
    pub move_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionMove {
    pub move_id: i64,
    pub variation_id: i64,
    pub variation_title: String,
    pub move_verbose: String,
    pub shared_move_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedMoveListResponse {
    pub candidates: Vec<SharedMoveInfo>,
    pub moves: Vec<PositionMove>,
}

/// One of the three shared-move edits
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SharedMoveEdit {
    /// Replace the content of one shared move
    Edit {
        shared_move_id: i64,
        content: MoveContent,
    },
    /// Detach moves, copying the shared content back onto each move
    Detach { move_ids: Vec<i64> },
    /// Point moves at an existing shared move, or at a new one with `content`
    Relink {
        move_ids: Vec<i64>,
        shared_move_id: Option<i64>,
        #[serde(default)]
        content: MoveContent,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedMoveEditResponse {
    pub shared_move_id: Option<i64>,
    pub move_ids: Vec<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShiftReviewsRequest {
    pub minutes: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShiftReviewsResponse {
    pub shifted: u64,
    pub delta_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use repertoire_core::shapes::Brush;

    fn db_variation() -> DbVariation {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        DbVariation {
            id: 7,
            chapter_id: 2,
            title: "Sicilian".to_string(),
            color: "black".to_string(),
            start_move: 1,
            level: 3,
            next_review: at,
            created_at: at,
        }
    }

    fn db_move(id: i64, sequence: i32, san: &str) -> DbMove {
        DbMove {
            id,
            variation_id: 7,
            sequence,
            san: san.to_string(),
            fen: format!("fen-{id}"),
            annotation: String::new(),
            text: String::new(),
            alt: String::new(),
            alt_fail: String::new(),
            shapes: String::new(),
            shared_move_id: None,
        }
    }

    #[test]
    fn test_review_variation_resolves_shared_content() {
        let shared = DbSharedMove {
            id: 11,
            fen: "fen-2".to_string(),
            san: "c5".to_string(),
            opening_color: "black".to_string(),
            annotation: "!".to_string(),
            text: "The Sicilian".to_string(),
            alt: "e5".to_string(),
            alt_fail: String::new(),
            shapes: r#"[{"orig":"c7","dest":"c5","brush":"green"}]"#.to_string(),
        };
        let mut reply = db_move(2, 1, "c5");
        reply.shared_move_id = Some(11);

        let mut store = MoveTreeStore::new();
        store.insert_shared_move(shared.to_core().unwrap()).unwrap();
        let moves = vec![db_move(1, 0, "e4").to_core().unwrap(), reply.to_core().unwrap()];
        store.insert_variation(db_variation().to_core(moves).unwrap()).unwrap();

        let review = ReviewVariation::from_store(&store, 7).unwrap();
        assert_eq!(review.start_index, 1);
        assert_eq!(review.level, 3);
        assert_eq!(review.mainline, "1.e4 c5");
        assert_eq!(review.moves[1].move_verbose, "1...c5!");
        assert_eq!(review.moves[1].text, "The Sicilian");
        assert_eq!(review.moves[1].shapes, vec![Shape::arrow("c7", "c5", Brush::Green)]);

        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["moves"][0]["shapes"], "");
        assert_eq!(json["color"], "black");
    }

    #[test]
    fn test_bad_color_is_parse_error() {
        let mut variation = db_variation();
        variation.color = "green".to_string();
        assert!(matches!(variation.to_core(Vec::new()), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_bad_shapes_are_rejected() {
        let mut mv = db_move(1, 0, "e4");
        mv.shapes = "not json".to_string();
        assert!(matches!(mv.to_core(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_shared_move_edit_deserializes() {
        let edit: SharedMoveEdit = serde_json::from_str(r#"{"action":"relink","move_ids":[1,2],"shared_move_id":null}"#).unwrap();
        match edit {
            SharedMoveEdit::Relink {
                move_ids,
                shared_move_id,
                content,
            } => {
                assert_eq!(move_ids, vec![1, 2]);
                assert_eq!(shared_move_id, None);
                assert_eq!(content, MoveContent::default());
            }
            other => panic!("unexpected edit {other:?}"),
        }
    }

    #[test]
    fn test_start_move_column_range() {
        let mut variation = NewVariation {
            chapter_id: 1,
            title: "Caro-Kann".to_string(),
            color: Color::Black,
            start_move: 3,
            moves: Vec::new(),
        };
        assert_eq!(variation.start_move_column().unwrap(), 3);

        variation.start_move = 0;
        assert!(matches!(variation.start_move_column(), Err(ApiError::BadRequest(_))));

        variation.start_move = u32::MAX;
        assert!(matches!(variation.start_move_column(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_home_query_filter() {
        let query = HomeUpcomingQuery {
            color: Some("white".to_string()),
            chapter_id: Some(3),
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.color, Some(Color::White));
        assert_eq!(filter.chapter_id, Some(3));
        assert!(HomeUpcomingQuery {
            color: Some("red".to_string()),
            chapter_id: None
        }
        .filter()
        .is_err());
    }

    #[test]
    fn test_annotation_options_start_with_none() {
        let options = annotation_options();
        assert_eq!(options[0].glyph, "");
        assert_eq!(options.len(), ANNOTATIONS.len());
    }
}
