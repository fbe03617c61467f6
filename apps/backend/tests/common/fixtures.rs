//! Test fixtures and factory functions for creating test data.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use serde_json::json;

use repertoire_backend::models::{NewMove, NewVariation};
use repertoire_core::{Color, MoveContent};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Generate a unique title to avoid collisions between test runs.
pub fn unique_title(prefix: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}_{}_{}", prefix, nanos, COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Moves for a line of SAN. The position after each ply is derived from
/// `tag` and the moves so far, so lines with the same tag and prefix
/// share positions.
pub fn line(tag: &str, sans: &[&str]) -> Vec<NewMove> {
    (0..sans.len())
        .map(|ply| NewMove {
            san: sans[ply].to_string(),
            fen: format!("{} {}", tag, sans[..=ply].join(" ")),
            content: MoveContent::default(),
        })
        .collect()
}

/// A variation starting at move 1.
pub fn new_variation(chapter_id: i64, color: Color, tag: &str, sans: &[&str]) -> NewVariation {
    NewVariation {
        chapter_id,
        title: unique_title("variation"),
        color,
        start_move: 1,
        moves: line(tag, sans),
    }
}

/// Create a report-result request body.
pub fn report_result_request(variation_id: i64, passed: bool) -> serde_json::Value {
    json!({ "variation_id": variation_id, "passed": passed })
}

/// Create a shared-move content edit request body.
pub fn edit_request(shared_move_id: i64, text: &str) -> serde_json::Value {
    json!({
        "action": "edit",
        "shared_move_id": shared_move_id,
        "content": { "text": text, "annotation": "!" }
    })
}

/// Create a shared-move detach request body.
pub fn detach_request(move_ids: &[i64]) -> serde_json::Value {
    json!({ "action": "detach", "move_ids": move_ids })
}

/// Create a shared-move relink request body.
pub fn relink_request(move_ids: &[i64], shared_move_id: Option<i64>, text: &str) -> serde_json::Value {
    json!({
        "action": "relink",
        "move_ids": move_ids,
        "shared_move_id": shared_move_id,
        "content": { "text": text, "alt": "Nc3" }
    })
}
