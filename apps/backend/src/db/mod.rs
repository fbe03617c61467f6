//! PostgreSQL database operations

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use repertoire_core::algorithm::{count_due, DueCounts, SchedulingResult, SpacedRepetitionAlgorithm};
use repertoire_core::{Color, Move, MoveContent, MoveTreeStore, SharedMoveKey};

use crate::error::{ApiError, Result};
use crate::models::*;

const VARIATION_COLUMNS: &str = "id, chapter_id, title, color, start_move, level, next_review, created_at";
const MOVE_COLUMNS: &str = "id, variation_id, sequence, san, fen, annotation, text, alt, alt_fail, shapes, shared_move_id";
const SHARED_MOVE_COLUMNS: &str = "id, fen, san, opening_color, annotation, text, alt, alt_fail, shapes";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Chapter Repository ===

    /// Create a chapter and return its ID
    pub async fn create_chapter(&self, title: &str, color: Color) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO chapters (title, color)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(color.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    // === Variation Repository ===

    /// Insert a variation with its moves. The variation is due immediately.
    pub async fn create_variation(&self, variation: &NewVariation) -> Result<i64> {
        let start_move = variation.start_move_column()?;
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO variations (chapter_id, title, color, start_move)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(variation.chapter_id)
        .bind(&variation.title)
        .bind(variation.color.as_str())
        .bind(start_move)
        .fetch_one(&mut *tx)
        .await?;

        for (sequence, mv) in variation.moves.iter().enumerate() {
            let sequence = i32::try_from(sequence)
                .map_err(|_| ApiError::BadRequest(format!("too many moves in {:?}", variation.title)))?;
            let content = ContentColumns::from(&mv.content);
            sqlx::query(
                r#"
                INSERT INTO moves (variation_id, sequence, san, fen, annotation, text, alt, alt_fail, shapes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(id)
            .bind(sequence)
            .bind(&mv.san)
            .bind(&mv.fen)
            .bind(content.annotation)
            .bind(content.text)
            .bind(content.alt)
            .bind(content.alt_fail)
            .bind(&content.shapes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(variation_id = id, moves = variation.moves.len(), "created variation");
        Ok(id)
    }

    /// Get variation by ID
    pub async fn get_variation(&self, variation_id: i64) -> Result<Option<DbVariation>> {
        let variation = sqlx::query_as::<_, DbVariation>(&format!(
            "SELECT {VARIATION_COLUMNS} FROM variations WHERE id = $1"
        ))
        .bind(variation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variation)
    }

    /// Earliest variation due at `now`
    pub async fn get_next_due_variation(&self, now: DateTime<Utc>) -> Result<Option<DbVariation>> {
        let variation = sqlx::query_as::<_, DbVariation>(&format!(
            r#"
            SELECT {VARIATION_COLUMNS}
            FROM variations
            WHERE next_review <= $1
            ORDER BY next_review, id
            LIMIT 1
            "#
        ))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variation)
    }

    /// Moves of the given variations, in ply order
    pub async fn get_moves(&self, variation_ids: &[i64]) -> Result<Vec<DbMove>> {
        let moves = sqlx::query_as::<_, DbMove>(&format!(
            r#"
            SELECT {MOVE_COLUMNS}
            FROM moves
            WHERE variation_id = ANY($1)
            ORDER BY variation_id, sequence
            "#
        ))
        .bind(variation_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(moves)
    }

    /// Load variations, their moves and every shared move they reference
    /// (plus `extra_shared_ids`) into a move-tree store.
    pub async fn load_store(&self, variation_ids: &[i64], extra_shared_ids: &[i64]) -> Result<MoveTreeStore> {
        let variations = sqlx::query_as::<_, DbVariation>(&format!(
            "SELECT {VARIATION_COLUMNS} FROM variations WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(variation_ids)
        .fetch_all(&self.pool)
        .await?;
        let moves = self.get_moves(variation_ids).await?;

        let mut shared_ids: Vec<i64> = moves
            .iter()
            .filter_map(|m| m.shared_move_id)
            .chain(extra_shared_ids.iter().copied())
            .collect();
        shared_ids.sort_unstable();
        shared_ids.dedup();

        let mut store = MoveTreeStore::new();
        for shared in self.get_shared_moves(&shared_ids).await? {
            store.insert_shared_move(shared.to_core()?)?;
        }

        let mut by_variation: HashMap<i64, Vec<Move>> = HashMap::new();
        for mv in &moves {
            by_variation.entry(mv.variation_id).or_default().push(mv.to_core()?);
        }
        for variation in &variations {
            let moves = by_variation.remove(&variation.id).unwrap_or_default();
            store.insert_variation(variation.to_core(moves)?)?;
        }

        Ok(store)
    }

    // === Scheduling Repository ===

    /// Level and due date of every variation matching `filter`
    pub async fn get_due_rows(&self, filter: &VariationFilter) -> Result<Vec<DbDueRow>> {
        let rows = sqlx::query_as::<_, DbDueRow>(
            r#"
            SELECT level, next_review
            FROM variations
            WHERE ($1::TEXT IS NULL OR color = $1)
              AND ($2::BIGINT IS NULL OR chapter_id = $2)
            "#,
        )
        .bind(filter.color.map(|c| c.as_str()))
        .bind(filter.chapter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Due-now and due-soon counts over all variations
    pub async fn get_due_counts(&self, now: DateTime<Utc>) -> Result<DueCounts> {
        let rows = self.get_due_rows(&VariationFilter::default()).await?;
        let states: Vec<_> = rows.iter().map(DbDueRow::review_state).collect();
        Ok(count_due(&states, now))
    }

    /// Apply a live quiz outcome: reschedule the variation and append to its
    /// history in one transaction.
    pub async fn report_result(
        &self,
        variation_id: i64,
        passed: bool,
        now: DateTime<Utc>,
        scheduler: &dyn SpacedRepetitionAlgorithm,
    ) -> Result<SchedulingResult> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, DbDueRow>(
            r#"
            SELECT level, next_review
            FROM variations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(variation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Variation {variation_id}")))?;

        let result = scheduler.schedule(&current.review_state(), passed, now);

        sqlx::query(
            r#"
            UPDATE variations
            SET level = $2, next_review = $3
            WHERE id = $1
            "#,
        )
        .bind(variation_id)
        .bind(level_to_db(result.new_state.level))
        .bind(result.new_state.due_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO quiz_results (variation_id, reviewed_at, level, passed)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(variation_id)
        .bind(now)
        .bind(level_to_db(result.previous_level))
        .bind(passed)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result)
    }

    /// Most recent quiz results for a variation
    pub async fn get_quiz_results(&self, variation_id: i64, limit: i64) -> Result<Vec<DbQuizResult>> {
        let results = sqlx::query_as::<_, DbQuizResult>(
            r#"
            SELECT id, variation_id, reviewed_at, level, passed
            FROM quiz_results
            WHERE variation_id = $1
            ORDER BY reviewed_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(variation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    /// Shift every due date by one delta so the earliest lands at
    /// `now + minutes`. Returns `None` when nothing is scheduled.
    pub async fn shift_reviews(&self, now: DateTime<Utc>, minutes: i64) -> Result<Option<(u64, Duration)>> {
        let mut tx = self.pool.begin().await?;

        let earliest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>("SELECT MIN(next_review) FROM variations")
            .fetch_one(&mut *tx)
            .await?;
        let Some(earliest) = earliest else {
            return Ok(None);
        };

        let delta = now + Duration::minutes(minutes) - earliest;
        let shifted = sqlx::query(
            r#"
            UPDATE variations
            SET next_review = next_review + make_interval(secs => $1::DOUBLE PRECISION)
            "#,
        )
        .bind(delta.num_milliseconds() as f64 / 1000.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(Some((shifted, delta)))
    }

    // === Shared Move Repository ===

    /// Get shared moves by ID
    pub async fn get_shared_moves(&self, ids: &[i64]) -> Result<Vec<DbSharedMove>> {
        let shared = sqlx::query_as::<_, DbSharedMove>(&format!(
            "SELECT {SHARED_MOVE_COLUMNS} FROM shared_moves WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(shared)
    }

    /// Shared moves registered under an identity key
    pub async fn get_shared_moves_by_key(&self, key: &SharedMoveKey) -> Result<Vec<DbSharedMove>> {
        let shared = sqlx::query_as::<_, DbSharedMove>(&format!(
            r#"
            SELECT {SHARED_MOVE_COLUMNS}
            FROM shared_moves
            WHERE fen = $1 AND san = $2 AND opening_color = $3
            ORDER BY id
            "#
        ))
        .bind(&key.fen)
        .bind(&key.san)
        .bind(key.color.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(shared)
    }

    /// Variations containing a move that matches an identity key
    pub async fn get_variation_ids_at_position(&self, key: &SharedMoveKey) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT m.variation_id
            FROM moves m
            JOIN variations v ON v.id = m.variation_id
            WHERE m.fen = $1 AND m.san = $2 AND v.color = $3
            ORDER BY m.variation_id
            "#,
        )
        .bind(&key.fen)
        .bind(&key.san)
        .bind(key.color.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Variations owning any of the given moves
    pub async fn get_variation_ids_for_moves(&self, move_ids: &[i64]) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT variation_id
            FROM moves
            WHERE id = ANY($1)
            ORDER BY variation_id
            "#,
        )
        .bind(move_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Moves linked to a shared move
    pub async fn get_move_ids_for_shared(&self, shared_move_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM moves WHERE shared_move_id = $1 ORDER BY id")
            .bind(shared_move_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    /// Replace the content of a shared move. Returns false if it does not exist.
    pub async fn update_shared_content(&self, shared_move_id: i64, content: &MoveContent) -> Result<bool> {
        let columns = ContentColumns::from(content);
        let result = sqlx::query(
            r#"
            UPDATE shared_moves
            SET annotation = $2, text = $3, alt = $4, alt_fail = $5, shapes = $6
            WHERE id = $1
            "#,
        )
        .bind(shared_move_id)
        .bind(columns.annotation)
        .bind(columns.text)
        .bind(columns.alt)
        .bind(columns.alt_fail)
        .bind(&columns.shapes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist own content and link of each move
    pub async fn save_moves(&self, moves: &[Move]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for mv in moves {
            let columns = ContentColumns::from(&mv.content);
            sqlx::query(
                r#"
                UPDATE moves
                SET annotation = $2, text = $3, alt = $4, alt_fail = $5, shapes = $6, shared_move_id = $7
                WHERE id = $1
                "#,
            )
            .bind(mv.id)
            .bind(columns.annotation)
            .bind(columns.text)
            .bind(columns.alt)
            .bind(columns.alt_fail)
            .bind(&columns.shapes)
            .bind(mv.shared_move_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Link moves to an existing shared move
    pub async fn link_moves(&self, move_ids: &[i64], shared_move_id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE moves SET shared_move_id = $2 WHERE id = ANY($1)")
            .bind(move_ids)
            .bind(shared_move_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Create a shared move and link moves to it in one transaction
    pub async fn create_shared_and_link(
        &self,
        key: &SharedMoveKey,
        content: &MoveContent,
        move_ids: &[i64],
    ) -> Result<i64> {
        let columns = ContentColumns::from(content);
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO shared_moves (fen, san, opening_color, annotation, text, alt, alt_fail, shapes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&key.fen)
        .bind(&key.san)
        .bind(key.color.as_str())
        .bind(columns.annotation)
        .bind(columns.text)
        .bind(columns.alt)
        .bind(columns.alt_fail)
        .bind(&columns.shapes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE moves SET shared_move_id = $2 WHERE id = ANY($1)")
            .bind(move_ids)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(id)
    }
}
