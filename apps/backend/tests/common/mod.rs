//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating chapters and variations
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};

use repertoire_backend::db::Database;
use repertoire_backend::models::DbMove;
use repertoire_backend::AppState;
use repertoire_core::{Color, LevelScheduler};

/// Test context containing database connection and router.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context with the default scheduler.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);
        let state = AppState {
            db: db.clone(),
            scheduler: Arc::new(LevelScheduler::default()),
        };

        Self {
            db,
            app: repertoire_backend::app(state),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test chapter and return its ID.
    pub async fn create_chapter(&self, color: Color) -> i64 {
        self.db
            .create_chapter(&fixtures::unique_title("chapter"), color)
            .await
            .expect("Failed to create test chapter")
    }

    /// Create a variation from a list of SAN moves and return its ID.
    pub async fn create_variation(&self, chapter_id: i64, color: Color, tag: &str, sans: &[&str]) -> i64 {
        let variation = fixtures::new_variation(chapter_id, color, tag, sans);
        self.db
            .create_variation(&variation)
            .await
            .expect("Failed to create test variation")
    }

    /// Moves of a variation in ply order.
    pub async fn moves(&self, variation_id: i64) -> Vec<DbMove> {
        self.db
            .get_moves(&[variation_id])
            .await
            .expect("Failed to load moves")
    }

    /// Overwrite a variation's schedule.
    pub async fn set_schedule(&self, variation_id: i64, level: i32, next_review: DateTime<Utc>) {
        sqlx::query("UPDATE variations SET level = $2, next_review = $3 WHERE id = $1")
            .bind(variation_id)
            .bind(level)
            .bind(next_review)
            .execute(self.db.pool())
            .await
            .expect("Failed to update schedule");
    }

    /// Clean up test data for a chapter.
    ///
    /// Call this after tests to remove test data.
    pub async fn cleanup_chapter(&self, chapter_id: i64) {
        // Shared moves are only reachable through the chapter's moves
        let _ = sqlx::query(
            r#"
            DELETE FROM shared_moves WHERE id IN (
                SELECT m.shared_move_id
                FROM moves m
                JOIN variations v ON v.id = m.variation_id
                WHERE v.chapter_id = $1 AND m.shared_move_id IS NOT NULL
            )
            "#,
        )
        .bind(chapter_id)
        .execute(self.db.pool())
        .await;

        // Variations, moves and quiz results cascade
        let _ = sqlx::query("DELETE FROM chapters WHERE id = $1")
            .bind(chapter_id)
            .execute(self.db.pool())
            .await;
    }
}
