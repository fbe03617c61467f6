//! Maintenance API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::json;

use common::fixtures;
use common::TestContext;
use repertoire_core::Color;

/// Test shifting reviews keeps relative spacing.
#[tokio::test]
#[ignore = "requires database"]
async fn test_shift_reviews_keeps_spacing() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let chapter_id = ctx.create_chapter(Color::White).await;
    let tag = fixtures::unique_title("queens_gambit");
    let first = ctx
        .create_variation(chapter_id, Color::White, &tag, &["d4", "d5", "c4"])
        .await;
    let second = ctx
        .create_variation(chapter_id, Color::White, &tag, &["d4", "Nf6", "c4"])
        .await;
    let now = Utc::now();
    ctx.set_schedule(first, 1, now + Duration::hours(1)).await;
    ctx.set_schedule(second, 3, now + Duration::hours(5)).await;

    let response = server
        .post("/api/maintenance/shift-reviews")
        .json(&json!({ "minutes": 30 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["shifted"].as_u64().unwrap() >= 2);

    let first = ctx.db.get_variation(first).await.unwrap().unwrap();
    let second = ctx.db.get_variation(second).await.unwrap().unwrap();
    let gap = second.next_review - first.next_review;
    assert!((gap - Duration::hours(4)).num_milliseconds().abs() < 5);

    // Cleanup
    ctx.cleanup_chapter(chapter_id).await;
}

/// Test negative minutes are rejected.
#[tokio::test]
#[ignore = "requires database"]
async fn test_shift_reviews_rejects_negative_minutes() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/maintenance/shift-reviews")
        .json(&json!({ "minutes": -5 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
