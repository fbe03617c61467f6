pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use repertoire_core::LevelScheduler;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub scheduler: Arc<LevelScheduler>,
}

/// Build the router with all routes
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Review routes
        .route("/api/review", get(routes::review::next_due))
        .route("/api/review/{id}", get(routes::review::extra_study))
        .route("/api/report-result", post(routes::review::report_result))
        // Home routes
        .route("/api/home-upcoming", get(routes::home::upcoming))
        // Shared move routes
        .route(
            "/api/shared-move",
            get(routes::shared_move::list).post(routes::shared_move::apply),
        )
        // Maintenance routes
        .route(
            "/api/maintenance/shift-reviews",
            post(routes::maintenance::shift_reviews),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    tracing::info!(
        levels = config.scheduler.table.max_level() + 1,
        penalty = ?config.scheduler.penalty,
        "Scheduler configured"
    );

    let state = AppState {
        db: Arc::new(db),
        scheduler: Arc::new(config.scheduler.clone()),
    };

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
