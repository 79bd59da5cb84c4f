//! Puzzle Bot - per-chat quiz dispatcher
//!
//! Each chat moves through a small state machine: ask a puzzle, check the
//! answer, offer the next one, and start over once the round is used up.

mod api;
mod catalog;
mod config;
mod db;
mod intent;
mod reply;
mod runtime;
mod selector;
mod state_machine;
mod store;

use api::{create_router, AppState};
use catalog::PuzzleCatalog;
use config::Config;
use db::AuditDb;
use runtime::{start_audit_trail, Dispatcher};
use selector::ConfiguredRandom;
use std::net::SocketAddr;
use store::InMemoryChatStore;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "puzzle_bot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    // Puzzle catalog
    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading puzzle catalog");
            PuzzleCatalog::from_json_file(path)?
        }
        None => PuzzleCatalog::builtin(),
    };
    tracing::info!(puzzles = catalog.size(), "Puzzle catalog ready");

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening audit database");
    let audit_db = AuditDb::open(&config.db_path)?;
    let (audit_sink, _audit_writer) = start_audit_trail(audit_db.clone());

    if config.rng_seed.is_some() {
        tracing::info!(seed = ?config.rng_seed, "Using seeded puzzle order");
    }
    let dispatcher = Dispatcher::new(
        catalog,
        InMemoryChatStore::new(),
        ConfiguredRandom::from_seed(config.rng_seed),
        audit_sink,
    )?;

    let state = AppState::new(dispatcher, audit_db);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Puzzle bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
