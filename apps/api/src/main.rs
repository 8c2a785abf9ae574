mod config;
mod errors;
mod extract;
mod generation;
mod history;
mod llm_client;
mod models;
mod render;
mod routes;
mod state;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::history::store::{HistoryStore, SCHEMA_VERSION};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("sakumon_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sakumon API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the SQLite-backed history store
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(
            config
                .database_url
                .parse::<SqliteConnectOptions>()?
                .create_if_missing(true),
        )
        .await?;
    let history = HistoryStore::new(pool);
    history.init_schema().await?;
    info!("History store ready (schema v{SCHEMA_VERSION})");

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        history,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");
    info!("ファイルアップロード対応: PDF, PNG, JPG, TXT");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
