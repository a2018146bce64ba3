mod attendees;
mod auth;
mod config;
mod errors;
mod extract;
mod llm_client;
mod routes;
mod search;
mod state;
mod vector;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Handenheit API v{}", env!("CARGO_PKG_VERSION"));

    // One connection pool for every upstream: LLMs, embeddings, Supabase.
    let client = reqwest::Client::builder().build()?;
    let state = AppState::from_config(config.clone(), client);

    if state.store.is_none() {
        warn!("Supabase not configured; sync and vector search are disabled");
    }
    if state.embedder.is_none() {
        warn!("GOOGLE_API_KEY not set; embeddings are disabled");
    }
    if config.handenheit_password.is_none() {
        warn!("HANDENHEIT_PASSWORD not set; /api/auth will reject every login");
    }

    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
