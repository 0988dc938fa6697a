// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! T-Minus API Server
//!
//! Serves journal, profile and analysis endpoints backed by Firebase
//! (Auth + Firestore) and Gemini.

use std::sync::Arc;
use tminus::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb, UserDataStore},
    services::{FirebaseAdmin, GeminiClient, IdentityProvider, TextGenerator},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        env = ?config.app_env,
        store = ?config.store_backend,
        "Starting T-Minus API"
    );

    let store: Arc<dyn UserDataStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    let identity: Arc<dyn IdentityProvider> = Arc::new(FirebaseAdmin::new(&config).await?);

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; /api/analyze will fail");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(&config));

    let state = Arc::new(AppState::new(config.clone(), store, identity, generator));

    // Build router
    let app = tminus::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tminus=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
