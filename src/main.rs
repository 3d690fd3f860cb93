// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SubTrack API Server
//!
//! Serves the SubTrack frontend: sessions, subscriptions, spending analytics,
//! profiles, receipt intake, checkout and email.

use std::sync::Arc;
use subtrack::{config::Config, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Missing backend settings are fatal
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            return Err(e.into());
        }
    };
    tracing::info!(
        port = config.port,
        backend = %config.backend_url,
        configured = config.backend_configured(),
        "Starting SubTrack API"
    );

    if !config.email_configured() {
        tracing::warn!("Email provider not configured; email features will return errors");
    }

    let state = Arc::new(AppState::from_config(config.clone())?);

    // Build router
    let app = subtrack::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("subtrack=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
