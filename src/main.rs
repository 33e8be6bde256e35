// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fashion-Auth API Server
//!
//! Exchanges identity provider tokens for session tokens used by the
//! fashion recommendation frontend.

use fashion_auth::{config::Config, services::IdentityVerifier, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        environment = ?config.environment,
        "Starting Fashion-Auth API"
    );

    let identity_verifier = Arc::new(IdentityVerifier::new(&config)?);

    if !identity_verifier.is_configured() {
        tracing::warn!(
            "Neither FIREBASE_PROJECT_ID nor GOOGLE_CLIENT_ID is set; \
             identity token verification will fail"
        );
        if config.allow_unverified_identity_tokens {
            tracing::warn!(
                "ALLOW_UNVERIFIED_IDENTITY_TOKENS is enabled: identity tokens will be accepted \
                 WITHOUT signature verification"
            );
        }
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        identity_verifier,
    });

    // Build router
    let app = fashion_auth::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fashion_auth=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
