// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Post Admission Gate Service
//!
//! Guards the scheduling API of the social dashboard:
//!
//! - Fixed-window rate limiting per client address (10 requests / 60 s default)
//! - Content sanitization
//! - Platform, schedule, and image URL validation
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and an optional
//! `.env` file):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `MAX_REQUESTS`: Requests per window per client (default: 10)
//! - `WINDOW_SECS`: Window length in seconds (default: 60)
//! - `TRUST_FORWARDED_HEADERS`: Key clients by X-Forwarded-For (default: false)
//! - `MAX_CONTENT_LENGTH`: Content limit in characters (default: 2000)
//! - `PER_PLATFORM_LIMITS`: Use per-platform limits instead (default: false)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use post_admission_gate::{
    config::{unreadable_dotenv, Config},
    handlers::{router, AppState},
    sink::AcknowledgingSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber reads RUST_LOG
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Some(err) = unreadable_dotenv(&dotenv) {
        tracing::warn!(error = %err, "Ignoring unreadable .env file");
    }

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        max_content_length = config.admission.max_content_length,
        per_platform_limits = config.admission.per_platform_limits,
        "Starting post admission gate"
    );

    let state = Arc::new(AppState::new(config.clone(), Arc::new(AcknowledgingSink))?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let cleanup_every = config.rate_limit.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_every);
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup();
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
