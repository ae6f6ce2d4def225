// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Serverless submission path.
//!
//! Reads one post submission as JSON on stdin, applies the client-side
//! throttle and admission, and writes the outcome as JSON on stdout.
//! Exits 0 when the post is accepted, 1 when it is rejected, and 2 when the
//! throttle refuses the call.
//!
//! - `THROTTLE_KEY`: throttle bucket (default: schedule_post)
//! - `THROTTLE_STATE_PATH`: durable throttle state; unset disables throttling

use anyhow::Context;
use serde_json::json;
use std::io::Read;
use std::process::ExitCode;
use tracing::{debug, warn, Level};
use tracing_subscriber::EnvFilter;

use post_admission_gate::{
    admission::{admit_at, RawPostInput},
    config::{unreadable_dotenv, Config},
    error::AdmissionError,
    sink::{AcknowledgingSink, PostSink},
    throttle::ClientThrottle,
};

fn main() -> anyhow::Result<ExitCode> {
    // Load .env before the subscriber reads RUST_LOG
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::WARN.into())
                .from_env_lossy(),
        )
        .init();

    if let Some(err) = unreadable_dotenv(&dotenv) {
        warn!(error = %err, "Ignoring unreadable .env file");
    }

    let config = Config::from_env();
    let key = std::env::var("THROTTLE_KEY").unwrap_or_else(|_| "schedule_post".to_string());

    let throttle = ClientThrottle::new(&config.throttle);
    debug!(key = %key, persistent = throttle.is_persistent(), "Throttle ready");
    let allowed = throttle.allow(&key);
    throttle.purge_expired();
    if !allowed {
        print_error(&AdmissionError::RateLimited);
        return Ok(ExitCode::from(2));
    }

    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("reading submission from stdin")?;
    let raw: RawPostInput = match serde_json::from_str(&body) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(error = %err, "Unreadable submission");
            println!("{}", json!({ "error": "Invalid input", "code": "INVALID_BODY" }));
            return Ok(ExitCode::from(1));
        }
    };

    let admission = &config.admission;
    let limit = admission.content_limit_for(raw.platform.as_deref());
    match admit_at(
        &raw,
        limit,
        chrono::Utc::now(),
        admission.max_schedule_horizon_months,
    ) {
        Ok(post) => {
            let scheduled = AcknowledgingSink.schedule(post)?;
            println!(
                "{}",
                json!({ "message": "Post scheduled successfully", "data": scheduled })
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_error(&err);
            Ok(ExitCode::from(1))
        }
    }
}

fn print_error(err: &AdmissionError) {
    println!("{}", json!({ "error": err.to_string(), "code": err.code() }));
}
