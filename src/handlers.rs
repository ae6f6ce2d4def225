// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the post admission service.
//!
//! Every `/api` route sits behind the per-client rate limiter. A limited
//! request is answered immediately and never reaches its handler.

use crate::admission::{admit_at, RawPostInput};
use crate::config::Config;
use crate::error::AdmissionError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::Metrics;
use crate::platform::{self, PlatformProfile};
use crate::sink::{PostSink, ScheduledPost};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub sink: Arc<dyn PostSink>,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, sink: Arc<dyn PostSink>) -> prometheus::Result<Self> {
        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            sink,
            metrics: Metrics::new()?,
            config,
        })
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Successful scheduling response.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub message: &'static str,
    pub data: ScheduledPost,
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
                code: self.code(),
                retry_after_secs: None,
            }),
        )
            .into_response()
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/schedule", post(schedule_post))
        .route("/api/platforms", get(platforms))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .merge(api);

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(security_header(header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .layer(security_header(header::X_FRAME_OPTIONS, "DENY"))
        .layer(security_header(
            header::REFERRER_POLICY,
            "strict-origin-when-cross-origin",
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn security_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Rate limit key for a request. The peer address, unless forwarding
/// headers are trusted: then the first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    let forwarded = || {
        let first_hop = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        first_hop.or(real_ip).map(str::to_string)
    };

    trust_forwarded
        .then(forwarded)
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-client fixed-window gate in front of the API routes.
pub async fn rate_limit(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(
        request.headers(),
        peer,
        state.config.rate_limit.trust_forwarded_headers,
    );

    match state.limiter.check(&key) {
        RateLimitResult::Allowed { remaining, .. } => {
            debug!(client = %key, remaining, "Request allowed");
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        RateLimitResult::Limited { retry_after } => {
            let retry_secs = ceil_secs(retry_after);
            warn!(client = %key, retry_after_secs = retry_secs, "Request rate limited");
            state.metrics.record_rate_limited();
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(ErrorResponse {
                    error: AdmissionError::RateLimited.to_string(),
                    code: AdmissionError::RateLimited.code(),
                    retry_after_secs: Some(retry_secs),
                }),
            )
                .into_response()
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "post-admission-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Platform limits and posting hints for the scheduling form.
pub async fn platforms() -> Json<&'static [PlatformProfile]> {
    Json(platform::profiles())
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Admit a post submission and hand it to the sink.
pub async fn schedule_post(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RawPostInput>, JsonRejection>,
) -> Response {
    let Json(raw) = match body {
        Ok(body) => body,
        Err(rejection) => {
            info!(error = %rejection, "Unreadable submission body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Invalid input".to_string(),
                    code: "INVALID_BODY",
                    retry_after_secs: None,
                }),
            )
                .into_response();
        }
    };

    let admission = &state.config.admission;
    let limit = admission.content_limit_for(raw.platform.as_deref());
    let post = match admit_at(&raw, limit, Utc::now(), admission.max_schedule_horizon_months) {
        Ok(post) => post,
        Err(err) => {
            info!(code = err.code(), error = %err, "Submission rejected");
            state.metrics.record_rejected(&err);
            return err.into_response();
        }
    };

    match state.sink.schedule(post) {
        Ok(scheduled) => {
            info!(id = %scheduled.id, platform = %scheduled.platform, "Post scheduled");
            state.metrics.record_admitted();
            (
                StatusCode::CREATED,
                Json(ScheduleResponse {
                    message: "Post scheduled successfully",
                    data: scheduled,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!(error = %err, "Failed to schedule post");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to schedule post".to_string(),
                    code: "INTERNAL",
                    retry_after_secs: None,
                }),
            )
                .into_response()
        }
    }
}
