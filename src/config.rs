// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the post admission gate.
//!
//! Every field has a serde default; [`Config::from_env`] overlays
//! environment variables on top of those defaults.

use crate::platform;
use crate::schedule::DEFAULT_HORIZON_MONTHS;
use crate::validator::Platform;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the post admission service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server-side rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Client-side throttle for the serverless path
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Post admission limits
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server-side fixed-window limits, per client address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window (default: 10)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often closed windows are purged, in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` instead of the peer
    /// address. Only safe behind a proxy that sets them (default: false)
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

/// Client-side throttle limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Maximum requests per window (default: 10)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in milliseconds (default: 30000)
    #[serde(default = "default_throttle_window_ms")]
    pub window_ms: u64,

    /// Durable state file. Unset means no storage, and the throttle allows
    /// every call.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

/// Limits applied to submitted posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum content length in characters (default: 2000)
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Use each platform's own character limit instead (default: false)
    #[serde(default)]
    pub per_platform_limits: bool,

    /// How far ahead a post may be scheduled, in months (default: 12)
    #[serde(default = "default_horizon_months")]
    pub max_schedule_horizon_months: u32,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_throttle_window_ms() -> u64 {
    30_000
}

fn default_max_content_length() -> usize {
    2000
}

fn default_horizon_months() -> u32 {
    DEFAULT_HORIZON_MONTHS
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            throttle: ThrottleConfig::default(),
            admission: AdmissionConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            trust_forwarded_headers: false,
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_throttle_window_ms(),
            state_path: None,
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
            per_platform_limits: false,
            max_schedule_horizon_months: default_horizon_months(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl ThrottleConfig {
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl AdmissionConfig {
    /// Content limit for a submission naming `platform`.
    pub fn content_limit_for(&self, platform: Option<&str>) -> usize {
        if !self.per_platform_limits {
            return self.max_content_length;
        }
        platform
            .and_then(|name| name.parse::<Platform>().ok())
            .map(|p| platform::profile(p).max_content_length)
            .unwrap_or(self.max_content_length)
    }
}

impl Config {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`. Values that fail to
    /// parse keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        override_with(&mut config.rate_limit.max_requests, parsed_value(&lookup, "MAX_REQUESTS"));
        override_with(&mut config.rate_limit.window_secs, parsed_value(&lookup, "WINDOW_SECS"));
        override_with(
            &mut config.rate_limit.cleanup_interval_secs,
            parsed_value(&lookup, "CLEANUP_INTERVAL_SECS"),
        );
        override_with(
            &mut config.rate_limit.trust_forwarded_headers,
            parsed_value(&lookup, "TRUST_FORWARDED_HEADERS"),
        );
        override_with(
            &mut config.admission.max_content_length,
            parsed_value(&lookup, "MAX_CONTENT_LENGTH"),
        );
        override_with(
            &mut config.admission.per_platform_limits,
            parsed_value(&lookup, "PER_PLATFORM_LIMITS"),
        );
        override_with(
            &mut config.admission.max_schedule_horizon_months,
            parsed_value(&lookup, "MAX_SCHEDULE_HORIZON_MONTHS"),
        );
        override_with(
            &mut config.throttle.max_requests,
            parsed_value(&lookup, "THROTTLE_MAX_REQUESTS"),
        );
        override_with(&mut config.throttle.window_ms, parsed_value(&lookup, "THROTTLE_WINDOW_MS"));
        if let Some(path) = lookup("THROTTLE_STATE_PATH").filter(|p| !p.trim().is_empty()) {
            config.throttle.state_path = Some(PathBuf::from(path));
        }
        override_with(&mut config.metrics.enabled, parsed_value(&lookup, "METRICS_ENABLED"));

        config
    }
}

/// The error from loading `.env`, unless the file simply does not exist.
pub fn unreadable_dotenv(result: &dotenvy::Result<PathBuf>) -> Option<&dotenvy::Error> {
    result.as_ref().err().filter(|err| !err.not_found())
}

fn parsed_value<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
