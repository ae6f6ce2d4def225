// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for admission outcomes.

use crate::error::AdmissionError;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters registered on a private registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    admitted: IntCounter,
    rejected: IntCounterVec,
    rate_limited: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let admitted = IntCounter::new("posts_admitted_total", "Posts accepted for scheduling")?;
        let rejected = IntCounterVec::new(
            Opts::new("posts_rejected_total", "Posts rejected by admission"),
            &["code"],
        )?;
        let rate_limited = IntCounter::new(
            "requests_rate_limited_total",
            "Requests refused by the rate limiter",
        )?;

        registry.register(Box::new(admitted.clone()))?;
        registry.register(Box::new(rejected.clone()))?;
        registry.register(Box::new(rate_limited.clone()))?;

        Ok(Self {
            registry,
            admitted,
            rejected,
            rate_limited,
        })
    }

    pub fn record_admitted(&self) {
        self.admitted.inc();
    }

    pub fn record_rejected(&self, err: &AdmissionError) {
        self.rejected.with_label_values(&[err.code()]).inc();
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.inc();
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
