// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Tallies of limiter decisions collected during a flood simulation.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Decision returned by the limiter for one simulated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    RateLimited,
}

impl From<bool> for Outcome {
    fn from(allowed: bool) -> Self {
        if allowed {
            Outcome::Allowed
        } else {
            Outcome::RateLimited
        }
    }
}

/// Per-caller counts plus a latency sample per decision.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    /// caller -> (seen, allowed)
    callers: HashMap<String, (usize, usize)>,
    latencies_us: Vec<u64>,
}

impl AttackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome, caller: &str, latency: Duration) {
        let tally = self.callers.entry(caller.to_string()).or_default();
        tally.0 += 1;
        if outcome == Outcome::Allowed {
            tally.1 += 1;
        }
        self.latencies_us
            .push(u64::try_from(latency.as_micros()).unwrap_or(u64::MAX));
    }

    /// Run one limiter decision under a timer.
    pub fn timed(&mut self, caller: &str, decide: impl FnOnce() -> bool) {
        let start = Instant::now();
        let outcome = Outcome::from(decide());
        self.record(outcome, caller, start.elapsed());
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.callers
            .values()
            .map(|(seen, allowed)| match outcome {
                Outcome::Allowed => *allowed,
                Outcome::RateLimited => seen - allowed,
            })
            .sum()
    }

    pub fn total_requests(&self) -> usize {
        self.latencies_us.len()
    }

    pub fn max_allowed_per_caller(&self) -> usize {
        self.callers.values().map(|(_, allowed)| *allowed).max().unwrap_or(0)
    }

    pub fn block_rate(&self) -> f64 {
        match self.total_requests() {
            0 => 0.0,
            total => self.count(Outcome::RateLimited) as f64 / total as f64,
        }
    }

    pub fn median_latency_us(&self) -> u64 {
        let mut sorted = self.latencies_us.clone();
        sorted.sort_unstable();
        sorted.get(sorted.len() / 2).copied().unwrap_or(0)
    }

    pub fn unique_callers(&self) -> usize {
        self.callers.len()
    }

    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            allowed: self.count(Outcome::Allowed),
            rate_limited: self.count(Outcome::RateLimited),
            block_rate: self.block_rate(),
            max_allowed_per_caller: self.max_allowed_per_caller(),
            median_latency_us: self.median_latency_us(),
            unique_callers: self.unique_callers(),
        }
    }
}

/// Snapshot of a finished simulation.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub allowed: usize,
    pub rate_limited: usize,
    pub block_rate: f64,
    pub max_allowed_per_caller: usize,
    pub median_latency_us: u64,
    pub unique_callers: usize,
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests={} allowed={} limited={} blocked={:.1}% callers={} max_per_caller={} median={}us",
            self.total_requests,
            self.allowed,
            self.rate_limited,
            self.block_rate * 100.0,
            self.unique_callers,
            self.max_allowed_per_caller,
            self.median_latency_us,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_caller_tallies() {
        let mut metrics = AttackMetrics::new();
        metrics.record(Outcome::Allowed, "10.0.0.1", Duration::from_micros(100));
        metrics.record(Outcome::Allowed, "10.0.0.1", Duration::from_micros(150));
        metrics.record(Outcome::RateLimited, "10.0.0.2", Duration::from_micros(50));

        assert_eq!(metrics.total_requests(), 3);
        assert_eq!(metrics.count(Outcome::Allowed), 2);
        assert_eq!(metrics.count(Outcome::RateLimited), 1);
        assert_eq!(metrics.max_allowed_per_caller(), 2);
        assert_eq!(metrics.unique_callers(), 2);
        assert_eq!(metrics.median_latency_us(), 100);
    }

    #[test]
    fn test_block_rate() {
        let mut metrics = AttackMetrics::new();
        for i in 0..10 {
            metrics.timed("10.0.0.1", || i < 3);
        }
        assert!((metrics.block_rate() - 0.7).abs() < 0.01);
    }
}
