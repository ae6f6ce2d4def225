// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Attack simulation patterns for security testing.
//!
//! Time is simulated: request `i` arrives at `start + i * interval`, so a
//! scenario covering minutes of traffic runs instantly and deterministically.

use std::time::Duration;

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Simulated time between consecutive requests
    pub interval: Duration,
    /// Number of unique callers, used round-robin
    pub unique_callers: usize,
    /// Offset of the first request from the simulation start
    pub start_offset: Duration,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            interval: Duration::from_millis(100),
            unique_callers: 1,
            start_offset: Duration::ZERO,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single caller flood - basic DoS from one address.
    pub fn single_caller_flood() -> Self {
        Self {
            total_requests: 200,
            interval: Duration::from_millis(10),
            unique_callers: 1,
            ..Default::default()
        }
    }

    /// Distributed attack - many callers, low rate each.
    pub fn distributed_attack() -> Self {
        Self {
            total_requests: 500,
            interval: Duration::from_millis(20),
            unique_callers: 100,
            ..Default::default()
        }
    }

    /// Sustained flood lasting several windows.
    pub fn sustained_flood() -> Self {
        Self {
            total_requests: 600,
            interval: Duration::from_secs(1),
            unique_callers: 1,
            ..Default::default()
        }
    }

    /// Slow drip - stay just under the limit.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 100,
            interval: Duration::from_secs(7),
            unique_callers: 1,
            ..Default::default()
        }
    }

    /// Simulated arrival offset of request `index`.
    pub fn arrival(&self, index: usize) -> Duration {
        self.start_offset + self.interval * index as u32
    }

    /// Simulated span of the whole attack.
    pub fn expected_duration(&self) -> Duration {
        self.interval * self.total_requests as u32
    }
}
