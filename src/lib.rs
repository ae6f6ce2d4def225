// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Post Admission Gate
//!
//! Admission control for the social dashboard's scheduling API:
//!
//! - Fixed-window rate limiting keyed by caller, with an in-memory table for
//!   the server and a durable, fail-open throttle for serverless callers
//! - Content sanitization (denylist of markup and script vectors)
//! - Platform, URL, email, and schedule validation
//! - One accept/reject decision per submitted post

pub mod admission;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod platform;
pub mod sanitizer;
pub mod schedule;
pub mod sink;
pub mod throttle;
pub mod validator;

pub use admission::{admit, PostPayload, RawPostInput};
pub use config::Config;
pub use error::AdmissionError;
pub use limiter::{FixedWindowLimiter, MemoryStore, RateLimitResult, RateLimiter, WindowState, WindowStore};
pub use sanitizer::sanitize;
pub use throttle::{ClientThrottle, FileStore};
