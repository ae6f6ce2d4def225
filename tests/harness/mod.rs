// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for attack simulation against the admission gate.
//!
//! This module provides utilities for simulating floods and injection
//! payloads to validate the rate limiter and sanitizer.

#![allow(dead_code)]

pub mod attacks;
pub mod generators;
pub mod metrics;
