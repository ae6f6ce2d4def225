// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-platform presentation metadata.
//!
//! Character limits here are an optional override for admission (see
//! `AdmissionConfig::per_platform_limits`); the rest is display data for the
//! scheduling form.

use crate::validator::Platform;
use serde::Serialize;

/// Display and limit metadata for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProfile {
    pub platform: Platform,
    pub display_name: &'static str,
    pub max_content_length: usize,
    /// Suggested posting window, local time.
    pub best_time: &'static str,
}

const PROFILES: [PlatformProfile; 3] = [
    PlatformProfile {
        platform: Platform::Facebook,
        display_name: "Facebook",
        max_content_length: 5000,
        best_time: "Weekdays 9:00-13:00",
    },
    PlatformProfile {
        platform: Platform::Instagram,
        display_name: "Instagram",
        max_content_length: 2200,
        best_time: "Weekdays 11:00-14:00",
    },
    PlatformProfile {
        platform: Platform::Twitter,
        display_name: "Twitter",
        max_content_length: 280,
        best_time: "Weekdays 8:00-10:00",
    },
];

pub fn profile(platform: Platform) -> &'static PlatformProfile {
    match platform {
        Platform::Facebook => &PROFILES[0],
        Platform::Instagram => &PROFILES[1],
        Platform::Twitter => &PROFILES[2],
    }
}

pub fn profiles() -> &'static [PlatformProfile] {
    &PROFILES
}
