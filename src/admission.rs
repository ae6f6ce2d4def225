// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Post admission: one accept/reject decision per submitted post.
//!
//! Checks, first failure wins:
//! 1. platform is one of the supported set
//! 2. content is present and within the length limit
//! 3. content survives sanitization
//! 4. scheduled time is in the future and within the horizon
//! 5. image URL, when given, is an absolute http(s) URL

use crate::error::{AdmissionError, Result};
use crate::sanitizer::sanitize;
use crate::schedule::{validate_scheduled_time_at, DEFAULT_HORIZON_MONTHS};
use crate::validator::{is_valid_url, Platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Post submission as received. Every field may be missing; a JSON value
/// that is not a string is read as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPostInput {
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub scheduled_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        _ => Some(String::new()),
    })
}

/// An accepted post. `content` is sanitized; `scheduled_time` is the
/// submitted string, known to parse to `scheduled_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub platform: Platform,
    pub content: String,
    pub scheduled_time: String,
    #[serde(skip)]
    pub scheduled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Admit `input` against the current time and a one-year horizon.
pub fn admit(input: &RawPostInput, max_content_length: usize) -> Result<PostPayload> {
    admit_at(input, max_content_length, Utc::now(), DEFAULT_HORIZON_MONTHS)
}

/// Admit `input` against a fixed `now`.
pub fn admit_at(
    input: &RawPostInput,
    max_content_length: usize,
    now: DateTime<Utc>,
    horizon_months: u32,
) -> Result<PostPayload> {
    let platform = input
        .platform
        .as_deref()
        .and_then(|p| p.parse::<Platform>().ok())
        .ok_or(AdmissionError::InvalidPlatform)?;

    let content = input.content.as_deref().unwrap_or_default();
    if content.trim().is_empty() {
        return Err(AdmissionError::EmptyContent);
    }
    let length = content.chars().count();
    if length > max_content_length {
        debug!(length, max_content_length, "Content over limit");
        return Err(AdmissionError::ContentTooLong {
            max: max_content_length,
        });
    }

    let sanitized = sanitize(content);
    if sanitized.is_empty() {
        debug!(%platform, "Content was entirely unsafe markup");
        return Err(AdmissionError::ContentEmptyAfterSanitization);
    }

    let scheduled_time = input.scheduled_time.as_deref().unwrap_or_default();
    let scheduled_at = validate_scheduled_time_at(scheduled_time, now, horizon_months)?;

    if let Some(url) = input.image_url.as_deref() {
        if !is_valid_url(url) {
            return Err(AdmissionError::InvalidImageUrl);
        }
    }

    Ok(PostPayload {
        platform,
        content: sanitized,
        scheduled_time: scheduled_time.to_string(),
        scheduled_at,
        image_url: input.image_url.clone(),
    })
}
