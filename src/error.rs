// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Rejection kinds for rate limiting and post admission.

use axum::http::StatusCode;
use thiserror::Error;

/// Why a caller or a payload was turned away.
///
/// Display strings are the messages shown to the submitter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("Invalid platform")]
    InvalidPlatform,

    #[error("Content is required")]
    EmptyContent,

    #[error("Content must be {max} characters or less")]
    ContentTooLong { max: usize },

    #[error("Content cannot be empty after sanitization")]
    ContentEmptyAfterSanitization,

    #[error("Scheduled time is required")]
    MissingValue,

    #[error("Invalid date format")]
    InvalidFormat,

    #[error("Scheduled time must be in the future")]
    NotInFuture,

    #[error("Cannot schedule posts more than 1 year in advance")]
    TooFarInFuture,

    #[error("Invalid image URL")]
    InvalidImageUrl,
}

impl AdmissionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited => "RATE_LIMITED",
            Self::InvalidPlatform => "INVALID_PLATFORM",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::ContentEmptyAfterSanitization => "CONTENT_EMPTY_AFTER_SANITIZATION",
            Self::MissingValue => "MISSING_VALUE",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::NotInFuture => "NOT_IN_FUTURE",
            Self::TooFarInFuture => "TOO_FAR_IN_FUTURE",
            Self::InvalidImageUrl => "INVALID_IMAGE_URL",
        }
    }

    /// Transport status. Every kind is a caller error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AdmissionError>;
