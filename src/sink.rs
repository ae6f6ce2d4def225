// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Hand-off point for accepted posts.

use crate::admission::PostPayload;
use crate::validator::Platform;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Sink failure.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Post sink unavailable: {0}")]
    Unavailable(String),
}

/// Acknowledgement returned to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    pub id: String,
    pub platform: Platform,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub scheduled_time: String,
    pub created_at: DateTime<Utc>,
}

impl ScheduledPost {
    pub fn acknowledge(post: PostPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("scheduled-{}", Uuid::new_v4()),
            platform: post.platform,
            content: post.content,
            image_url: post.image_url,
            scheduled_time: post.scheduled_time,
            created_at,
        }
    }
}

/// Receives posts that passed admission. Durable storage lives behind this.
pub trait PostSink: Send + Sync {
    fn schedule(&self, post: PostPayload) -> Result<ScheduledPost, SinkError>;
}

/// Acknowledges receipt without retaining anything.
#[derive(Debug, Default)]
pub struct AcknowledgingSink;

impl PostSink for AcknowledgingSink {
    fn schedule(&self, post: PostPayload) -> Result<ScheduledPost, SinkError> {
        Ok(ScheduledPost::acknowledge(post, Utc::now()))
    }
}
