// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Conversation message types
//
// History entries handed to the transport as part of the request
// context, plus descriptors of files uploaded for the next request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Content contains markup (rendered blocks or hook output).
    #[serde(default)]
    pub html: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Plain-text message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            html: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_html(mut self, html: bool) -> Self {
        self.html = html;
        self
    }
}

/// A file previously uploaded by the user, referenced by the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}
