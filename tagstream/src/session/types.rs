// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Session types
//
// Settings, the output message under construction, lifecycle events,
// outcomes and errors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::message::{Message, Role};
use crate::transport::TransportError;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How raw chunks relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingMode {
    /// A chunk that extends everything seen so far is a snapshot,
    /// anything else is a delta.
    #[default]
    Auto,
    /// Every chunk is new text.
    Delta,
    /// Every chunk is the full text so far.
    Cumulative,
}

impl StreamingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamingMode::Auto => "auto",
            StreamingMode::Delta => "delta",
            StreamingMode::Cumulative => "cumulative",
        }
    }
}

impl fmt::Display for StreamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown streaming mode \"{0}\", expected auto, delta or cumulative")]
pub struct ParseModeError(String);

impl FromStr for StreamingMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(StreamingMode::Auto),
            "delta" => Ok(StreamingMode::Delta),
            "cumulative" => Ok(StreamingMode::Cumulative),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Per-session knobs, usually taken from config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub mode: StreamingMode,
    /// Abandon a block whose content grows past this many bytes.
    pub max_block_bytes: Option<usize>,
}

// ---------------------------------------------------------------------------
// Output message
// ---------------------------------------------------------------------------

/// The assistant message a session builds up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputMessage {
    id: Uuid,
    content: String,
    html: bool,
    created_at: DateTime<Utc>,
}

impl OutputMessage {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            content: String::new(),
            html: false,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the content contains markup.
    pub fn is_html(&self) -> bool {
        self.html
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn append(&mut self, text: &str, html: bool) {
        self.content.push_str(text);
        self.html |= html;
    }

    /// Replace the first occurrence of `from`. Returns false if absent.
    pub(crate) fn replace_once(&mut self, from: &str, to: &str) -> bool {
        match self.content.find(from) {
            Some(at) => {
                self.content.replace_range(at..at + from.len(), to);
                true
            }
            None => false,
        }
    }

    /// Convert into a history entry.
    pub fn into_message(self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.content,
            html: self.html,
            created_at: self.created_at,
        }
    }
}

impl Default for OutputMessage {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Events and outcomes
// ---------------------------------------------------------------------------

/// Lifecycle notifications delivered to a `SessionObserver`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started { session_id: Uuid },
    /// First content for the message is about to be shown.
    MessageStarted { message_id: Uuid },
    MessageUpdated { message_id: Uuid, content: String },
    Ended { message_id: Option<Uuid> },
    Cancelled,
    Failed { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Completed,
    Cancelled,
}

/// How a session that did not fail ended, with the message it built.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    /// `None` when the stream produced no visible content.
    pub message: Option<OutputMessage>,
}

/// Errors returned by a session. Content built so far travels with them.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("transport failed: {source}")]
    Transport {
        #[source]
        source: TransportError,
        partial: Option<OutputMessage>,
    },
}

impl SessionError {
    /// The message built before the failure.
    pub fn partial(&self) -> Option<&OutputMessage> {
        match self {
            SessionError::Transport { partial, .. } => partial.as_ref(),
        }
    }

    pub fn into_partial(self) -> Option<OutputMessage> {
        match self {
            SessionError::Transport { partial, .. } => partial,
        }
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cloneable handle that stops a session. Idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}
