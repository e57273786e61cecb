// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Diagnostics sink
//
// The session reports recoverable problems (plugin failures, oversized
// blocks, diverging snapshots) through an injected sink instead of
// logging directly. `TracingDiagnostics` forwards to `tracing`.

use std::sync::Mutex;

/// Which renderer call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Placeholder,
    Resolved,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStage::Placeholder => "placeholder",
            RenderStage::Resolved => "resolved",
        }
    }
}

/// A recoverable event observed while processing a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    /// A block renderer returned an error. The block contributes nothing.
    RendererFailed {
        block: String,
        stage: RenderStage,
        error: String,
    },
    /// A renderer returned empty resolved markup.
    EmptyRender { block: String },
    /// A text hook returned an error. Its input is kept unchanged.
    HookFailed { hook: String, error: String },
    /// An open block grew past the configured limit and was flushed verbatim.
    BlockOverflow { block: String, limit: usize },
    /// The stream ended inside a block; its raw text was flushed verbatim.
    UnclosedBlock { block: String, bytes: usize },
    /// A cumulative snapshot did not extend the text seen so far.
    SnapshotDiverged { seen_bytes: usize, snapshot_bytes: usize },
}

/// Receives diagnostic events from a session.
pub trait Diagnostics: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Default sink: one `tracing` event per diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::RendererFailed {
                block,
                stage,
                error,
            } => {
                tracing::warn!(block = %block, stage = stage.as_str(), %error, "block renderer failed");
            }
            DiagnosticEvent::EmptyRender { block } => {
                tracing::debug!(block = %block, "block renderer produced no markup");
            }
            DiagnosticEvent::HookFailed { hook, error } => {
                tracing::warn!(hook = %hook, %error, "text hook failed, text left unchanged");
            }
            DiagnosticEvent::BlockOverflow { block, limit } => {
                tracing::warn!(block = %block, limit, "block exceeded buffer limit, flushed verbatim");
            }
            DiagnosticEvent::UnclosedBlock { block, bytes } => {
                tracing::info!(block = %block, bytes, "stream ended inside block, flushed verbatim");
            }
            DiagnosticEvent::SnapshotDiverged {
                seen_bytes,
                snapshot_bytes,
            } => {
                tracing::warn!(seen_bytes, snapshot_bytes, "cumulative snapshot diverged from seen text");
            }
        }
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}
