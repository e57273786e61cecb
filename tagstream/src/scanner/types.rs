// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Scanner state and events

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Why an open block was given up on and flushed uninterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// The stream ended before the close marker arrived.
    EndOfStream,
    /// The block's content exceeded the configured byte limit.
    Overflow,
}

/// One classified piece of the logical stream, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Plain text outside any block. Never empty.
    Text(String),
    /// An open marker was recognized for the descriptor at `index`.
    BlockOpened { index: usize },
    /// The active block's close marker was found. `content` excludes both markers.
    BlockClosed { index: usize, content: String },
    /// The active block will never resolve. `raw` is the open marker
    /// followed by the accumulated content, exactly as received.
    BlockAbandoned {
        index: usize,
        raw: String,
        reason: AbandonReason,
    },
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The block currently being accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBlock {
    /// Registry index of the block's descriptor.
    pub index: usize,
    /// Everything received after the open marker so far.
    pub content: String,
}

impl OpenBlock {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            content: String::new(),
        }
    }
}

/// Mutable scanner state for one stream.
///
/// `buffer` holds input not yet classified: plain text withheld because it
/// might start a marker. While a block is open the buffer is drained into
/// the block's content on every step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub(crate) buffer: String,
    pub(crate) open: Option<OpenBlock>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text retained for the next step.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    pub fn open_block(&self) -> Option<&OpenBlock> {
        self.open.as_ref()
    }

    /// True when nothing is retained and no block is open.
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty() && self.open.is_none()
    }

    /// Drop all partial state without emitting it.
    pub fn discard(&mut self) {
        self.buffer.clear();
        self.open = None;
    }
}
