// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Streaming session
//
// Responsibilities:
// - Pull chunks from a source until it is done, fails, or is cancelled
// - Normalize delta or cumulative chunks into new text
// - Scan for tagged blocks, render them, run text hooks on plain text
// - Swap the in-flight placeholder for the resolved block in place
// - Report progress to an observer and recoverable problems to diagnostics

mod driver;
mod normalizer;
mod observer;
mod types;

pub use driver::Session;
pub use normalizer::ChunkNormalizer;
pub use observer::{ChannelObserver, NullObserver, SessionObserver};
pub use types::{
    CancelHandle, OutputMessage, ParseModeError, SessionError, SessionEvent, SessionOutcome,
    SessionSettings, SessionStatus, StreamingMode,
};
