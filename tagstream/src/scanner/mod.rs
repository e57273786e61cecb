// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Incremental scanner
//
// Responsibilities:
// - Walk an ever-growing text buffer, emitting plain-text runs
// - Detect registered open markers (earliest position, registration
//   order on ties) and the active block's close marker
// - Hold back trailing text that may be the prefix of a marker split
//   across chunks
// - Accumulate block content until its close marker arrives
// - At end of stream, flush retained text and any open block verbatim
//
// The scanner is a pure state machine: `step(state, input)` mutates an
// explicit `ScanState` and returns events. Rendering, hooks and output
// are the session's concern.

mod machine;
mod types;

pub use machine::Scanner;
pub use types::{AbandonReason, OpenBlock, ScanEvent, ScanState};

#[cfg(test)]
mod tests;
