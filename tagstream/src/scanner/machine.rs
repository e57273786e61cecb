// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Scanner state machine
//
// PLAIN:    search for the earliest open marker; emit text before it,
//           or everything except a hold-back tail when none is found.
// IN_BLOCK: search for the active block's close marker across the
//           accumulated content; emit nothing until it arrives.

use super::types::{AbandonReason, OpenBlock, ScanEvent, ScanState};
use crate::registry::TagRegistry;

/// Outcome of an open-marker search in PLAIN state.
#[derive(Debug, PartialEq, Eq)]
enum OpenSearch {
    /// Marker of descriptor `index` starts at byte `at`.
    Found { at: usize, index: usize },
    /// An earlier marker may start at `at` but the buffer ends inside it.
    Undecided { at: usize },
    NotFound,
}

/// Runs the state machine against a frozen registry.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'r> {
    registry: &'r TagRegistry,
    max_block_bytes: Option<usize>,
}

impl<'r> Scanner<'r> {
    pub fn new(registry: &'r TagRegistry) -> Self {
        Self {
            registry,
            max_block_bytes: None,
        }
    }

    /// Abandon a block whose content grows past `limit` bytes.
    pub fn with_block_limit(mut self, limit: Option<usize>) -> Self {
        self.max_block_bytes = limit;
        self
    }

    /// Feed newly arrived text. Returns the events it completes, in order.
    pub fn step(&self, state: &mut ScanState, input: &str) -> Vec<ScanEvent> {
        state.buffer.push_str(input);
        let mut events = Vec::new();
        self.run(state, false, &mut events);
        events
    }

    /// End of stream: emit retained text, then any open block verbatim.
    ///
    /// Leaves the state idle.
    pub fn finish(&self, state: &mut ScanState) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        self.run(state, true, &mut events);
        if let Some(open) = state.open.take() {
            events.push(self.abandon(open, AbandonReason::EndOfStream));
        }
        events
    }

    fn run(&self, state: &mut ScanState, at_end: bool, events: &mut Vec<ScanEvent>) {
        loop {
            if let Some(mut open) = state.open.take() {
                if state.buffer.is_empty() {
                    state.open = Some(open);
                    return;
                }
                let Some(descriptor) = self.registry.get(open.index) else {
                    // State built against another registry: degrade to text.
                    events.push(ScanEvent::Text(std::mem::take(&mut state.buffer)));
                    return;
                };
                let close = descriptor.close.as_str();

                // The close marker may straddle the old content and the new text.
                let resume = floor_boundary(
                    &open.content,
                    open.content.len().saturating_sub(close.len() - 1),
                );
                open.content.push_str(&state.buffer);
                state.buffer.clear();

                if let Some(rel) = open.content[resume..].find(close) {
                    let at = resume + rel;
                    state.buffer = open.content.split_off(at + close.len());
                    open.content.truncate(at);
                    events.push(ScanEvent::BlockClosed {
                        index: open.index,
                        content: open.content,
                    });
                    continue;
                }

                if let Some(limit) = self.max_block_bytes {
                    if open.content.len() > limit {
                        events.push(self.abandon(open, AbandonReason::Overflow));
                        continue;
                    }
                }

                state.open = Some(open);
                return;
            }

            if state.buffer.is_empty() {
                return;
            }

            match self.find_open(&state.buffer, at_end) {
                OpenSearch::Found { at, index } => {
                    let marker_len = self
                        .registry
                        .get(index)
                        .map_or(0, |d| d.open.len());
                    let rest = state.buffer.split_off(at + marker_len);
                    state.buffer.truncate(at);
                    push_text(events, std::mem::replace(&mut state.buffer, rest));
                    events.push(ScanEvent::BlockOpened { index });
                    state.open = Some(OpenBlock::new(index));
                }
                OpenSearch::Undecided { at } => {
                    let rest = state.buffer.split_off(at);
                    push_text(events, std::mem::replace(&mut state.buffer, rest));
                    return;
                }
                OpenSearch::NotFound => {
                    let split = if at_end {
                        state.buffer.len()
                    } else {
                        self.holdback_split(&state.buffer)
                    };
                    let rest = state.buffer.split_off(split);
                    push_text(events, std::mem::replace(&mut state.buffer, rest));
                    return;
                }
            }
        }
    }

    fn find_open(&self, buffer: &str, at_end: bool) -> OpenSearch {
        let mut best: Option<(usize, usize)> = None;
        for (index, descriptor) in self.registry.descriptors().iter().enumerate() {
            if let Some(pos) = buffer.find(descriptor.open.as_str()) {
                // Strict comparison: on a tie the earlier-registered descriptor stays.
                if best.map_or(true, |(best_pos, _)| pos < best_pos) {
                    best = Some((pos, index));
                }
            }
        }

        match best {
            Some((at, index)) => {
                if !at_end {
                    if let Some(partial) = self.partial_open_before(buffer, at, index) {
                        return OpenSearch::Undecided { at: partial };
                    }
                }
                OpenSearch::Found { at, index }
            }
            None => OpenSearch::NotFound,
        }
    }

    /// Earliest position from which the rest of `buffer` is a proper prefix
    /// of an open marker that would outrank the match of descriptor
    /// `index` at `at`: any marker starting earlier, or an earlier-registered
    /// marker starting at the same position.
    fn partial_open_before(&self, buffer: &str, at: usize, index: usize) -> Option<usize> {
        let descriptors = self.registry.descriptors();
        let longest_open = descriptors.iter().map(|d| d.open.len()).max().unwrap_or(0);
        let start = floor_boundary(buffer, buffer.len().saturating_sub(longest_open));

        buffer[start..]
            .char_indices()
            .map(|(i, _)| start + i)
            .take_while(|&i| i <= at)
            .find(|&i| {
                let tail = &buffer[i..];
                let outranks = |rank: usize| i < at || rank < index;
                descriptors.iter().enumerate().any(|(rank, d)| {
                    outranks(rank) && d.open.len() > tail.len() && d.open.starts_with(tail)
                })
            })
    }

    /// Byte offset splitting emit-now text from the last
    /// `max_marker_length - 1` characters, which are retained.
    fn holdback_split(&self, buffer: &str) -> usize {
        let keep = self.registry.max_marker_length().saturating_sub(1);
        if keep == 0 {
            return buffer.len();
        }
        buffer
            .char_indices()
            .rev()
            .nth(keep - 1)
            .map_or(0, |(i, _)| i)
    }

    fn abandon(&self, open: OpenBlock, reason: AbandonReason) -> ScanEvent {
        let marker = self
            .registry
            .get(open.index)
            .map_or("", |d| d.open.as_str());
        let mut raw = String::with_capacity(marker.len() + open.content.len());
        raw.push_str(marker);
        raw.push_str(&open.content);
        ScanEvent::BlockAbandoned {
            index: open.index,
            raw,
            reason,
        }
    }
}

fn push_text(events: &mut Vec<ScanEvent>, text: String) {
    if !text.is_empty() {
        events.push(ScanEvent::Text(text));
    }
}

/// Largest char boundary of `s` at or below `index`.
fn floor_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
