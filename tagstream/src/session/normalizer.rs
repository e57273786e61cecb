// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

use crate::diagnostics::{DiagnosticEvent, Diagnostics};

use super::types::StreamingMode;

/// Turns raw chunks into the text not seen before.
#[derive(Debug, Clone, Default)]
pub struct ChunkNormalizer {
    mode: StreamingMode,
    /// Everything emitted so far. Unused in delta mode.
    seen: String,
}

impl ChunkNormalizer {
    pub fn new(mode: StreamingMode) -> Self {
        Self {
            mode,
            seen: String::new(),
        }
    }

    pub fn mode(&self) -> StreamingMode {
        self.mode
    }

    pub fn normalize(&mut self, raw: &str, diagnostics: &dyn Diagnostics) -> String {
        match self.mode {
            StreamingMode::Delta => raw.to_string(),
            StreamingMode::Auto => {
                if !self.seen.is_empty() && raw.starts_with(self.seen.as_str()) {
                    self.advance_to(raw)
                } else {
                    self.seen.push_str(raw);
                    raw.to_string()
                }
            }
            StreamingMode::Cumulative => {
                if !raw.starts_with(self.seen.as_str()) {
                    diagnostics.record(DiagnosticEvent::SnapshotDiverged {
                        seen_bytes: self.seen.len(),
                        snapshot_bytes: raw.len(),
                    });
                }
                self.advance_to(raw)
            }
        }
    }

    /// Text of `snapshot` beyond the seen length; the snapshot becomes the seen text.
    fn advance_to(&mut self, snapshot: &str) -> String {
        let delta = snapshot.get(self.seen.len()..).unwrap_or("").to_string();
        self.seen.clear();
        self.seen.push_str(snapshot);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;

    fn run(mode: StreamingMode, chunks: &[&str]) -> (Vec<String>, Vec<DiagnosticEvent>) {
        let diagnostics = RecordingDiagnostics::new();
        let mut normalizer = ChunkNormalizer::new(mode);
        let out = chunks
            .iter()
            .map(|c| normalizer.normalize(c, &diagnostics))
            .collect();
        (out, diagnostics.events())
    }

    #[test]
    fn auto_detects_snapshots() {
        let (out, _) = run(StreamingMode::Auto, &["Hi", "Hi the", "Hi there"]);
        assert_eq!(out, vec!["Hi", " the", "re"]);
    }

    #[test]
    fn auto_treats_non_extending_chunks_as_deltas() {
        let (out, _) = run(StreamingMode::Auto, &["Hello", ", ", "world"]);
        assert_eq!(out, vec!["Hello", ", ", "world"]);
    }

    #[test]
    fn auto_mixes_after_a_delta() {
        // "Hello" then "Hello, world" (snapshot) then "!" (delta)
        let (out, _) = run(StreamingMode::Auto, &["Hello", "Hello, world", "!"]);
        assert_eq!(out, vec!["Hello", ", world", "!"]);
    }

    #[test]
    fn delta_passes_chunks_through() {
        let (out, diags) = run(StreamingMode::Delta, &["Hi", "Hi"]);
        assert_eq!(out, vec!["Hi", "Hi"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn cumulative_emits_suffixes() {
        let (out, diags) = run(StreamingMode::Cumulative, &["Hi", "Hi the", "Hi there"]);
        assert_eq!(out, vec!["Hi", " the", "re"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn cumulative_repeated_snapshot_is_empty() {
        let (out, _) = run(StreamingMode::Cumulative, &["abc", "abc"]);
        assert_eq!(out, vec!["abc", ""]);
    }

    #[test]
    fn cumulative_divergence_is_recorded() {
        let (out, diags) = run(StreamingMode::Cumulative, &["Hello", "Jello world"]);
        assert_eq!(out, vec!["Hello", " world"]);
        assert_eq!(
            diags,
            vec![DiagnosticEvent::SnapshotDiverged {
                seen_bytes: 5,
                snapshot_bytes: 11
            }]
        );
    }

    #[test]
    fn cumulative_shorter_snapshot_yields_nothing() {
        let (out, diags) = run(StreamingMode::Cumulative, &["Hello", "Help"]);
        assert_eq!(out, vec!["Hello", ""]);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn cumulative_divergence_inside_a_character() {
        // Seen length lands inside the two-byte 'é'.
        let (out, _) = run(StreamingMode::Cumulative, &["a", "é!"]);
        assert_eq!(out, vec!["a", ""]);
    }

    #[test]
    fn mode_parses_from_str() {
        assert_eq!("auto".parse::<StreamingMode>().unwrap(), StreamingMode::Auto);
        assert_eq!("delta".parse::<StreamingMode>().unwrap(), StreamingMode::Delta);
        assert_eq!(
            "cumulative".parse::<StreamingMode>().unwrap(),
            StreamingMode::Cumulative
        );
        assert!("Delta".parse::<StreamingMode>().is_err());
    }
}
