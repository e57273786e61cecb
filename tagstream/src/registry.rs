// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Tag registry
//
// Static list of block descriptors contributed by tag-aware plugins.
// The scanner reads it to find open/close markers and to decide how
// much trailing plain text to hold back between chunks.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised when a descriptor is rejected at registration time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("block \"{name}\" has an empty {which} marker")]
    EmptyMarker { name: String, which: &'static str },

    #[error("block \"{name}\" uses the same text for its open and close markers")]
    IdenticalMarkers { name: String },

    #[error("block \"{name}\" is already registered")]
    DuplicateName { name: String },

    #[error("block \"{name}\" reuses open marker \"{open}\" of block \"{existing}\"")]
    DuplicateOpenMarker {
        name: String,
        open: String,
        existing: String,
    },

    #[error("block descriptor has an empty name")]
    EmptyName,
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// A block kind delimited by an open and a close marker.
///
/// Example: `{ name: "printjob", open: "[PRINTJOB]", close: "[/PRINTJOB]" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    pub name: String,
    pub open: String,
    pub close: String,
}

impl BlockDescriptor {
    pub fn new(
        name: impl Into<String>,
        open: impl Into<String>,
        close: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            open: open.into(),
            close: close.into(),
        }
    }

    /// Longest of the two markers, in characters.
    pub fn max_marker_len(&self) -> usize {
        self.open.chars().count().max(self.close.chars().count())
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.open.is_empty() {
            return Err(RegistryError::EmptyMarker {
                name: self.name.clone(),
                which: "open",
            });
        }
        if self.close.is_empty() {
            return Err(RegistryError::EmptyMarker {
                name: self.name.clone(),
                which: "close",
            });
        }
        if self.open == self.close {
            return Err(RegistryError::IdenticalMarkers {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered set of block descriptors.
///
/// Registration order is significant: when two open markers match at the
/// same buffer position, the earlier-registered descriptor wins.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    descriptors: Vec<BlockDescriptor>,
    max_marker_len: usize,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Returns its index, which the scanner reports back
    /// in its events.
    pub fn register(&mut self, descriptor: BlockDescriptor) -> Result<usize, RegistryError> {
        descriptor.validate()?;
        if self.descriptors.iter().any(|d| d.name == descriptor.name) {
            return Err(RegistryError::DuplicateName {
                name: descriptor.name,
            });
        }
        if let Some(existing) = self.descriptors.iter().find(|d| d.open == descriptor.open) {
            return Err(RegistryError::DuplicateOpenMarker {
                existing: existing.name.clone(),
                open: descriptor.open,
                name: descriptor.name,
            });
        }
        self.max_marker_len = self.max_marker_len.max(descriptor.max_marker_len());
        self.descriptors.push(descriptor);
        Ok(self.descriptors.len() - 1)
    }

    /// Longest open or close marker across all descriptors, in characters.
    /// Zero when nothing is registered.
    pub fn max_marker_length(&self) -> usize {
        self.max_marker_len
    }

    pub fn get(&self, index: usize) -> Option<&BlockDescriptor> {
        self.descriptors.get(index)
    }

    pub fn descriptors(&self) -> &[BlockDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
