// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Config loader and validator
//
// Loads tagstream.yaml, validates structure, resolves variable
// interpolation, compiles hook patterns, and computes a deterministic
// contract hash.

mod error;
mod interpolation;
mod loader;
mod pattern;
mod raw;
mod source;
mod types;

pub use error::ConfigError;
pub use interpolation::resolve_variables;
pub use loader::{compute_hash, load_config};
pub use pattern::CompiledPattern;
pub use source::{ConfigSource, FileSource, StringSource};
pub use types::*;
