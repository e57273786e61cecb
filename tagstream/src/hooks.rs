// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Post-processing hook chain
//
// Plain (non tag-aware) plugins transform resolved plain-text fragments.
// Hooks never see placeholder or block markup, nor the content of a
// block that is still open.

use std::sync::Arc;

use crate::config::CompiledPattern;
use crate::diagnostics::{DiagnosticEvent, Diagnostics};

/// Error returned by a text hook. The chain recovers by keeping its input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct HookError(pub String);

/// Result of a hook: the transformed text and whether it now contains markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutput {
    pub text: String,
    pub markup: bool,
}

impl HookOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: false,
        }
    }

    pub fn markup(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: true,
        }
    }
}

/// A plain-text transformation. Must not block indefinitely.
pub trait TextHook: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    fn apply(&self, text: &str) -> Result<HookOutput, HookError>;
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Hooks in registration order.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn TextHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: Arc<dyn TextHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook over `text`. A failing hook is reported and skipped.
    pub fn apply(&self, text: &str, diagnostics: &dyn Diagnostics) -> HookOutput {
        let mut current = HookOutput::text(text);
        for hook in &self.hooks {
            match hook.apply(&current.text) {
                Ok(out) => {
                    current.markup |= out.markup;
                    current.text = out.text;
                }
                Err(e) => diagnostics.record(DiagnosticEvent::HookFailed {
                    hook: hook.name().to_string(),
                    error: e.to_string(),
                }),
            }
        }
        current
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Regex replacement hook
// ---------------------------------------------------------------------------

/// Replaces every match of a pattern, with `$1`-style group references.
#[derive(Debug, Clone)]
pub struct RegexReplaceHook {
    name: String,
    pattern: CompiledPattern,
    replacement: String,
    markup: bool,
}

impl RegexReplaceHook {
    pub fn new(
        name: impl Into<String>,
        pattern: CompiledPattern,
        replacement: impl Into<String>,
        markup: bool,
    ) -> Self {
        Self {
            name: name.into(),
            pattern,
            replacement: replacement.into(),
            markup,
        }
    }
}

impl TextHook for RegexReplaceHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, text: &str) -> Result<HookOutput, HookError> {
        Ok(match self.pattern.replace_all(text, &self.replacement) {
            Some(replaced) => HookOutput {
                text: replaced,
                markup: self.markup,
            },
            None => HookOutput::text(text),
        })
    }
}
