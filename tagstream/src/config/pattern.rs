// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use regex::Regex;

use super::error::ConfigError;

/// A hook pattern compiled at load time. Equality and `Debug` use the
/// source text.
#[derive(Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile a pattern, returning `ConfigError::InvalidRegex` on failure.
    pub fn compile(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source: e,
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Substitute every match, expanding `$1` / `${name}` group references.
    /// `None` when nothing matched.
    pub fn replace_all(&self, text: &str, replacement: &str) -> Option<String> {
        if !self.regex.is_match(text) {
            return None;
        }
        Some(self.regex.replace_all(text, replacement).into_owned())
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledPattern").field(&self.source).finish()
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_all_expands_groups() {
        let pattern = CompiledPattern::compile(r"\*\*([^*]+)\*\*").unwrap();
        assert_eq!(
            pattern.replace_all("**a** and **b**", "<b>$1</b>").as_deref(),
            Some("<b>a</b> and <b>b</b>")
        );
        assert_eq!(pattern.as_str(), r"\*\*([^*]+)\*\*");
    }

    #[test]
    fn replace_all_without_match_is_none() {
        let pattern = CompiledPattern::compile("x+").unwrap();
        assert_eq!(pattern.replace_all("abc", "y"), None);
    }

    #[test]
    fn invalid_pattern_names_source() {
        let err = CompiledPattern::compile("(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { ref pattern, .. } if pattern == "(unclosed"));
    }
}
