// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Block renderer capability
//
// A tag-aware plugin renders a placeholder when a block opens and the
// final markup once its content is complete. Placeholders are wrapped in
// an element carrying a generated token so the session can replace that
// exact occurrence in the output message.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by a block renderer. Never propagated past the session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("no template for block \"{0}\"")]
    UnknownBlock(String),

    #[error("invalid block content: {0}")]
    InvalidContent(String),

    #[error("{0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// Trait: BlockRenderer
// ---------------------------------------------------------------------------

/// Renders blocks of one or more registered kinds.
///
/// Implementations must be Send + Sync: one plugin set is shared by every
/// session of a conversation.
pub trait BlockRenderer: Send + Sync {
    /// Markup shown while the block is still streaming. `None` shows nothing.
    fn render_placeholder(&self, block: &str) -> Result<Option<String>, RenderError>;

    /// Final markup for the block's complete content (markers excluded).
    fn render_resolved(&self, block: &str, content: &str) -> Result<String, RenderError>;
}

// ---------------------------------------------------------------------------
// Placeholder
// ---------------------------------------------------------------------------

/// Attribute carrying the correlation token on placeholder markup.
pub const PLACEHOLDER_ATTR: &str = "data-tagstream-placeholder";

/// Placeholder markup as inserted into the output message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    token: Uuid,
    markup: String,
}

impl Placeholder {
    /// Wrap renderer markup in an element tagged with a fresh token.
    pub fn wrap(inner: &str) -> Self {
        let token = Uuid::new_v4();
        Self {
            markup: format!("<span {PLACEHOLDER_ATTR}=\"{token}\">{inner}</span>"),
            token,
        }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    /// Exact text inserted into the message; unique because of the token.
    pub fn markup(&self) -> &str {
        &self.markup
    }
}

// ---------------------------------------------------------------------------
// Template renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Name,
    Content,
}

/// Parsed `{name}` / `{content}` template.
#[derive(Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(start) = rest.find('{') {
            literal.push_str(&rest[..start]);
            let tail = &rest[start..];
            let (segment, consumed) = if tail.starts_with("{content}") {
                (Some(Segment::Content), "{content}".len())
            } else if tail.starts_with("{name}") {
                (Some(Segment::Name), "{name}".len())
            } else {
                (None, 1)
            };
            match segment {
                Some(seg) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(seg);
                }
                None => literal.push('{'),
            }
            rest = &tail[consumed..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn fill(&self, name: &str, content: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + content.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(name),
                Segment::Content => out.push_str(content),
            }
        }
        out
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Template").field(&self.source).finish()
    }
}

/// How one block kind renders under `TemplateRenderer`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockTemplate {
    pub placeholder: Option<Template>,
    pub resolved: Template,
    /// Insert content as-is instead of HTML-escaping it.
    pub raw: bool,
}

/// Renderer driven by per-block templates (typically from config).
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    templates: HashMap<String, BlockTemplate>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, name: impl Into<String>, template: BlockTemplate) -> Self {
        self.templates.insert(name.into(), template);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, template: BlockTemplate) {
        self.templates.insert(name.into(), template);
    }

    fn template(&self, block: &str) -> Result<&BlockTemplate, RenderError> {
        self.templates
            .get(block)
            .ok_or_else(|| RenderError::UnknownBlock(block.to_string()))
    }
}

impl BlockRenderer for TemplateRenderer {
    fn render_placeholder(&self, block: &str) -> Result<Option<String>, RenderError> {
        let template = self.template(block)?;
        Ok(template.placeholder.as_ref().map(|p| p.fill(block, "")))
    }

    fn render_resolved(&self, block: &str, content: &str) -> Result<String, RenderError> {
        let template = self.template(block)?;
        if template.raw {
            Ok(template.resolved.fill(block, content))
        } else {
            let escaped = html_escape::encode_text(content);
            Ok(template.resolved.fill(block, &escaped))
        }
    }
}
