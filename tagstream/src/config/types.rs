// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::hooks::RegexReplaceHook;
use crate::plugin::{Plugin, PluginSet};
use crate::registry::{BlockDescriptor, RegistryError};
use crate::render::{BlockTemplate, TemplateRenderer};
use crate::session::SessionSettings;

use super::pattern::CompiledPattern;

/// Resolved template used when a block declares none.
pub const DEFAULT_BLOCK_TEMPLATE: &str =
    "<div class=\"tagstream-block\" data-block=\"{name}\">{content}</div>";

/// Top-level validated config.
#[derive(Debug, Clone)]
pub struct Config {
    pub version: String,
    pub session: SessionSettings,
    pub history: HistoryConfig,
    /// Request metadata, `${VAR}` references already resolved.
    pub metadata: BTreeMap<String, String>,
    pub blocks: Vec<BlockConfig>,
    pub hooks: Vec<HookConfig>,
    /// `sha256:<hex>` of the raw YAML.
    pub contract_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Most recent messages sent with each request. `None` sends all.
    pub max_messages: Option<usize>,
}

/// One configured block kind: its markers and how it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockConfig {
    pub descriptor: BlockDescriptor,
    pub template: BlockTemplate,
}

/// One configured regex replacement hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HookConfig {
    pub name: String,
    pub pattern: CompiledPattern,
    pub replace: String,
    pub markup: bool,
}

impl Config {
    /// Freeze the configured blocks and hooks into a plugin set.
    ///
    /// All blocks share one `TemplateRenderer`; hooks keep config order.
    pub fn plugin_set(&self) -> Result<PluginSet, RegistryError> {
        let mut plugins = Vec::with_capacity(self.hooks.len() + 1);

        if !self.blocks.is_empty() {
            let mut renderer = TemplateRenderer::new();
            let mut descriptors = Vec::with_capacity(self.blocks.len());
            for block in &self.blocks {
                renderer.insert(block.descriptor.name.clone(), block.template.clone());
                descriptors.push(block.descriptor.clone());
            }
            plugins.push(Plugin::tag_aware(descriptors, Arc::new(renderer)));
        }

        for hook in &self.hooks {
            plugins.push(Plugin::text_hook(Arc::new(RegexReplaceHook::new(
                hook.name.clone(),
                hook.pattern.clone(),
                hook.replace.clone(),
                hook.markup,
            ))));
        }

        PluginSet::new(plugins)
    }
}
