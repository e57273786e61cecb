// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Plugin registration
//
// A plugin is either tag-aware (descriptors + renderer) or a plain text
// hook. Plugins are resolved once into a frozen `PluginSet`: a tag
// registry with one renderer per descriptor, and a hook chain.

use std::sync::Arc;

use crate::hooks::{HookChain, TextHook};
use crate::registry::{BlockDescriptor, RegistryError, TagRegistry};
use crate::render::BlockRenderer;

/// A plugin contributed at setup time.
#[derive(Clone)]
pub enum Plugin {
    /// Owns one or more block kinds and renders them.
    TagAware {
        descriptors: Vec<BlockDescriptor>,
        renderer: Arc<dyn BlockRenderer>,
    },
    /// Transforms resolved plain text.
    TextHook(Arc<dyn TextHook>),
}

impl Plugin {
    pub fn tag_aware(descriptors: Vec<BlockDescriptor>, renderer: Arc<dyn BlockRenderer>) -> Self {
        Plugin::TagAware {
            descriptors,
            renderer,
        }
    }

    pub fn text_hook(hook: Arc<dyn TextHook>) -> Self {
        Plugin::TextHook(hook)
    }
}

/// Registry, renderers and hooks for the lifetime of a conversation.
///
/// Immutable once built; sessions share it through `Arc`.
#[derive(Clone, Default)]
pub struct PluginSet {
    registry: TagRegistry,
    /// Indexed like `registry.descriptors()`.
    renderers: Vec<Arc<dyn BlockRenderer>>,
    hooks: HookChain,
}

impl PluginSet {
    /// Resolve plugins in order. Fails on the first rejected descriptor.
    pub fn new(plugins: impl IntoIterator<Item = Plugin>) -> Result<Self, RegistryError> {
        let mut set = PluginSet::default();
        for plugin in plugins {
            match plugin {
                Plugin::TagAware {
                    descriptors,
                    renderer,
                } => {
                    for descriptor in descriptors {
                        set.registry.register(descriptor)?;
                        set.renderers.push(renderer.clone());
                    }
                }
                Plugin::TextHook(hook) => set.hooks.push(hook),
            }
        }
        Ok(set)
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    /// Descriptor and renderer for a registry index.
    pub fn block(&self, index: usize) -> Option<(&BlockDescriptor, &dyn BlockRenderer)> {
        let descriptor = self.registry.get(index)?;
        let renderer = self.renderers.get(index)?;
        Some((descriptor, renderer.as_ref()))
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSet")
            .field("registry", &self.registry)
            .field("hooks", &self.hooks)
            .finish()
    }
}
