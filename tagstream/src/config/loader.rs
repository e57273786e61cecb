// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, HashSet};

use sha2::{Digest, Sha256};

use crate::registry::{BlockDescriptor, TagRegistry};
use crate::render::{BlockTemplate, Template};
use crate::session::{SessionSettings, StreamingMode};

use super::error::ConfigError;
use super::interpolation::resolve_variables;
use super::pattern::CompiledPattern;
use super::raw;
use super::source::ConfigSource;
use super::types::*;

/// Load and validate a tagstream config from the given source.
///
/// Steps:
/// 1. Read raw YAML from source
/// 2. Compute SHA256 contract hash
/// 3. Parse YAML into raw deserialization types
/// 4. Validate version, streaming mode and limits
/// 5. Resolve variable interpolation in metadata and templates
/// 6. Check block markers by registering them, compile hook patterns
/// 7. Build typed Config struct
pub fn load_config(source: &dyn ConfigSource) -> Result<Config, ConfigError> {
    let raw_yaml = source.load()?;
    let contract_hash = compute_hash(&raw_yaml);

    let raw: raw::RawConfig = serde_yaml::from_str(&raw_yaml)?;

    if raw.tagstream != "v1" {
        return Err(ConfigError::Validation(format!(
            "unsupported config version \"{}\", expected \"v1\"",
            raw.tagstream
        )));
    }

    let session = build_session_settings(raw.streaming, raw.limits)?;
    let history = build_history_config(raw.history)?;

    let metadata = raw
        .metadata
        .into_iter()
        .map(|(key, value)| resolve_variables(&value).map(|value| (key, value)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let blocks = raw
        .blocks
        .into_iter()
        .map(build_block_config)
        .collect::<Result<Vec<_>, _>>()?;

    // Same checks the plugin set applies when it is frozen.
    let mut registry = TagRegistry::new();
    for block in &blocks {
        registry.register(block.descriptor.clone())?;
    }

    let hooks = build_hook_configs(raw.hooks)?;

    tracing::debug!(
        blocks = blocks.len(),
        hooks = hooks.len(),
        hash = %contract_hash,
        "config loaded"
    );

    Ok(Config {
        version: raw.tagstream,
        session,
        history,
        metadata,
        blocks,
        hooks,
        contract_hash,
    })
}

pub fn compute_hash(raw_yaml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_yaml.as_bytes());
    let hash = hasher.finalize();
    format!("sha256:{:x}", hash)
}

fn build_session_settings(
    streaming: Option<raw::RawStreaming>,
    limits: Option<raw::RawLimits>,
) -> Result<SessionSettings, ConfigError> {
    let mode = match streaming.and_then(|s| s.mode) {
        Some(mode) => mode
            .parse::<StreamingMode>()
            .map_err(|e| ConfigError::Validation(format!("streaming.mode: {e}")))?,
        None => StreamingMode::default(),
    };

    let max_block_bytes = limits.and_then(|l| l.max_block_bytes);
    if max_block_bytes == Some(0) {
        return Err(ConfigError::Validation(
            "limits.max_block_bytes must be greater than 0".to_string(),
        ));
    }

    Ok(SessionSettings {
        mode,
        max_block_bytes,
    })
}

fn build_history_config(raw: Option<raw::RawHistory>) -> Result<HistoryConfig, ConfigError> {
    let max_messages = raw.and_then(|h| h.max_messages);
    if max_messages == Some(0) {
        return Err(ConfigError::Validation(
            "history.max_messages must be greater than 0".to_string(),
        ));
    }
    Ok(HistoryConfig { max_messages })
}

fn build_block_config(raw: raw::RawBlock) -> Result<BlockConfig, ConfigError> {
    let placeholder = raw
        .placeholder
        .as_deref()
        .map(resolve_variables)
        .transpose()?
        .map(|p| Template::parse(&p));

    let resolved = match raw.template.as_deref() {
        Some(template) => Template::parse(&resolve_variables(template)?),
        None => Template::parse(DEFAULT_BLOCK_TEMPLATE),
    };

    Ok(BlockConfig {
        descriptor: BlockDescriptor::new(raw.name, raw.open, raw.close),
        template: BlockTemplate {
            placeholder,
            resolved,
            raw: raw.raw,
        },
    })
}

fn build_hook_configs(raw: Vec<raw::RawHook>) -> Result<Vec<HookConfig>, ConfigError> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .map(|hook| {
            if hook.name.is_empty() {
                return Err(ConfigError::Validation("hook name must not be empty".to_string()));
            }
            if !seen.insert(hook.name.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate hook name \"{}\"",
                    hook.name
                )));
            }
            // Replacement strings are not interpolated: `${1}` is a group reference.
            Ok(HookConfig {
                pattern: CompiledPattern::compile(&hook.pattern)?,
                name: hook.name,
                replace: hook.replace,
                markup: hook.markup,
            })
        })
        .collect()
}
