//! L1 (manifest-only) and L2 (full) plugin loading.
//!
//! Mirrors the two-phase shape of the host application's own plugin
//! manager (manifest read/validate first, component hydration second),
//! but collapses its install/uninstall lifecycle away: this subsystem
//! only ever loads plugins already present on disk. Per-plugin failures
//! are caught and recorded rather than propagated, so one broken plugin
//! never blocks the rest of a directory scan from loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;
use vellum_config::{HookRule, parse_hooks_json};

use crate::agent::{ParsedAgent, parse_agent_content};
use crate::command::{ParsedCommand, parse_command_content};
use crate::error::PluginLoadError;
use crate::manifest::{HooksReference, PluginManifest, load_manifest_from_str, manifest_relative_path};
use crate::source::{DiscoveredPlugin, PluginSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Discovered,
    ManifestLoaded,
    FullyLoaded,
    Enabled,
    Disabled,
    Failed,
}

/// A plugin that has passed L1 (and, once `load_plugin` runs, L2).
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    pub name: String,
    pub root_dir: PathBuf,
    pub source: PluginSource,
    pub manifest: PluginManifest,
    pub state: PluginState,
    pub commands: Vec<ParsedCommand>,
    pub agents: Vec<ParsedAgent>,
    pub hooks: Vec<HookRule>,
}

#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub name: String,
    pub path: PathBuf,
    pub error: String,
    pub failed_at: i64,
}

/// L1: read and validate `plugin.json` only. Returns the manifest with
/// `state = ManifestLoaded`; no command/agent/hook file is touched.
pub async fn load_manifest(discovered: &DiscoveredPlugin) -> Result<LoadedPlugin, PluginLoadError> {
    let content = tokio::fs::read_to_string(&discovered.manifest_path)
        .await
        .map_err(|source| PluginLoadError::ManifestRead {
            plugin_root: discovered.root_dir.clone(),
            source,
        })?;

    let manifest = load_manifest_from_str(&discovered.root_dir, &content)?;

    Ok(LoadedPlugin {
        name: discovered.name.clone(),
        root_dir: discovered.root_dir.clone(),
        source: discovered.source,
        manifest,
        state: PluginState::ManifestLoaded,
        commands: Vec::new(),
        agents: Vec::new(),
        hooks: Vec::new(),
    })
}

/// L2: hydrate commands, agents, and hooks referenced by an already
/// L1-loaded plugin. A missing referenced file is a warning, not a
/// failure; the rest of the plugin still loads.
pub async fn load_full(mut plugin: LoadedPlugin) -> LoadedPlugin {
    plugin.commands = load_components(&plugin.root_dir, &plugin.manifest.commands, &plugin.name, parse_command_content).await;
    plugin.agents = load_components(&plugin.root_dir, &plugin.manifest.agents, &plugin.name, |content, path| {
        parse_agent_content(content, path).ok()
    })
    .await;
    plugin.hooks = load_hooks(&plugin.root_dir, plugin.manifest.hooks.as_ref(), &plugin.name).await;
    plugin.state = PluginState::Enabled;
    plugin
}

async fn load_components<T>(
    plugin_root: &Path,
    relative_paths: &[String],
    plugin_name: &str,
    parse: impl Fn(&str, &Path) -> Option<T>,
) -> Vec<T> {
    let mut parsed = Vec::new();
    for relative_path in relative_paths {
        let path = plugin_root.join(relative_path);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                if let Some(component) = parse(&content, &path) {
                    parsed.push(component);
                } else {
                    warn!(plugin = plugin_name, path = %path.display(), "failed to parse plugin component, skipping");
                }
            }
            Err(source) => {
                warn!(plugin = plugin_name, path = %path.display(), error = %source, "plugin component file missing, skipping");
            }
        }
    }
    parsed
}

async fn load_hooks(plugin_root: &Path, hooks: Option<&HooksReference>, plugin_name: &str) -> Vec<HookRule> {
    let raw = match hooks {
        None => return Vec::new(),
        Some(HooksReference::Inline(values)) => serde_json::to_string(values).unwrap_or_default(),
        Some(HooksReference::Path(relative_path)) => {
            let path = plugin_root.join(relative_path);
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(source) => {
                    warn!(plugin = plugin_name, path = %path.display(), error = %source, "hooks file missing, skipping");
                    return Vec::new();
                }
            }
        }
    };

    match parse_hooks_json(&raw) {
        Ok(rules) => rules,
        Err(error) => {
            warn!(plugin = plugin_name, error = %error, "hooks config failed to parse, plugin loads without hooks");
            Vec::new()
        }
    }
}

/// Parse-only variant of the command-file path, exposed so L1 callers
/// that only want to confirm the manifest layout without reading
/// `plugin.json` twice can reuse the same join logic.
pub fn manifest_path_for(root_dir: &Path) -> PathBuf {
    manifest_relative_path(root_dir)
}
