//! Plugin source tiers and the bare discovery record.

use std::path::PathBuf;

/// Where a plugin was found. Ordered so `project < user < global < builtin`
/// by `priority()` — lower priority value wins when two plugins share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginSource {
    Project,
    User,
    Global,
    Builtin,
}

impl PluginSource {
    /// Maps a search path's index in `path_resolver::search_paths`'
    /// output onto its source tier. Extra configured `search_paths`
    /// entries (which precede the four computed tiers) are treated as
    /// `Project` tier, matching the "most specific wins" precedence.
    pub fn from_search_index(index: usize, total_search_paths: usize) -> Self {
        let tiers = [
            PluginSource::Project,
            PluginSource::User,
            PluginSource::Global,
            PluginSource::Builtin,
        ];
        let offset = total_search_paths.saturating_sub(tiers.len());
        if index < offset {
            PluginSource::Project
        } else {
            tiers[(index - offset).min(tiers.len() - 1)]
        }
    }

    /// Lower value = higher priority; used to resolve name collisions.
    pub fn priority(self) -> u8 {
        match self {
            PluginSource::Project => 0,
            PluginSource::User => 1,
            PluginSource::Global => 2,
            PluginSource::Builtin => 3,
        }
    }
}

/// A plugin located on disk but not yet parsed.
#[derive(Debug, Clone)]
pub struct DiscoveredPlugin {
    pub name: String,
    pub root_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub source: PluginSource,
}
