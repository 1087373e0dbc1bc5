use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Controls where the path resolver looks for plugins and whether the
/// packaged builtin directory is included in the search.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Extra roots to search, checked before the computed defaults
    /// (project, user, global, builtin).
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,
}

fn default_include_builtin() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            include_builtin: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn is_default(&self) -> bool {
        self.search_paths.is_empty() && self.include_builtin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_includes_builtin_with_no_extra_paths() {
        let config = DiscoveryConfig::default();
        assert!(config.include_builtin);
        assert!(config.search_paths.is_empty());
        assert!(config.is_default());
    }
}
