use serde::{Deserialize, Serialize};

/// Controls how aggressively discovered plugins are loaded and trusted.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
pub struct LoadConfig {
    /// If true, every discovered plugin is fully loaded (L2) during
    /// `initialize()`. If false, only the manifest (L1) is loaded and
    /// commands/agents/hooks are parsed on demand via `load_plugin`.
    #[serde(default)]
    pub eager_load: bool,
    /// If true, every discovered plugin is promoted to `Trusted` on
    /// load, bypassing the interactive permission prompt. Intended for
    /// tests and local development, never for a default production
    /// configuration.
    #[serde(default)]
    pub auto_trust: bool,
}
