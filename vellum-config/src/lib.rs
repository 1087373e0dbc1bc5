//! Typed configuration for the plugin subsystem: where to discover
//! plugins, how eagerly to load them, the hook executor's timeout
//! defaults, and the schema for a plugin's `hooks.json` and trust
//! records.
//!
//! Every struct here is a plain `serde`-deserializable config type with
//! a documented default, following the host application's own
//! configuration conventions rather than any dynamic/duck-typed shape.

pub mod discovery;
pub mod executor;
pub mod hooks;
pub mod load;
pub mod trust;

pub use discovery::DiscoveryConfig;
pub use executor::ExecutorConfig;
pub use hooks::{ActionKind, FailBehavior, HookAction, HookEvent, HookRule, compile_matcher, parse_hooks_json};
pub use load::LoadConfig;
pub use trust::{TrustLevel, TrustRecord, all_action_kinds};

/// Top-level configuration bundle the plugin manager is constructed from.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct PluginSubsystemConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}
