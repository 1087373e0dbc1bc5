//! Trust record schema persisted by the trust store.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::hooks::ActionKind;

#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// No hook belonging to this plugin may run.
    None,
    /// Every hook action is gated behind an interactive prompt.
    Ask,
    /// Every hook action whose kind is in `allowed_action_kinds` runs
    /// without prompting.
    Trusted,
}

impl Default for TrustLevel {
    fn default() -> Self {
        TrustLevel::None
    }
}

/// A single plugin's trust decision, as persisted in the trust store.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrustRecord {
    pub plugin_name: String,
    /// Unix seconds; recorded via the host's clock, never read by this crate.
    pub granted_at: i64,
    pub trust_level: TrustLevel,
    #[serde(default)]
    pub allowed_action_kinds: BTreeSet<ActionKind>,
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl TrustRecord {
    pub fn allows(&self, kind: ActionKind) -> bool {
        match self.trust_level {
            TrustLevel::Trusted => self.allowed_action_kinds.contains(&kind),
            TrustLevel::None | TrustLevel::Ask => false,
        }
    }
}

/// All action kinds at once, used by `auto_trust` to promote a plugin
/// without leaving it with an empty (and therefore useless) capability set.
pub fn all_action_kinds() -> BTreeSet<ActionKind> {
    [ActionKind::Command, ActionKind::Script, ActionKind::Prompt]
        .into_iter()
        .collect()
}
