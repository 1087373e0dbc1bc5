use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MIN_TIMEOUT_MS: u64 = 100;
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Timeout bounds enforced on every `HookRule` (see `hooks::HookRule::timeout_ms`).
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_max_timeout_ms")]
    pub max_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_timeout_ms() -> u64 {
    MAX_TIMEOUT_MS
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_timeout_ms: MAX_TIMEOUT_MS,
        }
    }
}

impl ExecutorConfig {
    /// Clamp a rule-declared timeout to `[MIN_TIMEOUT_MS, self.max_timeout_ms]`.
    pub fn clamp(&self, requested_ms: u64) -> u64 {
        requested_ms.clamp(MIN_TIMEOUT_MS, self.max_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_hook_rule_bounds() {
        let config = ExecutorConfig::default();
        assert_eq!(config.default_timeout_ms, 30_000);
        assert_eq!(config.max_timeout_ms, 300_000);
    }

    #[test]
    fn clamp_respects_bounds() {
        let config = ExecutorConfig::default();
        assert_eq!(config.clamp(10), MIN_TIMEOUT_MS);
        assert_eq!(config.clamp(1_000_000), MAX_TIMEOUT_MS);
        assert_eq!(config.clamp(5_000), 5_000);
    }
}
