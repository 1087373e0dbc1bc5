//! Error taxonomy for the plugin subsystem.
//!
//! Split the way the host application's own `PluginError` is split:
//! one typed enum per concern (load, hooks parsing, hook execution,
//! trust store), each implemented with `thiserror` so a caller can
//! match on a specific failure kind instead of parsing a message
//! string. Orchestration code above this layer (the manager, the CLI)
//! wraps these in `anyhow::Context` instead of inventing yet another
//! variant for "something upstream went wrong".

use std::path::PathBuf;

use vellum_config::{ActionKind, HookEvent};

/// Failure loading a single plugin (manifest parse or component load).
#[derive(Debug, thiserror::Error)]
pub enum PluginLoadError {
    #[error("failed to read manifest for plugin at {plugin_root}: {source}")]
    ManifestRead {
        plugin_root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest JSON for plugin at {plugin_root}: {source}")]
    ManifestJson {
        plugin_root: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest schema validation failed for plugin at {plugin_root}: {message}")]
    ManifestSchema {
        plugin_root: PathBuf,
        message: String,
    },
    #[error("failed to read component file {path}: {source}")]
    ComponentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("path expansion failed for {raw_path}: {message}")]
    PathExpansion { raw_path: String, message: String },
}

/// Failure parsing or validating a plugin's `hooks.json`.
#[derive(Debug, thiserror::Error)]
#[error("hooks config error in {file_path}: {message}")]
pub struct HooksParseError {
    pub file_path: PathBuf,
    pub message: String,
    pub details: Option<String>,
}

/// Runtime failures surfaced by the hook executor, tagged with the
/// numeric codes callers can match on without string comparison.
#[derive(Debug, thiserror::Error)]
pub enum HookExecutionError {
    #[error("hook {hook_name} for event {event:?} timed out after {timeout_ms}ms")]
    HookTimeout {
        hook_name: String,
        event: HookEvent,
        timeout_ms: u64,
    },
    #[error("hook {hook_name} for event {event:?} failed: {message}")]
    HookExecutionFailed {
        hook_name: String,
        event: HookEvent,
        message: String,
    },
    #[error("hook {hook_name} for event {event:?} denied by permission policy ({kind:?})")]
    HookPermissionDenied {
        hook_name: String,
        event: HookEvent,
        kind: ActionKind,
    },
    #[error("hook {hook_name} uses an unsupported action")]
    HookUnsupportedAction { hook_name: String },
    #[error("hook {hook_name} for event {event:?} was aborted")]
    HookAborted { hook_name: String, event: HookEvent },
}

impl HookExecutionError {
    /// The numeric codes named in the error taxonomy (7001-7005).
    pub fn code(&self) -> u32 {
        match self {
            HookExecutionError::HookTimeout { .. } => 7001,
            HookExecutionError::HookExecutionFailed { .. } => 7002,
            HookExecutionError::HookPermissionDenied { .. } => 7003,
            HookExecutionError::HookUnsupportedAction { .. } => 7004,
            HookExecutionError::HookAborted { .. } => 7005,
        }
    }
}

/// Failure reading, parsing, or writing the trust store.
#[derive(Debug, thiserror::Error)]
pub enum TrustStoreError {
    #[error("failed to read trust store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse trust store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write trust store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_execution_error_codes_match_taxonomy() {
        let timeout = HookExecutionError::HookTimeout {
            hook_name: "h".into(),
            event: HookEvent::PreToolUse,
            timeout_ms: 100,
        };
        assert_eq!(timeout.code(), 7001);

        let denied = HookExecutionError::HookPermissionDenied {
            hook_name: "h".into(),
            event: HookEvent::PreToolUse,
            kind: ActionKind::Command,
        };
        assert_eq!(denied.code(), 7003);
    }
}
