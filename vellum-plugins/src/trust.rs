//! Trust store: a single JSON document mapping plugin name to its
//! trust decision, persisted via the same temp-file-then-rename atomic
//! write this codebase uses for its own managed config files.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use vellum_config::{ActionKind, HookEvent, TrustLevel, TrustRecord, all_action_kinds};

use crate::error::TrustStoreError;
use crate::executor::PermissionBridge;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TrustStoreFile {
    #[serde(default)]
    plugins: BTreeMap<String, TrustRecord>,
}

pub struct TrustStore {
    path: PathBuf,
    records: BTreeMap<String, TrustRecord>,
}

impl TrustStore {
    /// Load the store from `path`, or start empty if the file does not
    /// exist yet or fails to parse (a corrupt store is never fatal: it
    /// just means every plugin starts untrusted again).
    pub fn load(path: PathBuf) -> Self {
        let records = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<TrustStoreFile>(&content).ok())
            .map(|file| file.plugins)
            .unwrap_or_default();
        Self { path, records }
    }

    pub fn is_trusted(&self, plugin_name: &str) -> bool {
        self.records
            .get(plugin_name)
            .is_some_and(|record| record.trust_level == TrustLevel::Trusted)
    }

    pub fn record(&self, plugin_name: &str) -> Option<&TrustRecord> {
        self.records.get(plugin_name)
    }

    pub fn grant(&mut self, plugin_name: &str, level: TrustLevel, allowed_action_kinds: impl IntoIterator<Item = ActionKind>, granted_at: i64) {
        self.records.insert(
            plugin_name.to_string(),
            TrustRecord {
                plugin_name: plugin_name.to_string(),
                granted_at,
                trust_level: level,
                allowed_action_kinds: allowed_action_kinds.into_iter().collect(),
                content_hash: None,
            },
        );
    }

    /// Promote `plugin_name` to fully trusted with every action kind
    /// allowed. A `Trusted` record with an empty capability set would
    /// make this promotion a no-op against `check_permission`, so all
    /// kinds are granted at once.
    pub fn auto_trust(&mut self, plugin_name: &str, granted_at: i64) {
        self.grant(plugin_name, TrustLevel::Trusted, all_action_kinds(), granted_at);
    }

    pub fn revoke(&mut self, plugin_name: &str) {
        self.records.remove(plugin_name);
    }

    pub fn save(&self) -> Result<(), TrustStoreError> {
        let file = TrustStoreFile {
            plugins: self.records.clone(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(|source| TrustStoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        write_atomic(&self.path, &content).map_err(|source| TrustStoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_file = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    temp_file.as_file().write_all(content.as_bytes())?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Default permission bridge: trusted plugins pass for capability kinds
/// they were granted, everyone else is denied. The interactive `ask`
/// prompt flow lives entirely in the host application; this bridge
/// treats `Ask` as a denial, matching the spec's "blanket block" rule
/// for anything short of `Trusted`.
pub struct TrustStoreBridge<'a> {
    store: &'a TrustStore,
}

impl<'a> TrustStoreBridge<'a> {
    pub fn new(store: &'a TrustStore) -> Self {
        Self { store }
    }
}

impl PermissionBridge for TrustStoreBridge<'_> {
    fn check_permission(&self, plugin_name: &str, kind: ActionKind, _event: HookEvent) -> bool {
        self.store
            .record(plugin_name)
            .is_some_and(|record| record.allows(kind))
    }
}
