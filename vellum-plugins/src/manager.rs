//! `PluginManager`: the aggregator tying path resolution, discovery,
//! loading, command/agent registration, and hook execution together.
//!
//! Structured the way the host application's own `PluginManager`
//! composes `loader`/`cache` behind one façade, but single-owned rather
//! than `Arc`-shared: this subsystem has exactly one manager per running
//! session, constructed once at the composition root.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vellum_config::{HookEvent, PluginSubsystemConfig};

use crate::adapter::{SlashCommand, adapt_command};
use crate::agent::ParsedAgent;
use crate::discovery::discover;
use crate::executor::{BoundHookRule, HookExecutor, HooksExecutionResult, PermissionBridge};
use crate::loader::{FailureRecord, LoadedPlugin, PluginState, load_full, load_manifest};
use crate::path_resolver::search_paths;
use crate::trust::TrustStore;

/// Everything the manager needs to know about *where* it's running.
#[derive(Debug, Clone, Default)]
pub struct ManagerContext {
    pub project_dir: Option<PathBuf>,
}

pub struct PluginManager {
    config: PluginSubsystemConfig,
    context: ManagerContext,
    plugins: HashMap<String, LoadedPlugin>,
    failures: HashMap<String, FailureRecord>,
    trust_store: TrustStore,
    cancellation: CancellationToken,
}

impl PluginManager {
    /// `trust_store_path` is loaded eagerly (a missing or corrupt file
    /// just starts empty) so `initialize()` can consult and update it in
    /// the same pass that discovers and loads plugins.
    pub fn new(config: PluginSubsystemConfig, context: ManagerContext, trust_store_path: PathBuf) -> Self {
        Self {
            config,
            context,
            plugins: HashMap::new(),
            failures: HashMap::new(),
            trust_store: TrustStore::load(trust_store_path),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn trust_store(&self) -> &TrustStore {
        &self.trust_store
    }

    pub fn trust_store_mut(&mut self) -> &mut TrustStore {
        &mut self.trust_store
    }

    /// Path resolver -> discovery -> L1 for every discovered plugin ->
    /// optionally L2 (when `load.eager_load`) -> auto-trust (when
    /// `load.auto_trust`) -> persist trust store. Every per-plugin
    /// failure is recorded rather than propagated: a broken plugin never
    /// prevents the rest of the tree from loading.
    pub async fn initialize(&mut self) {
        let roots = search_paths(&self.config.discovery, self.context.project_dir.as_deref());
        let discovered = discover(&roots).await;
        info!(count = discovered.len(), "discovered plugins");

        for candidate in discovered {
            match load_manifest(&candidate).await {
                Ok(mut plugin) => {
                    if self.config.load.eager_load {
                        plugin = load_full(plugin).await;
                    }
                    if self.config.load.auto_trust {
                        self.trust_store.auto_trust(&plugin.name, current_unix_time());
                    }
                    info!(plugin = %plugin.name, state = ?plugin.state, "loaded plugin");
                    self.failures.remove(&plugin.name);
                    self.plugins.insert(plugin.name.clone(), plugin);
                }
                Err(error) => {
                    warn!(plugin = %candidate.name, error = %error, "plugin failed to load");
                    self.failures.insert(
                        candidate.name.clone(),
                        FailureRecord {
                            name: candidate.name.clone(),
                            path: candidate.root_dir.clone(),
                            error: error.to_string(),
                            failed_at: 0,
                        },
                    );
                }
            }
        }

        if let Err(error) = self.trust_store.save() {
            warn!(error = %error, "failed to persist trust store");
        }
    }

    pub fn get_plugins(&self) -> Vec<&LoadedPlugin> {
        let mut plugins: Vec<_> = self.plugins.values().collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    pub fn get_failed_plugins(&self) -> Vec<&FailureRecord> {
        let mut failures: Vec<_> = self.failures.values().collect();
        failures.sort_by(|a, b| a.name.cmp(&b.name));
        failures
    }

    pub fn get_plugin(&self, name: &str) -> Option<&LoadedPlugin> {
        self.plugins.get(name)
    }

    /// The merged, namespace-resolved command registry: each plugin's
    /// commands are adapted in plugin-name order so name collisions are
    /// resolved deterministically (first registrant keeps the bare name).
    pub fn get_commands(&self) -> HashMap<String, SlashCommand> {
        let mut registry: HashMap<String, SlashCommand> = HashMap::new();
        let mut existing = std::collections::HashSet::new();

        for plugin in self.get_plugins() {
            for parsed in &plugin.commands {
                let existing_snapshot = existing.clone();
                let command = adapt_command(parsed.clone(), &plugin.name, &existing_snapshot);
                existing.insert(parsed.name.clone());
                registry.insert(command.name.clone(), command);
            }
        }
        registry
    }

    pub fn get_agents(&self) -> HashMap<String, ParsedAgent> {
        let mut registry = HashMap::new();
        for plugin in self.get_plugins() {
            for agent in &plugin.agents {
                registry.insert(agent.slug.clone(), agent.clone());
            }
        }
        registry
    }

    /// Force L2 for one plugin, e.g. after the operator repairs it on
    /// disk. On success the plugin's failure record (if any) is cleared.
    pub async fn load_plugin(&mut self, name: &str) -> bool {
        let Some(plugin) = self.plugins.remove(name) else {
            return false;
        };
        let loaded = load_full(plugin).await;
        self.failures.remove(name);
        self.plugins.insert(name.to_string(), loaded);
        true
    }

    pub fn unload_plugin(&mut self, name: &str) -> bool {
        self.plugins.remove(name).is_some()
    }

    /// Run the hook executor for `event` against every plugin's hooks,
    /// in plugin-name order, matching this crate's single-threaded
    /// per-call scheduling model: only one `execute` call is made here,
    /// over the union of every plugin's rules.
    pub async fn run_hooks(
        &self,
        event: HookEvent,
        input: serde_json::Value,
        bridge: &dyn PermissionBridge,
    ) -> HooksExecutionResult {
        let rules: Vec<BoundHookRule> = self
            .get_plugins()
            .into_iter()
            .flat_map(|plugin| {
                plugin.hooks.iter().enumerate().map(move |(index, rule)| BoundHookRule {
                    plugin_name: plugin.name.clone(),
                    plugin_root: plugin.root_dir.clone(),
                    index,
                    rule: rule.clone(),
                })
            })
            .collect();

        let executor = HookExecutor::with_cancellation(bridge, self.cancellation.clone());
        executor.execute(event, input, &rules).await
    }

    /// Trip the shared cancellation token: every `execute()` call in
    /// flight sees it on its next poll and tears down its child process
    /// via the same timeout-triggered kill-and-reap path it already
    /// uses, then returns `HookAborted` for its current rule.
    pub fn cancel_all(&self) {
        self.cancellation.cancel();
    }
}

fn current_unix_time() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::AllowAllBridge;
    use std::fs;
    use tempfile::TempDir;
    use vellum_config::DiscoveryConfig;

    fn write_plugin(root: &std::path::Path, name: &str) {
        let plugin_dir = root.join(name);
        fs::create_dir_all(plugin_dir.join(".vellum-plugin")).unwrap();
        fs::write(
            plugin_dir.join(".vellum-plugin").join("plugin.json"),
            format!(r#"{{"name":"{name}","version":"1.0.0","display_name":"{name}","description":"d","commands":["cmd.md"]}}"#),
        )
        .unwrap();
        fs::write(plugin_dir.join("cmd.md"), "---\nname: run\n---\n\nDo the thing.\n").unwrap();
    }

    #[tokio::test]
    async fn initialize_loads_valid_and_records_broken() {
        let tmp = TempDir::new().unwrap();
        write_plugin(tmp.path(), "good-one");
        fs::create_dir_all(tmp.path().join("broken").join(".vellum-plugin")).unwrap();
        fs::write(tmp.path().join("broken").join(".vellum-plugin").join("plugin.json"), "not json").unwrap();

        let config = PluginSubsystemConfig {
            discovery: DiscoveryConfig {
                search_paths: vec![tmp.path().to_path_buf()],
                include_builtin: false,
            },
            load: vellum_config::LoadConfig {
                eager_load: true,
                auto_trust: false,
            },
            ..Default::default()
        };

        let trust_path = tmp.path().join("trust-store.json");
        let mut manager = PluginManager::new(config, ManagerContext::default(), trust_path);
        manager.initialize().await;

        assert_eq!(manager.get_plugins().len(), 1);
        assert_eq!(manager.get_plugins()[0].name, "good-one");
        assert_eq!(manager.get_failed_plugins().len(), 1);
        assert_eq!(manager.get_failed_plugins()[0].name, "broken");
    }

    #[tokio::test]
    async fn commands_and_agents_are_aggregated_across_plugins() {
        let tmp = TempDir::new().unwrap();
        write_plugin(tmp.path(), "alpha");
        write_plugin(tmp.path(), "beta");

        let config = PluginSubsystemConfig {
            discovery: DiscoveryConfig {
                search_paths: vec![tmp.path().to_path_buf()],
                include_builtin: false,
            },
            load: vellum_config::LoadConfig {
                eager_load: true,
                auto_trust: false,
            },
            ..Default::default()
        };

        let trust_path = tmp.path().join("trust-store.json");
        let mut manager = PluginManager::new(config, ManagerContext::default(), trust_path);
        manager.initialize().await;

        let commands = manager.get_commands();
        assert_eq!(commands.len(), 2);
        assert!(commands.contains_key("run") || commands.contains_key("alpha:run"));
    }

    #[tokio::test]
    async fn run_hooks_with_no_rules_allows() {
        let tmp = TempDir::new().unwrap();
        let manager = PluginManager::new(
            PluginSubsystemConfig::default(),
            ManagerContext::default(),
            tmp.path().join("trust-store.json"),
        );
        let result = manager
            .run_hooks(HookEvent::SessionStart, serde_json::json!({}), &AllowAllBridge)
            .await;
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn auto_trust_promotes_discovered_plugins_and_persists() {
        let tmp = TempDir::new().unwrap();
        write_plugin(tmp.path(), "alpha");

        let config = PluginSubsystemConfig {
            discovery: DiscoveryConfig {
                search_paths: vec![tmp.path().to_path_buf()],
                include_builtin: false,
            },
            load: vellum_config::LoadConfig {
                eager_load: true,
                auto_trust: true,
            },
            ..Default::default()
        };
        let trust_path = tmp.path().join("trust-store.json");

        let mut manager = PluginManager::new(config, ManagerContext::default(), trust_path.clone());
        manager.initialize().await;

        assert!(manager.trust_store().is_trusted("alpha"));
        let reloaded = crate::trust::TrustStore::load(trust_path);
        assert!(reloaded.is_trusted("alpha"));
    }

    fn write_hooked_plugin(root: &std::path::Path, name: &str) {
        let plugin_dir = root.join(name);
        fs::create_dir_all(plugin_dir.join(".vellum-plugin")).unwrap();
        fs::write(
            plugin_dir.join(".vellum-plugin").join("plugin.json"),
            format!(
                r#"{{"name":"{name}","version":"1.0.0","display_name":"{name}","description":"d",
                    "hooks":[{{"event":"pre_tool_use","action":{{"type":"prompt","content":"A"}}}}]}}"#
            ),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn cancel_all_aborts_in_flight_run_hooks() {
        let tmp = TempDir::new().unwrap();
        write_hooked_plugin(tmp.path(), "hooked");

        let config = PluginSubsystemConfig {
            discovery: DiscoveryConfig {
                search_paths: vec![tmp.path().to_path_buf()],
                include_builtin: false,
            },
            load: vellum_config::LoadConfig {
                eager_load: true,
                auto_trust: false,
            },
            ..Default::default()
        };
        let mut manager = PluginManager::new(config, ManagerContext::default(), tmp.path().join("trust-store.json"));
        manager.initialize().await;

        manager.cancel_all();
        let result = manager
            .run_hooks(HookEvent::PreToolUse, serde_json::json!({}), &AllowAllBridge)
            .await;

        assert!(!result.allowed);
        assert_eq!(result.results.len(), 1);
    }
}
