//! Scans plugin search roots for `.vellum-plugin/plugin.json` bundles
//! and deduplicates by name, highest-priority source tier winning.
//!
//! Scanning follows the same "missing directory is not an error"
//! posture as the host application's own installed-plugin listing:
//! unreadable or absent directories contribute nothing rather than
//! aborting the whole scan.

use std::collections::HashMap;
use std::path::Path;

use tokio::fs;

use crate::manifest::manifest_relative_path;
use crate::source::{DiscoveredPlugin, PluginSource};

/// Scan every search path (in priority order) for plugin directories,
/// then dedupe by name keeping the highest-priority (lowest ordinal)
/// source. Each element of `search_paths` is tagged with the source
/// tier `PluginSource::from_search_index` derives from its position.
pub async fn discover(search_paths: &[std::path::PathBuf]) -> Vec<DiscoveredPlugin> {
    let total = search_paths.len();
    let mut by_name: HashMap<String, DiscoveredPlugin> = HashMap::new();

    for (index, root) in search_paths.iter().enumerate() {
        let source = PluginSource::from_search_index(index, total);
        for plugin in scan_one_root(root, source).await {
            match by_name.get(&plugin.name) {
                Some(existing) if existing.source.priority() <= plugin.source.priority() => {}
                _ => {
                    by_name.insert(plugin.name.clone(), plugin);
                }
            }
        }
    }

    let mut plugins: Vec<_> = by_name.into_values().collect();
    plugins.sort_by(|a, b| a.name.cmp(&b.name));
    plugins
}

async fn scan_one_root(root: &Path, source: PluginSource) -> Vec<DiscoveredPlugin> {
    let mut found = Vec::new();

    let Ok(mut entries) = fs::read_dir(root).await else {
        return found;
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(_) => break,
        };

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let manifest_path = manifest_relative_path(&path);
        if !manifest_path.exists() {
            continue;
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        found.push(DiscoveredPlugin {
            name,
            root_dir: path,
            manifest_path,
            source,
        });
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn make_plugin(root: &Path, name: &str) {
        let plugin_dir = root.join(name);
        std_fs::create_dir_all(plugin_dir.join(".vellum-plugin")).unwrap();
        std_fs::write(
            plugin_dir.join(".vellum-plugin").join("plugin.json"),
            format!(
                r#"{{"name":"{name}","version":"1.0.0","display_name":"{name}","description":"d"}}"#
            ),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn discovers_plugins_and_ignores_non_plugin_dirs() {
        let tmp = TempDir::new().unwrap();
        make_plugin(tmp.path(), "alpha");
        std_fs::create_dir_all(tmp.path().join("not-a-plugin")).unwrap();

        let found = discover(&[tmp.path().to_path_buf()]).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "alpha");
    }

    #[tokio::test]
    async fn missing_root_yields_empty_result() {
        let found = discover(&[std::path::PathBuf::from("/nonexistent/plugins/dir")]).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn higher_priority_tier_wins_on_name_collision() {
        let project_tmp = TempDir::new().unwrap();
        let user_tmp = TempDir::new().unwrap();
        make_plugin(project_tmp.path(), "shared");
        make_plugin(user_tmp.path(), "shared");

        // 4 paths total => indices map directly to Project/User/Global/Builtin.
        let found = discover(&[
            project_tmp.path().to_path_buf(),
            user_tmp.path().to_path_buf(),
            std::path::PathBuf::from("/nonexistent/global"),
            std::path::PathBuf::from("/nonexistent/builtin"),
        ])
        .await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, PluginSource::Project);
        assert_eq!(found[0].root_dir, project_tmp.path().join("shared"));
    }

    #[tokio::test]
    async fn ten_plugins_discover_within_100ms() {
        let tmp = TempDir::new().unwrap();
        for i in 0..10 {
            make_plugin(tmp.path(), &format!("plugin-{i}"));
        }

        let start = std::time::Instant::now();
        let found = discover(&[tmp.path().to_path_buf()]).await;
        let elapsed = start.elapsed();

        assert_eq!(found.len(), 10);
        assert!(elapsed.as_millis() <= 100, "discovery took {elapsed:?}, expected <= 100ms");
    }

    #[tokio::test]
    async fn three_concurrent_discoveries_complete_within_200ms() {
        let roots: Vec<TempDir> = (0..3)
            .map(|i| {
                let tmp = TempDir::new().unwrap();
                make_plugin(tmp.path(), &format!("concurrent-{i}"));
                tmp
            })
            .collect();

        let start = std::time::Instant::now();
        let (a, b, c) = tokio::join!(
            discover(&[roots[0].path().to_path_buf()]),
            discover(&[roots[1].path().to_path_buf()]),
            discover(&[roots[2].path().to_path_buf()]),
        );
        let elapsed = start.elapsed();

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(c.len(), 1);
        assert!(elapsed.as_millis() <= 200, "three concurrent discoveries took {elapsed:?}, expected <= 200ms");
    }
}
