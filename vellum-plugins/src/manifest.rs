//! Plugin manifest: `.vellum-plugin/plugin.json`.
//!
//! Field set and validation rules are grounded directly in the host
//! application's own plugin manifest and validator (name is non-empty
//! kebab-case, version is a bare `MAJOR.MINOR.PATCH[-pre][+build]`
//! string), trimmed to the fields this subsystem's spec names.

use serde::{Deserialize, Serialize};

use crate::error::PluginLoadError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The JSON document at `.vellum-plugin/plugin.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub display_name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<PluginAuthor>,
    /// Paths to command markdown files, relative to the plugin root.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Paths to agent markdown files, relative to the plugin root.
    #[serde(default)]
    pub agents: Vec<String>,
    /// Either an inline hooks array or a path to a `hooks.json`
    /// relative to the plugin root.
    #[serde(default)]
    pub hooks: Option<HooksReference>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HooksReference {
    Path(String),
    Inline(Vec<serde_json::Value>),
}

impl PluginManifest {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Validate the manifest fields named in the schema contract:
    /// non-empty kebab-case `name`, semver `version`, non-empty
    /// `display_name`/`description`.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_plugin_name(&self.name) {
            return Err(format!(
                "plugin name '{}' must be non-empty, lowercase, kebab-case",
                self.name
            ));
        }
        if semver::Version::parse(&self.version).is_err() {
            return Err(format!(
                "plugin version '{}' is not a valid semantic version",
                self.version
            ));
        }
        if self.display_name.trim().is_empty() {
            return Err("plugin display_name must not be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("plugin description must not be empty".to_string());
        }
        if let Some(author) = &self.author
            && author.name.trim().is_empty()
        {
            return Err("plugin author.name must not be empty when author is present".to_string());
        }
        Ok(())
    }
}

/// Ascii-lowercase/digit/hyphen, no leading/trailing hyphen, non-empty.
pub fn is_valid_plugin_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('-') || name.ends_with('-') {
        return false;
    }
    name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn manifest_relative_path(plugin_root: &std::path::Path) -> std::path::PathBuf {
    plugin_root.join(".vellum-plugin").join("plugin.json")
}

pub fn load_manifest_from_str(
    plugin_root: &std::path::Path,
    content: &str,
) -> Result<PluginManifest, PluginLoadError> {
    let manifest = PluginManifest::parse(content).map_err(|source| PluginLoadError::ManifestJson {
        plugin_root: plugin_root.to_path_buf(),
        source,
    })?;
    manifest
        .validate()
        .map_err(|message| PluginLoadError::ManifestSchema {
            plugin_root: plugin_root.to_path_buf(),
            message,
        })?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_manifest() -> PluginManifest {
        PluginManifest {
            name: "git-helper".into(),
            version: "1.0.0".into(),
            display_name: "Git Helper".into(),
            description: "Helpful git shortcuts".into(),
            entrypoint: None,
            author: None,
            commands: vec![],
            agents: vec![],
            hooks: None,
        }
    }

    #[test]
    fn valid_manifest_passes() {
        assert!(valid_manifest().validate().is_ok());
    }

    #[test]
    fn rejects_bad_name() {
        let mut manifest = valid_manifest();
        manifest.name = "Git_Helper".into();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn rejects_bad_version() {
        let mut manifest = valid_manifest();
        manifest.version = "v1".into();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn rejects_empty_author_name() {
        let mut manifest = valid_manifest();
        manifest.author = Some(PluginAuthor {
            name: "  ".into(),
            email: None,
        });
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn plugin_name_rules() {
        assert!(is_valid_plugin_name("git-helper"));
        assert!(!is_valid_plugin_name(""));
        assert!(!is_valid_plugin_name("-git"));
        assert!(!is_valid_plugin_name("git-"));
        assert!(!is_valid_plugin_name("Git"));
    }

    #[test]
    fn parses_manifest_json() {
        let content = r#"{
            "name": "git-helper",
            "version": "1.0.0",
            "display_name": "Git Helper",
            "description": "Helpful git shortcuts",
            "commands": ["commands/status.md"]
        }"#;
        let manifest = PluginManifest::parse(content).unwrap();
        assert_eq!(manifest.commands, vec!["commands/status.md".to_string()]);
        assert!(manifest.validate().is_ok());
    }
}
