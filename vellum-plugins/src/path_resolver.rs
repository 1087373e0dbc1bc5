//! Computes ordered plugin search roots and expands path variables
//! inside plugin-authored paths (script paths, hook command args).
//!
//! Grounded in the layered-directory precedence used throughout this
//! codebase (project > user > global > builtin) and in the
//! `${VAR}`/`~`-expansion idiom `vellum_commons::paths` applies to
//! workspace paths, generalized here to the plugin-specific variables
//! a manifest or hook may reference.

use std::env;
use std::path::{Path, PathBuf};

use vellum_config::DiscoveryConfig;

/// Context supplying the three plugin-specific variables a manifest or
/// hook script path may reference.
#[derive(Debug, Clone, Default)]
pub struct ExpansionContext {
    pub plugin_root: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    pub project_dir: Option<PathBuf>,
}

/// Ordered plugin search roots: project, user, global, builtin. Every
/// non-empty tier maps 1:1 onto a `PluginSource` tier by its index in
/// the returned vector (see `source::PluginSource::from_search_index`).
pub fn search_paths(config: &DiscoveryConfig, project_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for extra in &config.search_paths {
        paths.push(extra.clone());
    }

    if let Some(project_dir) = project_dir {
        paths.push(project_dir.join(".vellum").join("plugins"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".vellum").join("plugins"));
    }

    paths.push(global_plugin_dir());

    if config.include_builtin {
        paths.push(builtin_plugin_dir());
    }

    paths
}

#[cfg(windows)]
fn global_plugin_dir() -> PathBuf {
    if let Ok(app_data) = env::var("APPDATA") {
        PathBuf::from(app_data).join("vellum").join("plugins")
    } else {
        dirs::home_dir()
            .unwrap_or_default()
            .join("AppData")
            .join("Roaming")
            .join("vellum")
            .join("plugins")
    }
}

#[cfg(not(windows))]
fn global_plugin_dir() -> PathBuf {
    PathBuf::from("/usr/local/share/vellum/plugins")
}

fn builtin_plugin_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("plugins")))
        .unwrap_or_else(|| PathBuf::from("plugins"))
}

/// Expand `~`, `${VELLUM_PLUGIN_ROOT}`/`${VELLUM_USER_DIR}`/`${VELLUM_PROJECT_DIR}`,
/// and `${NAME}`/`$NAME` (or `%NAME%` on Windows) environment references
/// in a single left-to-right pass. Unknown `${NAME}` variables expand
/// to the empty string rather than failing, matching shell behavior
/// for unset variables.
pub fn expand_path(raw: &str, ctx: &ExpansionContext) -> String {
    let mut expanded = expand_tilde(raw);
    expanded = expand_braced_vars(&expanded, ctx);
    #[cfg(windows)]
    {
        expanded = expand_percent_vars(&expanded);
    }
    expanded
}

fn expand_tilde(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
            if let Some(home) = dirs::home_dir() {
                return format!("{}{}", home.display(), rest);
            }
        }
    }
    raw.to_string()
}

fn expand_braced_vars(input: &str, ctx: &ExpansionContext) -> String {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            if let Some(end) = input[i + 2..].find('}') {
                let name = &input[i + 2..i + 2 + end];
                out.push_str(&resolve_var(name, ctx));
                i += 2 + end + 1;
                continue;
            }
        }
        if bytes[i] == b'$' && bytes.get(i + 1).is_some_and(|c| c.is_ascii_alphabetic() || *c == b'_') {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                end += 1;
            }
            out.push_str(&resolve_var(&input[start..end], ctx));
            i = end;
            continue;
        }
        let ch = input[i..].chars().next().expect("i is a valid char boundary");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

#[cfg(windows)]
fn expand_percent_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        if let Some(end) = rest[start + 1..].find('%') {
            let name = &rest[start + 1..start + 1 + end];
            out.push_str(&env::var(name).unwrap_or_default());
            rest = &rest[start + 1 + end + 1..];
        } else {
            out.push('%');
            rest = &rest[start + 1..];
        }
    }
    out.push_str(rest);
    out
}

fn resolve_var(name: &str, ctx: &ExpansionContext) -> String {
    match name {
        "VELLUM_PLUGIN_ROOT" => ctx
            .plugin_root
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        "VELLUM_USER_DIR" => ctx
            .user_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        "VELLUM_PROJECT_DIR" => ctx
            .project_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        other => env::var(other).unwrap_or_default(),
    }
}
