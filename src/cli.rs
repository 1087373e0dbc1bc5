//! Subcommand definitions for the `vellum` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vellum", about = "Plugin subsystem CLI for an AI-assistant agent")]
pub struct Cli {
    /// Project root to scope plugin discovery to (defaults to the current directory).
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover and load every plugin visible from here, reporting successes and failures.
    Plugins {
        #[command(subcommand)]
        action: PluginsAction,
    },
    /// Inspect or change a plugin's trust level.
    Trust {
        #[command(subcommand)]
        action: TrustAction,
    },
    /// Fire a lifecycle hook event against every loaded plugin's hooks.
    RunHooks {
        /// Lifecycle event name, e.g. `pre-tool-use`, `session-start`.
        event: String,
        /// JSON input payload for the event (defaults to `{}`).
        #[arg(long, default_value = "{}")]
        input: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum PluginsAction {
    /// List every successfully loaded plugin.
    List,
    /// List every plugin that failed to load, with its error.
    Failed,
}

#[derive(Debug, Subcommand)]
pub enum TrustAction {
    /// Show whether a plugin is trusted.
    Show { name: String },
    /// Grant `trusted` with every action kind allowed.
    Grant { name: String },
    /// Revoke a plugin's trust record.
    Revoke { name: String },
}
