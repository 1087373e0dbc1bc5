//! Adapts a plugin's `ParsedCommand` into the host-facing `SlashCommand`
//! shape, resolving name collisions by namespacing with the plugin name.

use std::collections::HashSet;

use crate::command::{ARGUMENTS_TOKEN, ParsedCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommandKind {
    Builtin,
    Plugin,
    Mcp,
    User,
}

/// Context a `SlashCommand` executes with.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub raw_args: String,
    pub allowed_tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub message: String,
    pub effective_tools: Vec<String>,
    pub source: std::path::PathBuf,
}

/// The host-facing command shape a plugin command is adapted into.
#[derive(Debug, Clone)]
pub struct SlashCommand {
    pub name: String,
    pub description: String,
    pub kind: SlashCommandKind,
    pub category: &'static str,
    pub source_plugin: String,
    pub argument_hint: Option<String>,
    parsed: ParsedCommand,
}

impl SlashCommand {
    /// `$ARGUMENTS` substitution, tool-filter resolution, and metadata
    /// assembly. Tool filtering is resolved at execution time, not at
    /// registration time: a command's `allowed_tools` only narrows
    /// whatever the *current* execution context exposes, and the result
    /// preserves `allowed_tools`' order, not the context's.
    pub fn execute(&self, ctx: &ExecutionContext) -> ExecutionOutcome {
        let message = if self.parsed.has_arguments_variable {
            self.parsed
                .content
                .replace(ARGUMENTS_TOKEN, ctx.raw_args.trim())
        } else {
            self.parsed.content.clone()
        };

        let effective_tools = match &self.parsed.allowed_tools {
            Some(allowed) => allowed
                .iter()
                .filter(|t| ctx.allowed_tools.contains(t))
                .cloned()
                .collect(),
            None => ctx.allowed_tools.clone(),
        };

        ExecutionOutcome {
            message,
            effective_tools,
            source: self.parsed.file_path.clone(),
        }
    }
}

/// Adapt a `ParsedCommand` into a `SlashCommand`, namespacing its name
/// as `${plugin_name}:${bare_name}` when `existing` already contains
/// the bare name.
pub fn adapt_command(
    parsed: ParsedCommand,
    plugin_name: &str,
    existing: &HashSet<String>,
) -> SlashCommand {
    let name = if existing.contains(&parsed.name) {
        format!("{plugin_name}:{}", parsed.name)
    } else {
        parsed.name.clone()
    };

    SlashCommand {
        name,
        description: parsed.description.clone(),
        kind: SlashCommandKind::Plugin,
        category: "plugin",
        source_plugin: plugin_name.to_string(),
        argument_hint: parsed.argument_hint.clone(),
        parsed,
    }
}
