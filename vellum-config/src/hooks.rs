//! Hook rule schema: the typed shape of a plugin's `hooks.json`.
//!
//! Generalizes the five-event, command-only lifecycle hook config used
//! elsewhere in this lineage to the eleven lifecycle events and three
//! action kinds plugins can hook into, while keeping the same
//! validate-then-compile-matcher idiom.

use anyhow::{Context, Result, ensure};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::executor::{MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};

/// Every point in the agent loop a plugin may hook into.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    SessionStart,
    SessionEnd,
    BeforeModel,
    AfterModel,
    PreToolUse,
    PostToolResult,
    BeforeAgent,
    AfterAgent,
    OnError,
    OnApproval,
    BeforeCommit,
}

impl HookEvent {
    /// Events whose default fail behavior is `closed` rather than `open`,
    /// because letting a hook error through silently would mean running
    /// an unreviewed tool call or an unreviewed model turn.
    pub fn defaults_fail_closed(self) -> bool {
        matches!(self, HookEvent::PreToolUse | HookEvent::BeforeModel)
    }
}

/// The kind of side effect a hook action performs; also used by the
/// trust store to scope which kinds of action a plugin may take.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Command,
    Script,
    Prompt,
}

/// What a matched hook rule actually does.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum HookAction {
    Command {
        command: String,
        #[serde(default)]
        args: Option<Vec<String>>,
    },
    Script {
        path: String,
        #[serde(default)]
        interpreter: Option<String>,
    },
    Prompt {
        content: String,
    },
}

impl HookAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            HookAction::Command { .. } => ActionKind::Command,
            HookAction::Script { .. } => ActionKind::Script,
            HookAction::Prompt { .. } => ActionKind::Prompt,
        }
    }

    /// Short human-readable label used to build a hook's `hook_name`
    /// (e.g. `"pre_tool_use[0]:command:git status"`).
    pub fn detail(&self) -> String {
        match self {
            HookAction::Command { command, .. } => command.clone(),
            HookAction::Script { path, .. } => std::path::Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone()),
            HookAction::Prompt { .. } => "prompt".to_string(),
        }
    }
}

/// Whether a hook's runtime error should be treated as a denial
/// (`closed`) or swallowed with a warning (`open`).
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailBehavior {
    Open,
    Closed,
}

/// One entry in a plugin's `hooks.json`.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HookRule {
    pub event: HookEvent,
    pub action: HookAction,
    #[serde(default)]
    pub matcher: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub fail_behavior: Option<FailBehavior>,
}

fn default_timeout_ms() -> u64 {
    crate::executor::DEFAULT_TIMEOUT_MS
}

impl HookRule {
    /// The fail behavior that actually applies at runtime: the rule's
    /// explicit choice if set, else the event's default.
    pub fn effective_fail_behavior(&self) -> FailBehavior {
        self.fail_behavior.unwrap_or(if self.event.defaults_fail_closed() {
            FailBehavior::Closed
        } else {
            FailBehavior::Open
        })
    }

    /// Compile `matcher` into a regex anchored at both ends, following
    /// the same "empty or `*` means match everything" convention used
    /// by lifecycle hook matchers. Returns `None` when the rule matches
    /// unconditionally.
    pub fn compiled_matcher(&self) -> Result<Option<Regex>> {
        compile_matcher(self.matcher.as_deref())
    }

    pub fn validate(&self, context: &str) -> Result<()> {
        if let Some(pattern) = self.matcher.as_deref() {
            validate_matcher(pattern)
                .with_context(|| format!("invalid matcher in {context} -> matcher"))?;
        }

        ensure!(
            (MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms),
            "{context}.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}, got {}",
            self.timeout_ms
        );

        match &self.action {
            HookAction::Command { command, .. } => ensure!(
                !command.trim().is_empty(),
                "{context}.action must specify a non-empty command"
            ),
            HookAction::Script { path, .. } => ensure!(
                !path.trim().is_empty(),
                "{context}.action must specify a non-empty script path"
            ),
            HookAction::Prompt { content } => ensure!(
                !content.is_empty(),
                "{context}.action must specify non-empty prompt content"
            ),
        }

        Ok(())
    }
}

/// Compile an optional matcher pattern the same way a `HookRule`'s
/// matcher is compiled, shared so discovery-time validation and
/// executor-time matching stay in lockstep.
pub fn compile_matcher(pattern: Option<&str>) -> Result<Option<Regex>> {
    let Some(pattern) = pattern else {
        return Ok(None);
    };
    let trimmed = pattern.trim();
    if trimmed.is_empty() || trimmed == "*" {
        return Ok(None);
    }

    let anchored = format!("^(?:{trimmed})$");
    let regex =
        Regex::new(&anchored).with_context(|| format!("failed to compile hook matcher regex: {pattern}"))?;
    Ok(Some(regex))
}

fn validate_matcher(pattern: &str) -> Result<()> {
    compile_matcher(Some(pattern))?;
    Ok(())
}

/// Parse and validate a plugin's `hooks.json` contents (a JSON array of
/// `HookRule`). Every rule is individually validated; the first failure
/// aborts parsing with its rule index in the error context.
pub fn parse_hooks_json(content: &str) -> Result<Vec<HookRule>> {
    let rules: Vec<HookRule> =
        serde_json::from_str(content).context("hooks.json must be a JSON array of hook rules")?;

    for (index, rule) in rules.iter().enumerate() {
        rule.validate(&format!("hooks[{index}]"))?;
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_star_matcher_match_everything() {
        assert!(compile_matcher(None).unwrap().is_none());
        assert!(compile_matcher(Some("")).unwrap().is_none());
        assert!(compile_matcher(Some("*")).unwrap().is_none());
    }

    #[test]
    fn literal_matcher_is_anchored() {
        let regex = compile_matcher(Some("write_file")).unwrap().unwrap();
        assert!(regex.is_match("write_file"));
        assert!(!regex.is_match("write_file_extra"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = compile_matcher(Some("(unclosed")).unwrap_err();
        assert!(err.to_string().contains("failed to compile"));
    }

    #[test]
    fn pre_tool_use_defaults_fail_closed() {
        assert!(HookEvent::PreToolUse.defaults_fail_closed());
        assert!(HookEvent::BeforeModel.defaults_fail_closed());
        assert!(!HookEvent::SessionStart.defaults_fail_closed());
    }

    #[test]
    fn effective_fail_behavior_honors_explicit_choice() {
        let rule = HookRule {
            event: HookEvent::PreToolUse,
            action: HookAction::Prompt {
                content: "x".into(),
            },
            matcher: None,
            timeout_ms: 1_000,
            fail_behavior: Some(FailBehavior::Open),
        };
        assert_eq!(rule.effective_fail_behavior(), FailBehavior::Open);

        let default_rule = HookRule {
            fail_behavior: None,
            ..rule
        };
        assert_eq!(default_rule.effective_fail_behavior(), FailBehavior::Closed);
    }

    #[test]
    fn timeout_out_of_bounds_fails_validation() {
        let rule = HookRule {
            event: HookEvent::SessionStart,
            action: HookAction::Prompt {
                content: "x".into(),
            },
            matcher: None,
            timeout_ms: 50,
            fail_behavior: None,
        };
        assert!(rule.validate("hooks[0]").is_err());
    }

    #[test]
    fn parse_hooks_json_parses_all_event_and_action_variants() {
        let content = r#"[
            {"event": "session_start", "action": {"type": "prompt", "content": "hi"}},
            {"event": "pre_tool_use", "action": {"type": "command", "command": "echo ok"}, "matcher": "write_file"},
            {"event": "post_tool_result", "action": {"type": "script", "path": "check.py"}}
        ]"#;
        let rules = parse_hooks_json(content).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1].action.kind(), ActionKind::Command);
        assert_eq!(rules[2].action.detail(), "check.py");
    }

    #[test]
    fn parse_hooks_json_rejects_empty_command() {
        let content = r#"[{"event": "session_start", "action": {"type": "command", "command": ""}}]"#;
        assert!(parse_hooks_json(content).is_err());
    }

    #[test]
    fn parse_hooks_json_rejects_unknown_rule_key() {
        let content = r#"[{"event": "session_start", "action": {"type": "prompt", "content": "hi"}, "bogus": true}]"#;
        assert!(parse_hooks_json(content).is_err());
    }

    #[test]
    fn parse_hooks_json_rejects_unknown_action_key() {
        let content = r#"[{"event": "session_start", "action": {"type": "prompt", "content": "hi", "bogus": true}}]"#;
        assert!(parse_hooks_json(content).is_err());
    }
}
