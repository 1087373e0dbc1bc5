//! The hook execution engine: matches lifecycle rules against an
//! event, enforces permission and trust policy, races each action
//! against its timeout, and threads modified input through chained
//! hooks with short-circuit-on-denial semantics.
//!
//! Process spawning follows the teacher's `tokio::process::Command`
//! idiom used throughout its own subprocess-running code (git clone in
//! the plugin loader, LSP/MCP server launches); the `HOOK_INPUT`
//! environment variable replaces stdin piping because hook scripts in
//! this subsystem are expected to be short-lived, single-shot checks
//! rather than long-running duplex processes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use serde_json::Value;
use tokio::process::Command;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use vellum_config::{ActionKind, FailBehavior, HookAction, HookEvent, HookRule};

use crate::error::HookExecutionError;

/// Anything able to decide whether a plugin may perform a given kind
/// of action for a given event. The default, trust-store-backed
/// implementation lives in `crate::trust`.
pub trait PermissionBridge: Send + Sync {
    fn check_permission(&self, plugin_name: &str, kind: ActionKind, event: HookEvent) -> bool;
}

/// Grants every permission check unconditionally; used by tests and by
/// `LoadConfig::auto_trust`.
pub struct AllowAllBridge;

impl PermissionBridge for AllowAllBridge {
    fn check_permission(&self, _plugin_name: &str, _kind: ActionKind, _event: HookEvent) -> bool {
        true
    }
}

/// A hook rule bound to the plugin it came from and its declaration
/// order, so the executor can build a stable `hook_name` and query the
/// permission bridge with the right plugin identity.
#[derive(Debug, Clone)]
pub struct BoundHookRule {
    pub plugin_name: String,
    pub plugin_root: PathBuf,
    pub index: usize,
    pub rule: HookRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HookResult {
    pub allowed: bool,
    pub modified_input: Option<Value>,
    pub execution_time_ms: u64,
    pub hook_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HooksExecutionResult {
    pub allowed: bool,
    pub final_input: Value,
    pub results: Vec<HookResult>,
    pub total_execution_time_ms: u64,
}

pub struct HookExecutor<'a> {
    bridge: &'a dyn PermissionBridge,
    cancellation: CancellationToken,
}

impl<'a> HookExecutor<'a> {
    /// Owns a fresh, never-shared cancellation token: this executor's
    /// run can't be cancelled from outside it.
    pub fn new(bridge: &'a dyn PermissionBridge) -> Self {
        Self::with_cancellation(bridge, CancellationToken::new())
    }

    /// Shares `cancellation` with the caller, so tripping it (e.g. via
    /// `PluginManager::cancel_all`) aborts this run from the next poll
    /// point on, tearing down whatever child process is in flight.
    pub fn with_cancellation(bridge: &'a dyn PermissionBridge, cancellation: CancellationToken) -> Self {
        Self { bridge, cancellation }
    }

    pub async fn execute(
        &self,
        event: HookEvent,
        input: Value,
        rules: &[BoundHookRule],
    ) -> HooksExecutionResult {
        let start = Instant::now();
        let mut current_input = input;
        let mut results = Vec::new();

        let matching: Vec<&BoundHookRule> = rules
            .iter()
            .filter(|bound| bound.rule.event == event)
            .filter(|bound| matches_rule(&bound.rule, &current_input))
            .collect();

        for bound in matching {
            let hook_start = Instant::now();
            let hook_name = hook_name(event, bound.index, &bound.rule.action);
            let kind = bound.rule.action.kind();

            if self.cancellation.is_cancelled() {
                results.push(HookResult {
                    allowed: false,
                    modified_input: None,
                    execution_time_ms: elapsed_ms(hook_start),
                    hook_name,
                });
                return HooksExecutionResult {
                    allowed: false,
                    final_input: current_input,
                    results,
                    total_execution_time_ms: elapsed_ms(start),
                };
            }

            if !self.bridge.check_permission(&bound.plugin_name, kind, event) {
                results.push(HookResult {
                    allowed: false,
                    modified_input: None,
                    execution_time_ms: elapsed_ms(hook_start),
                    hook_name,
                });
                return HooksExecutionResult {
                    allowed: false,
                    final_input: current_input,
                    results,
                    total_execution_time_ms: elapsed_ms(start),
                };
            }

            let timeout_ms = bound.rule.timeout_ms;
            let dispatch = dispatch_action(
                &bound.rule.action,
                &current_input,
                timeout_ms,
                &bound.plugin_root,
                &self.cancellation,
            )
            .await;

            let (allowed, modified_input) = match dispatch {
                Ok(outcome) => (outcome.allowed, outcome.modified_input),
                Err(HookExecutionError::HookAborted { .. }) => {
                    results.push(HookResult {
                        allowed: false,
                        modified_input: None,
                        execution_time_ms: elapsed_ms(hook_start),
                        hook_name,
                    });
                    return HooksExecutionResult {
                        allowed: false,
                        final_input: current_input,
                        results,
                        total_execution_time_ms: elapsed_ms(start),
                    };
                }
                Err(_) => {
                    let effective = bound.rule.effective_fail_behavior();
                    match effective {
                        FailBehavior::Closed => (false, None),
                        FailBehavior::Open => {
                            warn!(hook = %hook_name, "hook action failed, fail-open policy applies");
                            (true, None)
                        }
                    }
                }
            };

            if let Some(modified) = modified_input.clone() {
                current_input = modified;
            }

            let denied = !allowed;
            results.push(HookResult {
                allowed,
                modified_input,
                execution_time_ms: elapsed_ms(hook_start),
                hook_name,
            });

            if denied {
                return HooksExecutionResult {
                    allowed: false,
                    final_input: current_input,
                    results,
                    total_execution_time_ms: elapsed_ms(start),
                };
            }
        }

        HooksExecutionResult {
            allowed: true,
            final_input: current_input,
            results,
            total_execution_time_ms: elapsed_ms(start),
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

fn hook_name(event: HookEvent, index: usize, action: &HookAction) -> String {
    format!("{event:?}[{index}]:{:?}:{}", action.kind(), action.detail())
}

/// Stringify `input` for matcher comparison: a JSON string value is
/// used verbatim (no surrounding quotes); everything else is
/// JSON-serialized.
fn stringify_input(input: &Value) -> String {
    match input {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn matches_rule(rule: &HookRule, input: &Value) -> bool {
    match rule.compiled_matcher() {
        Ok(Some(regex)) => regex.is_match(&stringify_input(input)),
        Ok(None) => true,
        Err(_) => false,
    }
}

struct ActionOutcome {
    allowed: bool,
    modified_input: Option<Value>,
}

async fn dispatch_action(
    action: &HookAction,
    current_input: &Value,
    timeout_ms: u64,
    plugin_root: &Path,
    cancellation: &CancellationToken,
) -> Result<ActionOutcome, HookExecutionError> {
    match action {
        HookAction::Prompt { content } => Ok(dispatch_prompt(content, current_input)),
        HookAction::Command { command, args } => {
            run_process(
                command,
                args.as_deref().unwrap_or(&[]),
                current_input,
                timeout_ms,
                plugin_root,
                cancellation,
            )
            .await
        }
        HookAction::Script { path, interpreter } => {
            let (program, mut full_args) = script_invocation(path, interpreter.as_deref());
            full_args.push(expand_script_path(path, plugin_root));
            run_process(&program, &full_args, current_input, timeout_ms, plugin_root, cancellation).await
        }
    }
}

fn dispatch_prompt(content: &str, current_input: &Value) -> ActionOutcome {
    let modified = match current_input {
        Value::Object(map) => {
            let mut merged = map.clone();
            merged.insert("injected_prompt".to_string(), Value::String(content.to_string()));
            Value::Object(merged)
        }
        other => serde_json::json!({
            "original": other,
            "injected_prompt": content,
        }),
    };
    ActionOutcome {
        allowed: true,
        modified_input: Some(modified),
    }
}

fn expand_script_path(path: &str, plugin_root: &Path) -> String {
    if Path::new(path).is_absolute() {
        path.to_string()
    } else {
        plugin_root.join(path).to_string_lossy().into_owned()
    }
}

fn script_invocation(path: &str, interpreter: Option<&str>) -> (String, Vec<String>) {
    if let Some(interpreter) = interpreter {
        return (interpreter.to_string(), Vec::new());
    }
    let extension = Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("");
    let program = match extension {
        "py" => "python3",
        "js" | "mjs" => "node",
        "sh" => "sh",
        "ps1" => "pwsh",
        _ if cfg!(windows) => "cmd",
        _ => "sh",
    };
    (program.to_string(), Vec::new())
}

enum ProcessCompletion {
    Finished(std::process::ExitStatus),
    TimedOut,
    Cancelled,
}

async fn run_process(
    program: &str,
    args: &[String],
    current_input: &Value,
    timeout_ms: u64,
    plugin_root: &Path,
    cancellation: &CancellationToken,
) -> Result<ActionOutcome, HookExecutionError> {
    let hook_input = serde_json::to_string(current_input).unwrap_or_default();

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(plugin_root)
        .env("HOOK_INPUT", hook_input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| HookExecutionError::HookExecutionFailed {
        hook_name: program.to_string(),
        event: HookEvent::PreToolUse,
        message: source.to_string(),
    })?;

    // Drain stdout/stderr concurrently with the wait so a chatty child
    // can't deadlock on a full pipe while we're only watching `wait()`.
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = tokio::io::AsyncReadExt::read_to_end(pipe, &mut buf).await;
        }
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = tokio::io::AsyncReadExt::read_to_end(pipe, &mut buf).await;
        }
        buf
    });

    // Every spawned action races its own exit against the rule's
    // timeout and the executor's shared cancellation token; whichever
    // fires first kills and reaps the child on every exit path.
    let completion = tokio::select! {
        status = child.wait() => {
            match status {
                Ok(status) => ProcessCompletion::Finished(status),
                Err(source) => {
                    stdout_task.abort();
                    stderr_task.abort();
                    return Err(HookExecutionError::HookExecutionFailed {
                        hook_name: program.to_string(),
                        event: HookEvent::PreToolUse,
                        message: source.to_string(),
                    });
                }
            }
        }
        _ = sleep(Duration::from_millis(timeout_ms)) => ProcessCompletion::TimedOut,
        _ = cancellation.cancelled() => ProcessCompletion::Cancelled,
    };

    match completion {
        ProcessCompletion::Finished(status) => {
            let stdout = stdout_task.await.unwrap_or_default();
            let _stderr = stderr_task.await.unwrap_or_default();
            let allowed = status.success();
            let modified_input = if allowed {
                let stdout = String::from_utf8_lossy(&stdout);
                serde_json::from_str(stdout.trim()).ok()
            } else {
                None
            };
            Ok(ActionOutcome {
                allowed,
                modified_input,
            })
        }
        ProcessCompletion::TimedOut => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(HookExecutionError::HookTimeout {
                hook_name: program.to_string(),
                event: HookEvent::PreToolUse,
                timeout_ms,
            })
        }
        ProcessCompletion::Cancelled => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(HookExecutionError::HookAborted {
                hook_name: program.to_string(),
                event: HookEvent::PreToolUse,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_config::HookEvent;

    fn rule(event: HookEvent, action: HookAction, matcher: Option<&str>) -> HookRule {
        HookRule {
            event,
            action,
            matcher: matcher.map(|m| m.to_string()),
            timeout_ms: 5_000,
            fail_behavior: None,
        }
    }

    fn bound(plugin: &str, index: usize, rule: HookRule) -> BoundHookRule {
        BoundHookRule {
            plugin_name: plugin.to_string(),
            plugin_root: PathBuf::from("."),
            index,
            rule,
        }
    }

    #[tokio::test]
    async fn matcher_filters_to_matching_rule_only() {
        let rules = vec![
            bound(
                "a",
                0,
                rule(
                    HookEvent::PreToolUse,
                    HookAction::Prompt { content: "A".into() },
                    Some("write_file"),
                ),
            ),
            bound(
                "a",
                1,
                rule(
                    HookEvent::PreToolUse,
                    HookAction::Prompt { content: "B".into() },
                    Some("read_file"),
                ),
            ),
        ];

        let executor = HookExecutor::new(&AllowAllBridge);
        let result = executor
            .execute(
                HookEvent::PreToolUse,
                serde_json::json!({"tool_name": "write_file"}),
                &rules,
            )
            .await;

        assert_eq!(result.results.len(), 1);
        assert_eq!(result.final_input["injected_prompt"], "A");
    }

    struct DenyAllBridge;
    impl PermissionBridge for DenyAllBridge {
        fn check_permission(&self, _plugin_name: &str, _kind: ActionKind, _event: HookEvent) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn short_circuits_on_denial() {
        let rules = vec![
            bound("a", 0, rule(HookEvent::PreToolUse, HookAction::Prompt { content: "A".into() }, None)),
            bound("a", 1, rule(HookEvent::PreToolUse, HookAction::Prompt { content: "B".into() }, None)),
            bound("a", 2, rule(HookEvent::PreToolUse, HookAction::Prompt { content: "C".into() }, None)),
        ];

        let executor = HookExecutor::new(&DenyAllBridge);
        let result = executor
            .execute(HookEvent::PreToolUse, serde_json::json!({}), &rules)
            .await;

        assert!(!result.allowed);
        assert_eq!(result.results.len(), 1);
    }

    #[tokio::test]
    async fn no_matching_rules_allows_and_returns_empty_results() {
        let executor = HookExecutor::new(&AllowAllBridge);
        let result = executor
            .execute(HookEvent::SessionStart, serde_json::json!({}), &[])
            .await;
        assert!(result.allowed);
        assert!(result.results.is_empty());
    }

    #[tokio::test]
    async fn prompt_chains_into_next_rule_input() {
        let rules = vec![
            bound("a", 0, rule(HookEvent::SessionStart, HookAction::Prompt { content: "first".into() }, None)),
            bound("a", 1, rule(HookEvent::SessionStart, HookAction::Prompt { content: "second".into() }, None)),
        ];
        let executor = HookExecutor::new(&AllowAllBridge);
        let result = executor
            .execute(HookEvent::SessionStart, serde_json::json!({}), &rules)
            .await;
        assert!(result.allowed);
        assert_eq!(result.final_input["injected_prompt"], "second");
        assert_eq!(result.results[0].modified_input.as_ref().unwrap()["injected_prompt"], "first");
        assert_eq!(result.results[1].modified_input.as_ref().unwrap()["injected_prompt"], "second");
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_command_action() {
        let rules = vec![bound(
            "a",
            0,
            rule(
                HookEvent::PreToolUse,
                HookAction::Command {
                    command: "sleep".into(),
                    args: Some(vec!["5".into()]),
                },
                None,
            ),
        )];

        let cancellation = CancellationToken::new();
        let executor = HookExecutor::with_cancellation(&AllowAllBridge, cancellation.clone());

        let execute_fut = executor.execute(HookEvent::PreToolUse, serde_json::json!({}), &rules);
        let cancel_fut = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancellation.cancel();
        };

        let (result, _) = tokio::join!(execute_fut, cancel_fut);

        assert!(!result.allowed);
        assert_eq!(result.results.len(), 1);
    }

    #[test]
    fn stringify_matches_string_values_verbatim() {
        assert_eq!(stringify_input(&Value::String("write_file".into())), "write_file");
        assert_eq!(stringify_input(&serde_json::json!({"a": 1})), "{\"a\":1}");
    }
}
