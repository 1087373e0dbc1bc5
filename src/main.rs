//! `vellum` - plugin subsystem CLI.
//!
//! Thin binary entry point: parses arguments, wires up the plugin
//! manager (which owns the trust store) as the composition root, then
//! dispatches to the requested subcommand. No module below this one
//! reaches for a global subscriber or a lazily-initialized singleton.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vellum_config::PluginSubsystemConfig;
use vellum_plugins::{ManagerContext, PluginManager, TrustStoreBridge};

use cli::{Cli, Commands, PluginsAction, TrustAction};

fn main() -> std::process::ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Error: failed to build Tokio runtime: {error}");
            return std::process::ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:?}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let project_dir = cli
        .project_dir
        .or_else(|| std::env::current_dir().ok())
        .context("failed to determine project directory")?;

    let config = PluginSubsystemConfig {
        load: vellum_config::LoadConfig {
            eager_load: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut manager = PluginManager::new(
        config,
        ManagerContext {
            project_dir: Some(project_dir.clone()),
        },
        trust_store_path()?,
    );
    manager.initialize().await;

    match cli.command {
        Commands::Plugins { action } => handle_plugins(&manager, action),
        Commands::Trust { action } => handle_trust(&mut manager, action),
        Commands::RunHooks { event, input } => handle_run_hooks(&manager, &event, &input).await,
    }
}

fn trust_store_path() -> Result<std::path::PathBuf> {
    let home = dirs::home_dir().context("failed to determine home directory")?;
    Ok(home.join(".vellum").join("trust-store.json"))
}

fn handle_plugins(manager: &PluginManager, action: PluginsAction) -> Result<()> {
    match action {
        PluginsAction::List => {
            for plugin in manager.get_plugins() {
                println!("{}\t{}\t{:?}", plugin.name, plugin.manifest.version, plugin.source);
            }
        }
        PluginsAction::Failed => {
            for failure in manager.get_failed_plugins() {
                println!("{}\t{}\t{}", failure.name, failure.path.display(), failure.error);
            }
        }
    }
    Ok(())
}

fn handle_trust(manager: &mut PluginManager, action: TrustAction) -> Result<()> {
    match action {
        TrustAction::Show { name } => {
            println!("{}", manager.trust_store().is_trusted(&name));
        }
        TrustAction::Grant { name } => {
            let store = manager.trust_store_mut();
            store.auto_trust(&name, current_unix_time());
            store.save().context("failed to persist trust store")?;
            println!("granted trust to {name}");
        }
        TrustAction::Revoke { name } => {
            let store = manager.trust_store_mut();
            store.revoke(&name);
            store.save().context("failed to persist trust store")?;
            println!("revoked trust for {name}");
        }
    }
    Ok(())
}

async fn handle_run_hooks(manager: &PluginManager, event: &str, input: &str) -> Result<()> {
    let event = parse_event(event)?;
    let input: serde_json::Value = serde_json::from_str(input).context("--input must be valid JSON")?;

    let bridge = TrustStoreBridge::new(manager.trust_store());

    let result = manager.run_hooks(event, input, &bridge).await;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "allowed": result.allowed,
        "final_input": result.final_input,
        "total_execution_time_ms": result.total_execution_time_ms,
    }))?);
    Ok(())
}

fn parse_event(raw: &str) -> Result<vellum_config::HookEvent> {
    use vellum_config::HookEvent;
    match raw {
        "session-start" => Ok(HookEvent::SessionStart),
        "session-end" => Ok(HookEvent::SessionEnd),
        "before-model" => Ok(HookEvent::BeforeModel),
        "after-model" => Ok(HookEvent::AfterModel),
        "pre-tool-use" => Ok(HookEvent::PreToolUse),
        "post-tool-result" => Ok(HookEvent::PostToolResult),
        "before-agent" => Ok(HookEvent::BeforeAgent),
        "after-agent" => Ok(HookEvent::AfterAgent),
        "on-error" => Ok(HookEvent::OnError),
        "on-approval" => Ok(HookEvent::OnApproval),
        "before-commit" => Ok(HookEvent::BeforeCommit),
        other => anyhow::bail!("unknown hook event '{other}'"),
    }
}

fn current_unix_time() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}
