use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use warpio_hooks::{config::HookConfig, handler};

/// Lifecycle hooks for Warpio orchestration tracking.
///
/// Each subcommand handles one lifecycle point: it reads a single event
/// envelope from stdin, writes a single response object to stdout, and exits
/// 0. Observation never blocks the observed workflow.
#[derive(Parser)]
#[command(name = "warpio-hooks", version)]
struct Cli {
    #[command(subcommand)]
    lifecycle: Lifecycle,
}

#[derive(Subcommand)]
enum Lifecycle {
    /// Log the tool invocation before it runs
    PreToolUse,
    /// Track performance metrics after a tool completes
    PostToolUse,
    /// Aggregate subagent results at completion
    SubagentStop,
    /// Write a resumable checkpoint before context compaction
    PreCompact,
    /// Write the session summary at session end
    Stop,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = HookConfig::from_env();
    let mut stdin = std::io::stdin().lock();

    let response = match cli.lifecycle {
        Lifecycle::PreToolUse => handler::pre_tool_use(&config, &mut stdin),
        Lifecycle::PostToolUse => handler::post_tool_use(&config, &mut stdin),
        Lifecycle::SubagentStop => handler::subagent_stop(&config, &mut stdin),
        Lifecycle::PreCompact => handler::pre_compact(&config, &mut stdin),
        Lifecycle::Stop => handler::stop(&config, &mut stdin),
    };

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
