//! # Wraith — user-activity emulation agent
//!
//! Replays a scripted timeline of simulated user behavior on this
//! endpoint: shell commands, web browsing, whatever the timeline calls
//! for. Edit the timeline file while the agent runs and it restarts the
//! handlers with the new script.
//!
//! Usage:
//!   wraith                                   # use ~/.wraith/config.toml
//!   wraith --timeline config/timeline.json   # replay a specific timeline
//!   wraith --verbose

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wraith_agent::Orchestrator;
use wraith_core::WraithConfig;
use wraith_invokers::InvokerRegistry;

#[derive(Parser)]
#[command(
    name = "wraith",
    version,
    about = "👻 Wraith — user-activity emulation agent"
)]
struct Cli {
    /// Path to the client config (default: ~/.wraith/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Timeline file to replay (overrides the config)
    #[arg(short, long)]
    timeline: Option<String>,

    /// Report log path (overrides the config)
    #[arg(long)]
    report_log: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => WraithConfig::load_from(Path::new(path))?,
        None => WraithConfig::load()?,
    };
    if let Some(timeline) = cli.timeline {
        config.timeline_path = timeline;
    }
    if let Some(report_log) = cli.report_log {
        config.report_log = report_log;
    }

    println!("👻 Wraith v{}", env!("CARGO_PKG_VERSION"));
    println!("   📜 Timeline:   {}", config.timeline_path);
    println!("   🧾 Report log: {}", config.report_log);
    println!();

    let registry = InvokerRegistry::with_defaults();
    let mut orchestrator = Orchestrator::new(config, registry)?;

    // Ctrl-C cancels the root token; handlers wind down cooperatively
    let token = orchestrator.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received; shutting down");
            token.cancel();
        }
    });

    orchestrator.run().await?;
    Ok(())
}
