//! Scenario replay runner
//!
//! Seeds an engine from a scenario file, replays its events and prints one
//! JSON report per event.

use clap::Parser;
use std::path::PathBuf;
use territory_guard::core::config::ProtectionConfig;
use territory_guard::core::error::Result;
use territory_guard::engine::ProtectionEngine;
use territory_guard::host::{LogNotifier, MemoryTerrain};
use territory_guard::scenario::Scenario;

/// Territory Guard - replay host events against a protection config
#[derive(Parser, Debug)]
#[command(name = "territory-guard")]
#[command(about = "Replay block events through the protection engine and print verdicts")]
struct Args {
    /// Protection config (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scenario to replay (TOML)
    #[arg(long)]
    scenario: PathBuf,

    /// Pretty-print each report
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "territory_guard=debug" } else { "territory_guard=info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => ProtectionConfig::load(path)?,
        None => ProtectionConfig::default(),
    };
    let scenario = Scenario::load(&args.scenario)?;

    let mut engine = ProtectionEngine::from_config(config, MemoryTerrain::new(), LogNotifier);
    if let Some(problem) = engine.system_error() {
        tracing::warn!("Config rejected, every event will be cancelled: {}", problem);
    }

    let mut subjects = scenario.seed(&mut engine)?;
    tracing::info!(
        "Seeded {} subjects, replaying {} events",
        subjects.len(),
        scenario.events.len()
    );

    for report in scenario.replay(&mut engine, &mut subjects) {
        let line = if args.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{}", line);
    }

    Ok(())
}
