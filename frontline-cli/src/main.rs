//! FRONTLINE CLI - Command-line interface
//!
//! Commands:
//! - simulate: Play automated games on a scenario and report outcomes
//! - scenario: Write the built-in scenario as JSON

mod simulate;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use frontline_core::Scenario;

#[derive(Parser)]
#[command(name = "frontline")]
#[command(about = "FRONTLINE hex battle rules engine")]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play automated games and report win rates
    Simulate(simulate::SimulateArgs),
    /// Write the built-in scenario to a file
    Scenario {
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate::run(args, cli.seed),
        Commands::Scenario { output } => {
            let scenario = Scenario::default();
            scenario
                .save(&output)
                .with_context(|| format!("exporting scenario '{}'", scenario.name))?;
            tracing::info!("Wrote scenario '{}' to {}", scenario.name, output.display());
            Ok(())
        }
    }
}
