//! # veid CLI entry point
//!
//! Parses command-line arguments, installs logging, loads configuration
//! and dispatches to the subcommand handlers in the library.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use veid_cli::config::{run_config, ConfigArgs, VeidConfig};
use veid_cli::disclosure::{run_prove, run_request, run_verify, ProveArgs, RequestArgs, VerifyArgs};
use veid_cli::score::{run_score, ScoreArgs};

/// VEID identity layer: composite scoring and selective disclosure.
#[derive(Parser, Debug)]
#[command(name = "veid", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: $VEID_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute a composite identity score from an inputs file.
    Score(ScoreArgs),

    /// Configuration operations.
    Config(ConfigArgs),

    /// Create a selective-disclosure request.
    Request(RequestArgs),

    /// Generate a proof answering a request.
    Prove(ProveArgs),

    /// Verify a proof. Exits with 2 when the proof is invalid.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli.command, cli.config.as_deref()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Run `command`. `config check` validates the file itself, so only the
/// engine commands load configuration up front.
fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<u8> {
    let load = || VeidConfig::load(config_path);
    match command {
        Commands::Config(args) => run_config(&args, config_path),
        Commands::Score(args) => run_score(&args, &load()?),
        Commands::Request(args) => run_request(&args, &load()?),
        Commands::Prove(args) => run_prove(&args, &load()?),
        Commands::Verify(args) => run_verify(&args, &load()?),
    }
}
