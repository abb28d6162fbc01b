//! Portcullis CLI — admission-time image attestation verification.
//!
//! Check workload manifests against a remote attestation store and a
//! local directory of trusted keys.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

/// Portcullis — admission-time image attestation verification.
///
/// Decides whether every container image in a workload carries a
/// cryptographically valid attestation recorded in the occurrence
/// store. Named after the castle gate that only rises for vetted
/// visitors.
#[derive(Parser)]
#[command(name = "portcullis", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (repeat for more detail: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output logs as JSON (for machine consumption).
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Verify a workload manifest against the attestation store.
    Check(commands::check::CheckArgs),
    /// List the occurrences recorded in the attestation store.
    Occurrences(commands::occurrences::OccurrencesArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Check(args) => commands::check::execute(args).await,
        Commands::Occurrences(args) => commands::occurrences::execute(args).await,
    }
}
