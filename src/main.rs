//! Binary entry point for aws-cleanup.
//!
//! This binary provides the CLI interface for the AWS cleanup sweeps.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use aws_cleanup::config::CleanupConfig;
use aws_cleanup::observability;
use aws_cleanup::{DESCRIPTION, SERVICE, VERSION};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{CloudwatchArgs, cmd_cloudwatch, cmd_version};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Instrument;

/// aws-cleanup - Cleaning AWS.
#[derive(Parser)]
#[command(name = "aws-cleanup")]
#[command(author, version, about = DESCRIPTION, long_about = None)]
struct Cli {
    /// Enable debug logging.
    #[arg(short = 'v', long = "debug", visible_alias = "verbose", global = true)]
    debug: bool,

    /// Path to configuration file (default: ~/.aws-cleanup.yaml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Delete inactive CloudWatch log streams and empty log groups.
    Cloudwatch(CloudwatchArgs),

    /// Show version, git commit and build date.
    Version,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is the common case.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (config, skipped) = match CleanupConfig::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let mut observability =
        match observability::init_from_config(&config.observability, cli.debug) {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("Failed to initialize observability: {e}");
                return ExitCode::FAILURE;
            },
        };

    for file in &skipped {
        tracing::warn!(
            path = %file.path.display(),
            error = %file.error,
            "Ignoring config file that failed to load"
        );
    }
    if let Some(source) = &config.source {
        tracing::debug!(path = %source.display(), "Loaded configuration file");
    }

    let span = tracing::info_span!("aws_cleanup", service = SERVICE, version = VERSION);
    let result = run_command(cli.command, config).instrument(span).await;

    observability.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(
    command: Commands,
    config: CleanupConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Cloudwatch(args) => cmd_cloudwatch(args, config).await,
        Commands::Version => cmd_version(),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                SERVICE,
                &mut std::io::stdout(),
            );
            Ok(())
        },
    }
}
