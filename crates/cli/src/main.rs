//! Pagetest CLI - Main Entry Point
//!
//! Runs browser test pages in a headless browser and writes HTML and JUnit
//! reports for them.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod output;

use commands::{decode, discover, init, run};
use config::{PagetestConfig, DEFAULT_CONFIG_FILE};

/// Exit status when any test failed
const EXIT_TEST_FAILURE: u8 = 1;

/// Exit status when the pipeline itself failed
const EXIT_PIPELINE_ERROR: u8 = 2;

/// Pagetest - browser unit tests as host test results
#[derive(Parser)]
#[command(name = "pagetest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "PAGETEST_CONFIG", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all fixtures and write reports
    Run(run::RunArgs),

    /// List fixture pages
    Discover(discover::DiscoverArgs),

    /// Decode a captured runner payload
    Decode(decode::DecodeArgs),

    /// Write a default configuration file
    InitConfig(init::InitArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_TEST_FAILURE),
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            ExitCode::from(EXIT_PIPELINE_ERROR)
        }
    }
}

/// Run the selected command; `Ok(false)` means tests ran and some failed
async fn dispatch(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Run(args) => {
            let config = PagetestConfig::load(&cli.config)?;
            run::execute(args, config, cli.format).await
        }
        Commands::Discover(args) => {
            let config = PagetestConfig::load(&cli.config)?;
            discover::execute(args, &config, cli.format)?;
            Ok(true)
        }
        Commands::Decode(args) => {
            decode::execute(args, cli.format)?;
            Ok(true)
        }
        Commands::InitConfig(args) => {
            init::execute(args, &cli.config)?;
            Ok(true)
        }
    }
}
