//! pdwsim CLI - Command-line interface
//!
//! Generates merged radar pulse streams from TOML scenarios.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use pdwsim_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "pdwsim")]
#[command(about = "Synthetic radar pulse descriptor word generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info, global = true)]
    log_level: CliLogLevel,

    /// Also write trace-level logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.log_file.as_deref())?;

    commands::handle_command(cli.command).await
}
