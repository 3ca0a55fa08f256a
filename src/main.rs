// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use code_scanner::config::Config;
use code_scanner::constants::app_info;
use code_scanner::errors::ScanError;
use code_scanner::scanner::ExitReason;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

mod cli;

#[derive(Parser)]
#[command(name = "code-scanner")]
#[command(about = "Live barcode and QR code scanner for V4L2 cameras")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera index to use (from 'code-scanner list')
    #[arg(short, long)]
    camera: Option<usize>,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,
}

fn main() -> ExitCode {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=code_scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        None => load_config(&cli).and_then(|config| run_scan(&config)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", report(&e));
            ExitCode::FAILURE
        }
    }
}

/// Message printed to stderr for an error that ends the program
///
/// Camera errors only surface from opening the device; a camera that fails
/// mid-stream ends the scan normally.
fn report(err: &ScanError) -> String {
    match err {
        ScanError::Camera(e) => format!("Error: Could not open video capture: {}", e),
        other => format!("Error: {}", other),
    }
}

fn load_config(cli: &Cli) -> Result<Config, ScanError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(index) = cli.camera {
        config.camera_index = index;
    }
    Ok(config)
}

fn run_scan(config: &Config) -> Result<(), ScanError> {
    match cli::scan(config)? {
        ExitReason::QuitRequested => info!("Scanner closed by user"),
        ExitReason::StreamEnded(reason) => info!(%reason, "Scanner stopped, no more frames"),
    }
    Ok(())
}
