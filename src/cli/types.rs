//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::serve::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "trivy-monitor")]
#[command(about = "Trivy DB build monitor", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./trivy-monitor.yaml)
    #[arg(short, long, global = true, env = "TRIVY_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP monitor
    Serve(ServeArgs),

    /// Show the build state and database artifacts
    Status,

    /// Remove a stale lock file
    ClearLock,
}
