//! CLI argument definitions

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "openvisa")]
#[command(about = "OpenVISA instrument resource manager", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend identity to drive
    #[arg(long, global = true, default_value = "sim@default")]
    pub backend: String,

    /// Seed the simulated backend with these resource names
    #[arg(long, global = true, value_delimiter = ',')]
    pub resources: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show version, host, backend, and discovered resources
    Info {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the interactive VISA shell
    Shell,
}
