//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "streambox", about = "Share folders, browse, and stream over your LAN", version)]
pub struct Cli {
    /// Path to the config file (default: config.json beside the executable)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Run without the SQLite index; listings persist only to the
        /// JSON fallback cache
        #[arg(long)]
        no_db: bool,
    },

    /// Validate a configuration file and print a summary
    Validate {
        /// Config file to validate (falls back to --config)
        config: Option<PathBuf>,
    },

    /// Print version information
    Version,
}
