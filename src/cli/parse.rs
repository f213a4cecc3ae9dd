//! CLI parse: clap types for Ripple. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ripple CLI - inspect property-reactive masks and persisted propagation contexts
#[derive(Parser)]
#[command(name = "ripple")]
#[command(about = "Inspect modification-mask adaptation and persisted propagation contexts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (configuration is read from <workspace>/config)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a set of changed properties from one type's ordering to another's
    Adapt {
        /// Type declaration file (defaults to session.declarations from config)
        #[arg(long)]
        types: Option<PathBuf>,
        /// Qualified name of the modified class, e.g. pets.Dog
        #[arg(long)]
        from: String,
        /// Qualified name of the declared type, e.g. pets.Pet
        #[arg(long)]
        to: String,
        /// Comma-separated changed properties of the modified class
        #[arg(long, value_delimiter = ',')]
        changed: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Decode a persisted propagation context record
    Inspect {
        /// Hex-encoded record
        #[arg(long)]
        hex: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List declared types and their property bit positions
    Types {
        /// Type declaration file (defaults to session.declarations from config)
        #[arg(long)]
        types: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
