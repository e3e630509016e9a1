//! CLI interface for tickforge
//!
//! Provides subcommands for:
//! - `convert`: consolidate one day of raw channel files into bar archives
//! - `config`: show the effective configuration

mod convert;

pub use convert::ConvertArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tickforge")]
#[command(about = "Batch converter consolidating raw tick channel files into bar archives")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "tickforge.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert one day of raw channel files
    Convert(ConvertArgs),
    /// Show effective configuration
    Config,
}
