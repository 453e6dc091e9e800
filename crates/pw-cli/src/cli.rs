//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::replay::ReplayArgs;
use crate::commands::run::RunArgs;

/// Timing recorder.
///
/// Records named, tagged timing events and prints them as one JSON document.
#[derive(Debug, Parser)]
#[command(name = "pw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Time a command and print its records.
    Run(RunArgs),

    /// Apply a JSON-lines script of recorder operations and print the result.
    Replay(ReplayArgs),
}
