use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{import, list, run, show};

#[derive(Parser)]
#[command(name = "checkrun")]
#[command(about = "Checkrun - Execute test runs and validation sessions step by step")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Session store directory (overrides config)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a stored session interactively
    Run(run::Args),

    /// Import a session file into the store
    Import(import::Args),

    /// List stored sessions
    List(list::Args),

    /// Show a session's progress and results
    Show(show::Args),
}
