use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod engine;
mod evidence;
mod logging;
mod models;
mod notify;
mod store;
mod utils;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config)?;
    if let Some(store) = cli.store {
        config = config.with_store_path(store);
    }
    let _log_guard = logging::init(&config.log)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, config).await,
        Commands::Import(args) => commands::import::execute(args, config).await,
        Commands::List(args) => commands::list::execute(args, config).await,
        Commands::Show(args) => commands::show::execute(args, config).await,
    }
}
