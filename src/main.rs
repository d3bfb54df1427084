mod cli;
mod clock;
mod commands;
mod config;
mod edit;
mod input;
mod logging;
mod model;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = config::Config::load(args.config.as_deref())?;
    let _log_guard = logging::init(&config);
    let store = storage::JsonStore::new(config.board_path(args.board));
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::List => commands::list(&store),
        cli::Command::Tui => commands::tui(store),
    }
}
