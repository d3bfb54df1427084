use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dodone", version, about = "Terminal to-do / in-progress / done board")]
pub struct Cli {
    /// Board file (defaults to the config's board_path, then ./dodone.json)
    #[arg(long, global = true)]
    pub board: Option<PathBuf>,
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the board without starting the TUI
    List,
    /// Launch the interactive TUI
    Tui,
}
