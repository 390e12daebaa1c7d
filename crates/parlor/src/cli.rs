//! Command-line interface for parlor.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parlor - turn-based board games for chat groups
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(about = "Persistent chat board-game sessions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the database file from the config
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play through a simulated chat read from stdin
    Play {
        /// Chat identity of the bot
        #[arg(long)]
        bot_id: Option<String>,
    },

    /// List stored sessions
    Sessions,
}
