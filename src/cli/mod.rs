//! CLI module for Clipshelf
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config_initialization::ConfigOverrides;
use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;

/// Clipshelf
///
/// Cut short clips out of your videos and keep them in a local list.
#[derive(Parser, Debug)]
#[command(name = "clipshelf")]
#[command(about = "Clipshelf - cut short clips out of videos and keep them in a list")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./clipshelf.toml, then the data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Command-line values that take precedence over environment and file
    pub fn overrides(&self) -> ConfigOverrides {
        let encoding = match &self.command {
            Commands::Clip(args) => args.mode,
            _ => None,
        };
        ConfigOverrides {
            config_path: self.config.clone(),
            log_level: self.log_level,
            log_format: self.log_format,
            encoding,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut a clip out of a video and add it to the list
    Clip(args::ClipArgs),
    /// List saved clips
    List(args::ListArgs),
    /// Show one saved clip
    Show(args::ShowArgs),
    /// Remove a clip from the list
    Remove(args::RemoveArgs),
}
