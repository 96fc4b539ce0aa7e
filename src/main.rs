//! Clipshelf
//!
//! Cuts short clips out of source videos with `ffmpeg` and keeps them in a
//! local list.
//!
//! # Usage
//!
//! ```bash
//! clipshelf clip --source movie.mp4 --start 00:01:00 --duration 5 --name "Intro"
//! clipshelf list
//! clipshelf show 1718000000000
//! clipshelf remove 1718000000000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use clipshelf::app::DefaultAppContainer;
use clipshelf::cli::{commands, Cli, Commands};
use clipshelf::config_initialization::initialize_configuration;
use clipshelf::utils::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        initialize_configuration(&cli.overrides()).context("Failed to load configuration")?;
    init_logging(&config.logging());

    let container = DefaultAppContainer::new(&config).await;

    match cli.command {
        Commands::Clip(args) => {
            info!("Executing clip command");
            commands::clip(&container, args).await?;
        }
        Commands::List(args) => commands::list(&container, args).await?,
        Commands::Show(args) => commands::show(&container, args).await?,
        Commands::Remove(args) => commands::remove(&container, args).await?,
    }

    Ok(())
}
