use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glide_core::AppConfig;

mod commands;

use commands::simulate::SimulateArgs;
use commands::watch::WatchArgs;

#[derive(Parser)]
#[command(name = "glide")]
#[command(author, version, about = "Headless simulator for the glide smooth scroll engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of ~/.config/glide/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scroll scenario on a simulated host and print every render
    Simulate(SimulateArgs),
    /// Animate a scroll scenario in real time
    Watch(WatchArgs),
    /// Show the effective configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Write the default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(&config, args),
        Commands::Watch(args) => commands::watch::run(&config, args).await,
        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => commands::config::show(&config),
            Some(ConfigAction::Path) => {
                commands::config::path(cli.config.as_deref());
                Ok(())
            }
            Some(ConfigAction::Init) => commands::config::init(),
        },
    }
}
