use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use procure::config::ProcureConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "procure")]
#[command(version, about = "Shopping assistant that compares prices across online stores")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to procure.toml. Defaults to the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Search service URL. Overrides procure.toml and PROCURE_ENDPOINT.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Talk to the assistant (default)
    Chat,
    /// Run a single search without the interactive conversation
    Search {
        /// Product to search for
        #[arg(short, long)]
        product: String,

        /// Country to search in
        #[arg(short, long)]
        country: String,

        /// Number of results in the report
        #[arg(short = 'n', long, allow_hyphen_values = true)]
        count: String,

        /// Start without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Save the report into this directory
        #[arg(long)]
        download: Option<PathBuf>,

        /// Open the report in a browser
        #[arg(long)]
        open: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default procure.toml file
    Init,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = ProcureConfig::load(cli.config.clone(), cli.endpoint.clone(), cli.verbose)?;
    let _log_guard = procure::logging::init(&config)?;

    match cli.command {
        None | Some(Commands::Chat) => cmd::cmd_chat(&config).await?,
        Some(Commands::Search {
            product,
            country,
            count,
            yes,
            download,
            open,
        }) => {
            cmd::cmd_search(
                &config,
                cmd::SearchArgs {
                    product,
                    country,
                    count,
                    yes,
                    download,
                    open,
                },
            )
            .await?
        }
        Some(Commands::Config { command }) => cmd::cmd_config(&config, command)?,
    }

    Ok(())
}
