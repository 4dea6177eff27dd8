//! Configuration view and validation commands: `procure config`.

use anyhow::{Context, Result};

use procure::config::{ProcureConfig, ProcureToml};

use super::super::ConfigCommands;

pub fn cmd_config(config: &ProcureConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = &config.path;

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Procure Configuration");
            println!("=====================");
            println!();

            if config.from_file {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No procure.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            // Effective values, including env and CLI overrides
            let rendered = toml::to_string_pretty(&config.toml)
                .context("Failed to render configuration")?;
            println!("{}", rendered.trim_end());
            println!();
            println!("Reports are saved to {}", config.reports_dir().display());

            if !config.from_file {
                println!();
                println!("Run 'procure config init' to create a procure.toml file.");
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config.from_file {
                println!("No procure.toml found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("procure.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            ProcureToml::default().save(config_path)?;

            println!("Created procure.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [service] endpoint, max_wait_secs");
            println!("  - [presentation] pacing and [[presentation.narration]] lines");
            println!("  - [search] max_result_count, websites, reports_dir");
            println!();
        }
    }

    Ok(())
}
