//! Interactive conversation: `procure chat`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use tracing::warn;

use procure::config::ProcureConfig;
use procure::conversation::ConversationStep;
use procure::search::HttpSearchClient;
use procure::session::Conversation;
use procure::ui::TerminalUi;

const QUIT: &str = "/quit";
const RESET: &str = "/reset";

pub async fn cmd_chat(config: &ProcureConfig) -> Result<()> {
    let ui = Arc::new(TerminalUi::new(false));
    let client = Arc::new(config.search_client()?);
    let conversation = Conversation::new(
        config.conversation_settings()?,
        client.clone(),
        ui.clone(),
        ui.clone(),
    )
    .context("Invalid narration timeline")?;

    println!();
    println!(
        "{} {}",
        style("procure").bold().cyan(),
        style(format!("(type {} to start over, {} to leave)", RESET, QUIT)).dim()
    );
    println!();

    conversation.start().await;
    let theme = ColorfulTheme::default();

    loop {
        match conversation.step() {
            ConversationStep::AwaitingProduct
            | ConversationStep::AwaitingCountry
            | ConversationStep::AwaitingCount => {
                let line: String = Input::with_theme(&theme)
                    .with_prompt("You")
                    .allow_empty(true)
                    .interact_text()?;
                match line.trim() {
                    QUIT => break,
                    RESET => {
                        conversation.reset().await;
                    }
                    text => {
                        conversation.submit_user_text(text);
                    }
                }
            }
            ConversationStep::AwaitingConfirmation => {
                let options = &["Start the search", "Cancel and start over", "Quit"];
                let selection = Select::with_theme(&theme)
                    .items(options)
                    .default(0)
                    .interact()?;

                match selection {
                    0 => {
                        conversation.confirm().await?;
                        if let Some(url) = conversation.report_reference() {
                            ui.report_link(&url);
                        }
                    }
                    1 => {
                        conversation.reset().await;
                    }
                    2 => break,
                    _ => unreachable!(),
                }
            }
            ConversationStep::Done => {
                let Some(url) = conversation.report_reference() else {
                    bail!("Search finished without a report");
                };
                let options = &[
                    "Open the report in a browser",
                    "Download the report",
                    "Start a new search",
                    "Quit",
                ];
                let selection = Select::with_theme(&theme)
                    .with_prompt("What next?")
                    .items(options)
                    .default(0)
                    .interact()?;

                match selection {
                    0 => open_report(&ui, &url),
                    1 => download(&ui, &client, &url, config).await,
                    2 => {
                        conversation.reset().await;
                    }
                    3 => break,
                    _ => unreachable!(),
                }
            }
            ConversationStep::Greeting => {
                conversation.start().await;
            }
            ConversationStep::Searching => bail!("Search still running after confirm returned"),
        }
    }

    println!("{}", style("Goodbye!").dim());
    Ok(())
}

fn open_report(ui: &TerminalUi, url: &str) {
    if let Err(e) = open::that(url) {
        warn!(error = %e, "Failed to open browser");
        ui.warning(&format!("Could not open a browser ({}). The report is at {}", e, url));
    }
}

async fn download(ui: &TerminalUi, client: &HttpSearchClient, url: &str, config: &ProcureConfig) {
    match client.download_report(url, &config.reports_dir()).await {
        Ok(path) => ui.report_saved(&path),
        Err(e) => ui.failure(&format!("Download failed: {:#}", e)),
    }
}
