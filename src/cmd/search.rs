//! One-shot search from the command line: `procure search`.
//!
//! Feeds the three answers through the same conversation as `chat`, so the
//! same validation and messages apply.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, theme::ColorfulTheme};

use procure::config::ProcureConfig;
use procure::conversation::ConversationStep;
use procure::search::SearchOutcome;
use procure::session::Conversation;
use procure::ui::TerminalUi;

pub struct SearchArgs {
    pub product: String,
    pub country: String,
    pub count: String,
    pub yes: bool,
    pub download: Option<PathBuf>,
    pub open: bool,
}

pub async fn cmd_search(config: &ProcureConfig, args: SearchArgs) -> Result<()> {
    let ui = Arc::new(TerminalUi::new(true));
    let client = Arc::new(config.search_client()?);
    let conversation = Conversation::new(
        config.conversation_settings()?,
        client.clone(),
        ui.clone(),
        ui.clone(),
    )
    .context("Invalid narration timeline")?;

    conversation.start().await;
    for answer in [&args.product, &args.country, &args.count] {
        conversation.submit_user_text(answer);
    }

    if conversation.step() != ConversationStep::AwaitingConfirmation {
        let reason = conversation
            .messages()
            .last()
            .map(|m| m.text.clone())
            .unwrap_or_default();
        bail!("Could not collect the search parameters: {}", reason);
    }

    if !args.yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Start the search?")
            .default(true)
            .interact()?;
        if !proceed {
            ui.warning("Search cancelled.");
            return Ok(());
        }
    }

    match conversation.confirm().await? {
        SearchOutcome::Success { report_reference } => {
            ui.report_link(&report_reference);
            if let Some(dir) = args.download {
                let path = client.download_report(&report_reference, &dir).await?;
                ui.report_saved(&path);
            }
            if args.open {
                open::that(&report_reference)
                    .with_context(|| format!("Failed to open {}", report_reference))?;
            }
            ui.success("Done.");
            Ok(())
        }
        SearchOutcome::Failure { error } => Err(anyhow::Error::new(error).context("Search failed")),
    }
}
