use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::conversation::{Message, Sender, TranscriptSink};
use crate::search::ProgressSink;
use crate::ui::icons::{ASSISTANT, CHECK, CROSS, FILE, LINK, SEARCH, USER, WARN};

/// Terminal rendering of a conversation, driven through the transcript and
/// progress sinks.
///
/// While a search runs, a single `indicatif` bar shows the presentation
/// progress and transcript lines are printed above it.
pub struct TerminalUi {
    bar: Mutex<Option<ProgressBar>>,
    echo_user: bool,
}

impl TerminalUi {
    /// `echo_user` controls whether user messages are printed. Interactive
    /// prompts already show what was typed, so `chat` turns it off.
    pub fn new(echo_user: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            echo_user,
        }
    }

    /// Print a line, above the progress bar when one is active.
    pub fn print_line(&self, line: impl AsRef<str>) {
        match self.bar().as_ref() {
            Some(bar) => bar.suspend(|| println!("{}", line.as_ref())),
            None => println!("{}", line.as_ref()),
        }
    }

    pub fn report_link(&self, url: &str) {
        self.print_line(format!("{}Report: {}", LINK, style(url).underlined().cyan()));
    }

    pub fn report_saved(&self, path: &Path) {
        self.print_line(format!("{}Saved report to {}", FILE, style(path.display()).bold()));
    }

    pub fn success(&self, text: &str) {
        self.print_line(format!("{}{}", CHECK, style(text).green()));
    }

    pub fn warning(&self, text: &str) {
        self.print_line(format!("{}{}", WARN, style(text).yellow()));
    }

    pub fn failure(&self, text: &str) {
        self.print_line(format!("{}{}", CROSS, style(text).red()));
    }

    fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Render one transcript message as a terminal line.
pub fn render_message(message: &Message) -> String {
    match message.sender {
        Sender::Bot => format!(
            "{}{} {}",
            ASSISTANT,
            style("Assistant:").cyan().bold(),
            message.text
        ),
        Sender::User => format!("{}{} {}", USER, style("You:").green().bold(), message.text),
    }
}

impl TranscriptSink for TerminalUi {
    fn append(&self, message: &Message) {
        if message.sender == Sender::User && !self.echo_user {
            return;
        }
        self.print_line(render_message(message));
    }

    fn cleared(&self) {
        self.print_line(format!("{}", style("── new conversation ──").dim()));
    }
}

impl ProgressSink for TerminalUi {
    fn start(&self) {
        let bar_style = ProgressStyle::default_bar()
            .template("{prefix}{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let bar = ProgressBar::new(100);
        bar.set_style(bar_style);
        bar.set_prefix(SEARCH.to_string());
        bar.set_message(format!("{}", style("Searching").dim()));
        bar.enable_steady_tick(Duration::from_millis(100));
        *self.bar() = Some(bar);
    }

    fn update(&self, percent: u8) {
        if let Some(bar) = self.bar().as_ref() {
            bar.set_position(u64::from(percent.min(100)));
        }
    }

    fn stop(&self) {
        if let Some(bar) = self.bar().take() {
            bar.finish_and_clear();
        }
    }
}
