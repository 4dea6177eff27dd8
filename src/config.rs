//! Configuration for procure, read from `procure.toml`.
//!
//! Settings are layered: file → environment → CLI. A missing file means
//! defaults throughout.
//!
//! # Configuration File Format
//!
//! ```toml
//! [service]
//! endpoint = "http://localhost:5000"
//! search_path = "/api/search"
//! connect_timeout_secs = 10
//! max_wait_secs = 600
//!
//! [presentation]
//! greeting_delay_ms = 1000
//! min_presentation_ms = 7000
//! progress_tick_ms = 100
//!
//! [[presentation.narration]]
//! offset_ms = 0
//! text = "Starting the search for you..."
//!
//! [[presentation.narration]]
//! offset_ms = 1000
//! text = "Searching in online stores..."
//!
//! [search]
//! max_result_count = 50   # 0 = no upper bound
//! websites = ["www.amazon.de", "www.ebay.de"]
//! reports_dir = "~/Downloads/procure"
//!
//! [logging]
//! level = "warn"
//! dir = "/var/log/procure"
//! ```
//!
//! Environment overrides: `PROCURE_ENDPOINT`, `PROCURE_MAX_WAIT_SECS`.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversation::{EngineSettings, prompts};
use crate::errors::TimelineError;
use crate::search::{HttpSearchClient, NarrationPoint, NarrationTimeline, OrchestratorSettings};
use crate::session::ConversationSettings;

pub const ENV_ENDPOINT: &str = "PROCURE_ENDPOINT";
pub const ENV_MAX_WAIT_SECS: &str = "PROCURE_MAX_WAIT_SECS";

/// Where the search service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_search_path")]
    pub search_path: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound on a single search, after which it counts as failed
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:5000".to_string()
}

fn default_search_path() -> String {
    "/api/search".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_wait_secs() -> u64 {
    600
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            search_path: default_search_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

/// One narration line shown while a search runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationEntry {
    pub offset_ms: u64,
    pub text: String,
}

/// Pacing of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationSection {
    #[serde(default = "default_greeting_delay_ms")]
    pub greeting_delay_ms: u64,
    /// Shortest time between confirming and seeing the outcome
    #[serde(default = "default_min_presentation_ms")]
    pub min_presentation_ms: u64,
    #[serde(default = "default_progress_tick_ms")]
    pub progress_tick_ms: u64,
    #[serde(default = "default_narration")]
    pub narration: Vec<NarrationEntry>,
}

fn default_greeting_delay_ms() -> u64 {
    1_000
}

fn default_min_presentation_ms() -> u64 {
    7_000
}

fn default_progress_tick_ms() -> u64 {
    100
}

fn default_narration() -> Vec<NarrationEntry> {
    prompts::NARRATION
        .iter()
        .map(|(offset_ms, text)| NarrationEntry {
            offset_ms: *offset_ms,
            text: text.to_string(),
        })
        .collect()
}

impl Default for PresentationSection {
    fn default() -> Self {
        Self {
            greeting_delay_ms: default_greeting_delay_ms(),
            min_presentation_ms: default_min_presentation_ms(),
            progress_tick_ms: default_progress_tick_ms(),
            narration: default_narration(),
        }
    }
}

/// What gets searched for and where reports are saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSection {
    /// Largest accepted result count (0 = unbounded)
    #[serde(default = "default_max_result_count")]
    pub max_result_count: u32,
    /// Stores to search (empty = let the service decide)
    #[serde(default)]
    pub websites: Vec<String>,
    /// Directory for downloaded reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_dir: Option<PathBuf>,
}

fn default_max_result_count() -> u32 {
    50
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            max_result_count: default_max_result_count(),
            websites: Vec::new(),
            reports_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Filter directive used when `PROCURE_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write logs to daily files in this directory instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

/// Contents of `procure.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcureToml {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub presentation: PresentationSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ProcureToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse procure.toml")
    }

    /// Load configuration from `path`, or defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize procure.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.service.endpoint = endpoint.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_MAX_WAIT_SECS) {
            self.service.max_wait_secs = raw.trim().parse().with_context(|| {
                format!("Invalid {}: '{}' is not a number of seconds", ENV_MAX_WAIT_SECS, raw)
            })?;
        }
        Ok(())
    }

    /// Build the narration timeline from `[[presentation.narration]]`.
    pub fn narration_timeline(&self) -> Result<NarrationTimeline, TimelineError> {
        NarrationTimeline::new(
            self.presentation
                .narration
                .iter()
                .map(|entry| NarrationPoint::new(Duration::from_millis(entry.offset_ms), &entry.text))
                .collect(),
        )
    }

    /// Settings for a new conversation.
    pub fn conversation_settings(&self) -> Result<ConversationSettings> {
        let timeline = self
            .narration_timeline()
            .context("Invalid [[presentation.narration]] entries")?;
        let max = self.search.max_result_count;

        Ok(ConversationSettings {
            engine: EngineSettings {
                max_result_count: (max > 0).then_some(max),
                websites: self.search.websites.clone(),
            },
            orchestrator: OrchestratorSettings {
                timeline,
                min_presentation: Duration::from_millis(self.presentation.min_presentation_ms),
                max_wait: Duration::from_secs(self.service.max_wait_secs),
                progress_tick: Duration::from_millis(self.presentation.progress_tick_ms),
            },
            greeting_delay: Duration::from_millis(self.presentation.greeting_delay_ms),
        })
    }

    /// HTTP client for the configured service.
    pub fn search_client(&self) -> Result<HttpSearchClient> {
        HttpSearchClient::new(
            &self.service.endpoint,
            &self.service.search_path,
            Duration::from_secs(self.service.connect_timeout_secs),
        )
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        match Url::parse(&self.service.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => warnings.push(format!(
                "Unsupported endpoint scheme '{}': use http or https",
                url.scheme()
            )),
            Err(e) => warnings.push(format!(
                "Invalid endpoint '{}': {}",
                self.service.endpoint, e
            )),
        }

        if !self.service.search_path.starts_with('/') {
            warnings.push(format!(
                "search_path '{}' should start with '/'",
                self.service.search_path
            ));
        }

        if self.service.connect_timeout_secs == 0 {
            warnings.push("connect_timeout_secs = 0 makes every connection fail".to_string());
        }

        if self.service.max_wait_secs == 0 {
            warnings.push("max_wait_secs = 0 makes every search time out".to_string());
        } else if self.service.max_wait_secs * 1_000 < self.presentation.min_presentation_ms {
            warnings.push(format!(
                "max_wait_secs ({}) is shorter than min_presentation_ms ({})",
                self.service.max_wait_secs, self.presentation.min_presentation_ms
            ));
        }

        if self.presentation.progress_tick_ms == 0 {
            warnings.push("progress_tick_ms = 0 is treated as 1ms".to_string());
        }

        let window = Duration::from_millis(self.presentation.min_presentation_ms);
        match self.narration_timeline() {
            Ok(timeline) => {
                if let Err(e) = timeline.check_window(window) {
                    warnings.push(format!("Invalid narration: {}", e));
                }
            }
            Err(e) => warnings.push(format!("Invalid narration: {}", e)),
        }

        if let Some(site) = self.search.websites.iter().find(|s| s.trim().is_empty()) {
            warnings.push(format!("Empty entry in websites: '{}'", site));
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            warnings.push(format!(
                "Invalid logging level '{}': expected a filter such as 'warn' or 'procure=debug'",
                self.logging.level
            ));
        }

        warnings
    }
}

/// Default location of `procure.toml` in the user's config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("procure").join("procure.toml"))
}

/// Fully resolved configuration for one run of the CLI.
///
/// It merges settings from:
/// 1. procure.toml
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct ProcureConfig {
    /// Path the file was (or would be) read from
    pub path: PathBuf,
    /// Whether the file exists
    pub from_file: bool,
    pub toml: ProcureToml,
    /// CLI override: verbose logging
    pub verbose: bool,
}

impl ProcureConfig {
    /// Resolve configuration from an optional explicit path and CLI overrides.
    pub fn load(path: Option<PathBuf>, endpoint: Option<String>, verbose: bool) -> Result<Self> {
        Self::load_with_env(path, endpoint, verbose, |key| std::env::var(key).ok())
    }

    /// Like [`Self::load`], reading environment variables through `lookup`.
    pub fn load_with_env(
        path: Option<PathBuf>,
        endpoint: Option<String>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => default_config_path()
                .context("Could not determine the config directory; pass --config <path>")?,
        };
        let from_file = path.exists();
        let mut toml = ProcureToml::load_or_default(&path)?;
        toml.apply_env(lookup)?;
        if let Some(endpoint) = endpoint {
            toml.service.endpoint = endpoint;
        }

        Ok(Self {
            path,
            from_file,
            toml,
            verbose,
        })
    }

    pub fn conversation_settings(&self) -> Result<ConversationSettings> {
        self.toml.conversation_settings()
    }

    pub fn search_client(&self) -> Result<HttpSearchClient> {
        self.toml.search_client()
    }

    /// Directory for downloaded reports (config → downloads dir → cwd).
    pub fn reports_dir(&self) -> PathBuf {
        self.toml
            .search
            .reports_dir
            .clone()
            .or_else(|| dirs::download_dir().map(|dir| dir.join("procure")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Log filter directive when `PROCURE_LOG` is unset.
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.toml.logging.level
        }
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.toml.logging.dir.as_deref()
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
