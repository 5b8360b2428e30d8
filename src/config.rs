//! Client configuration
//!
//! Transport settings come from the environment; presentation settings
//! (header text, welcome messages) come from an optional JSON file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const DEFAULT_AUTOCOMPLETE_URL: &str = "http://localhost:4200/autocomplete";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for reaching the chat backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL for chat, session, action and feedback endpoints
    pub api_url: String,
    pub autocomplete_url: String,
    pub timeout: Duration,
    /// Seeds the simulated-mode preference at startup
    pub simulated: bool,
    /// File backing the preference store; in-memory when absent
    pub prefs_path: Option<PathBuf>,
    /// Presentation config file
    pub ui_config_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            autocomplete_url: DEFAULT_AUTOCOMPLETE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            simulated: false,
            prefs_path: None,
            ui_config_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: lookup("CHAT_API_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.api_url),
            autocomplete_url: lookup("CHAT_AUTOCOMPLETE_URL")
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.autocomplete_url),
            timeout: lookup("CHAT_TIMEOUT_SECS")
                .and_then(|secs| secs.trim().parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
            simulated: lookup("CHAT_SIMULATED").is_some_and(|v| is_truthy(&v)),
            prefs_path: lookup("CHAT_PREFS_PATH").map(PathBuf::from),
            ui_config_path: lookup("CHAT_UI_CONFIG").map(PathBuf::from),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Presentation settings shown around the conversation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantConfig {
    pub chat_header: String,
    pub welcome_messages: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            chat_header: "Chat".to_string(),
            welcome_messages: vec![],
        }
    }
}

impl AssistantConfig {
    /// Load from a JSON file, falling back to defaults on any error.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read assistant config"
                );
                return Self::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Malformed assistant config");
            Self::default()
        })
    }
}
