//! services/studio/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;

use kidsmart_core::orchestrator::{DEFAULT_CARD_DELAY, DEFAULT_PAGE_COOLDOWN};
use kidsmart_core::WorkflowTiming;
use tracing::Level;

/// OpenAI-compatible endpoint Gemini exposes for chat completions.
pub const GEMINI_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub gemini_api_key: Option<String>,
    pub text_model: String,
    pub gemini_image_model: String,
    pub openai_image_model: String,
    pub tts_voice: String,
    pub story_feed_url: Option<String>,
    pub game_feed_url: Option<String>,
    pub timing: WorkflowTiming,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let data_dir = non_empty("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./kidsmart-data"));

        let log_level_str = non_empty("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = non_empty("OPENAI_API_KEY");
        let openai_api_base = non_empty("OPENAI_API_BASE");
        let gemini_api_key = non_empty("GEMINI_API_KEY");
        if openai_api_key.is_none() && gemini_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "OPENAI_API_KEY or GEMINI_API_KEY".to_string(),
            ));
        }

        // --- Load Adapter-specific Settings ---
        let default_text_model = if openai_api_key.is_some() {
            "gpt-4o-mini"
        } else {
            "gemini-2.5-flash"
        };
        let text_model = non_empty("TEXT_MODEL").unwrap_or_else(|| default_text_model.to_string());
        let gemini_image_model =
            non_empty("GEMINI_IMAGE_MODEL").unwrap_or_else(|| "gemini-2.5-flash-image".to_string());
        let openai_image_model =
            non_empty("OPENAI_IMAGE_MODEL").unwrap_or_else(|| "gpt-image-1".to_string());
        let tts_voice = non_empty("TTS_VOICE").unwrap_or_else(|| "alloy".to_string());

        let story_feed_url = non_empty("STORY_FEED_URL");
        let game_feed_url = non_empty("GAME_FEED_URL");

        let timing = WorkflowTiming {
            page_cooldown: parse_secs(&non_empty, "PAGE_COOLDOWN_SECS", DEFAULT_PAGE_COOLDOWN)?,
            card_delay: parse_secs(&non_empty, "CARD_DELAY_SECS", DEFAULT_CARD_DELAY)?,
        };

        Ok(Self {
            data_dir,
            log_level,
            openai_api_key,
            openai_api_base,
            gemini_api_key,
            text_model,
            gemini_image_model,
            openai_image_model,
            tts_voice,
            story_feed_url,
            game_feed_url,
            timing,
        })
    }

    /// Key and base URL for the chat backend. OpenAI wins when both keys are set.
    pub fn text_endpoint(&self) -> Option<(String, Option<String>)> {
        if let Some(key) = &self.openai_api_key {
            return Some((key.clone(), self.openai_api_base.clone()));
        }
        self.gemini_api_key
            .as_ref()
            .map(|key| (key.clone(), Some(GEMINI_OPENAI_BASE.to_string())))
    }
}

fn parse_secs(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}
