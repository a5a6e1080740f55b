//! Game configuration loaded from TOML.

use crate::games::tictactoe::{GameMode, Mark};
use crate::llm_client::{DEFAULT_REQUEST_TIMEOUT, LlmConfig, LlmProvider};
use crate::session::DEFAULT_THINKING_DELAY;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Settings for a game session and its LLM opponent.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// Mode the first game starts in.
    #[serde(default)]
    mode: GameMode,

    /// Mark played by the move provider.
    #[serde(default = "default_provider_mark")]
    provider_mark: Mark,

    /// Minimum time a provider turn stays visible, in milliseconds.
    #[serde(default = "default_thinking_delay_ms")]
    thinking_delay_ms: u64,

    /// LLM provider (gemini, openai or anthropic).
    #[serde(default = "default_provider")]
    llm_provider: LlmProvider,

    /// LLM model name (e.g., "gemini-2.5-flash", "gpt-4o-mini").
    #[serde(default = "default_model")]
    llm_model: String,

    /// Maximum tokens for LLM responses.
    #[serde(default = "default_max_tokens")]
    llm_max_tokens: u32,

    /// Sampling temperature; kept low for consistent play.
    #[serde(default = "default_temperature")]
    llm_temperature: f32,

    /// Seconds an LLM request may take before the provider turn falls back.
    #[serde(default = "default_timeout_secs")]
    llm_timeout_secs: u64,
}

fn default_provider_mark() -> Mark {
    Mark::O
}

fn default_thinking_delay_ms() -> u64 {
    DEFAULT_THINKING_DELAY.as_millis() as u64
}

fn default_provider() -> LlmProvider {
    LlmProvider::Gemini
}

fn default_model() -> String {
    default_model_for(default_provider()).to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            provider_mark: default_provider_mark(),
            thinking_delay_ms: default_thinking_delay_ms(),
            llm_provider: default_provider(),
            llm_model: default_model(),
            llm_max_tokens: default_max_tokens(),
            llm_temperature: default_temperature(),
            llm_timeout_secs: default_timeout_secs(),
        }
    }
}

impl GameConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(provider = %config.llm_provider, model = %config.llm_model, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text. Missing keys take defaults.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads `path` if it exists, otherwise returns defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Overrides the starting mode.
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the LLM provider. The model falls back to that provider's
    /// default unless one is given.
    pub fn with_llm(mut self, provider: LlmProvider, model: Option<String>) -> Self {
        self.llm_provider = provider;
        self.llm_model = model.unwrap_or_else(|| default_model_for(provider).to_string());
        self
    }

    /// Overrides the minimum provider delay.
    pub fn with_thinking_delay_ms(mut self, ms: u64) -> Self {
        self.thinking_delay_ms = ms;
        self
    }

    /// Minimum provider delay as a [`Duration`].
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }

    /// Creates LLM configuration from this game config.
    ///
    /// Reads the API key from the environment (see
    /// [`LlmProvider::api_key_vars`]).
    #[instrument(skip(self), fields(provider = ?self.llm_provider, model = %self.llm_model))]
    pub fn create_llm_config(&self) -> Result<LlmConfig, ConfigError> {
        debug!("Creating LLM config");

        let vars = self.llm_provider.api_key_vars();
        let api_key = vars
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "{} environment variable not set",
                    vars.join(" or ")
                ))
            })?;

        Ok(LlmConfig::new(
            self.llm_provider,
            api_key,
            self.llm_model.clone(),
            self.llm_max_tokens,
            self.llm_temperature,
        )
        .with_timeout(Duration::from_secs(self.llm_timeout_secs)))
    }
}

/// Default model for each provider.
pub fn default_model_for(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Gemini => "gemini-2.5-flash",
        LlmProvider::OpenAI => "gpt-4o-mini",
        LlmProvider::Anthropic => "claude-3-5-haiku-20241022",
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = GameConfig::from_toml("").expect("valid config");
        assert_eq!(config, GameConfig::default());
        assert_eq!(*config.provider_mark(), Mark::O);
        assert_eq!(config.thinking_delay(), Duration::from_millis(600));
    }

    #[test]
    fn test_toml_overrides() {
        let config = GameConfig::from_toml(
            r#"
            mode = "provider"
            llm_provider = "anthropic"
            llm_model = "claude-3-5-haiku-20241022"
            thinking_delay_ms = 0
            llm_timeout_secs = 5
            "#,
        )
        .expect("valid config");

        assert_eq!(*config.mode(), GameMode::Provider);
        assert_eq!(*config.llm_provider(), LlmProvider::Anthropic);
        assert_eq!(config.thinking_delay(), Duration::ZERO);
        assert_eq!(*config.llm_timeout_secs(), 5);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let err = GameConfig::from_toml("mode = \"tournament\"").expect_err("unknown mode");
        assert!(err.message.contains("Failed to parse config"));
    }

    #[test]
    fn test_with_llm_picks_provider_default_model() {
        let config = GameConfig::default().with_llm(LlmProvider::OpenAI, None);
        assert_eq!(config.llm_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = GameConfig::load_or_default("does/not/exist.toml").expect("defaults");
        assert_eq!(config, GameConfig::default());
    }
}
