use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Runtime options of a quiz session. Every field has a default, so an empty TOML document
/// is a valid configuration.
///
/// ```
/// let config = quiz::QuizConfig::from_toml_str("autosave_delay_ms = 250\n[labels]\nsubmit = \"Send\"").unwrap();
/// assert_eq!(config.autosave_delay_ms, 250);
/// assert_eq!(config.labels.submit, "Send");
/// assert!(config.auto_save);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuizConfig {
    /// Debounced saving of text answers while typing.
    pub auto_save: bool,
    /// Logs a storage diagnostic snapshot after every pass.
    pub debug_mode: bool,
    /// Keep answers in memory when the durable store rejects a write.
    pub fallback_storage: bool,
    pub autosave_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub link_reinit_delay_ms: u64,
    /// Joins the page path and the exercise identity in persisted keys.
    pub key_separator: String,
    pub labels: Labels,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            auto_save: true,
            debug_mode: false,
            fallback_storage: true,
            autosave_delay_ms: 500,
            poll_interval_ms: 1000,
            link_reinit_delay_ms: 300,
            key_separator: "::".to_string(),
            labels: Labels::default(),
        }
    }
}

/// User-visible strings of generated markup and prompts.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Labels {
    pub submit: String,
    pub mark_done: String,
    pub edit_title: String,
    pub question: String,
    pub exercise: String,
    pub select_option_prompt: String,
    pub short_placeholder: String,
    pub long_placeholder: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            submit: "Submit".to_string(),
            mark_done: "Mark as done".to_string(),
            edit_title: "Edit answer".to_string(),
            question: "Question".to_string(),
            exercise: "Exercise".to_string(),
            select_option_prompt: "Please select an option.".to_string(),
            short_placeholder: "Enter your answer...".to_string(),
            long_placeholder: "Enter your detailed answer...".to_string(),
        }
    }
}

impl QuizConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: QuizConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.key_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "key_separator must not be empty".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
