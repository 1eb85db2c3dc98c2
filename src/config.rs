//! Configuration for the reading-time analyzer.
//!
//! Supports both environment variables and a YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{AnalyzerError, Result};
use crate::timing::{
    DEFAULT_ANSWER_TIME_SECONDS, DEFAULT_WORDS_PER_MINUTE, TimingOptions,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Accepted reading-pace range (words per minute). Enforced only here, at
/// the configuration boundary; the core timing code accepts any value.
pub const MIN_WORDS_PER_MINUTE: u32 = 100;
pub const MAX_WORDS_PER_MINUTE: u32 = 300;

/// Accepted per-question answer-time range (seconds).
pub const MIN_ANSWER_TIME_SECONDS: u32 = 10;
pub const MAX_ANSWER_TIME_SECONDS: u32 = 120;

/// Timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Reading pace in words per minute.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,

    /// Seconds allotted per question.
    #[serde(default = "default_answer_time")]
    pub answer_time_seconds: u32,
}

fn default_words_per_minute() -> u32 {
    DEFAULT_WORDS_PER_MINUTE
}

fn default_answer_time() -> u32 {
    DEFAULT_ANSWER_TIME_SECONDS
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: default_words_per_minute(),
            answer_time_seconds: default_answer_time(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Timing settings
    pub timing: TimingConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    timing: Option<TimingFileSection>,
}

#[derive(Debug, Deserialize)]
struct TimingFileSection {
    words_per_minute: Option<u32>,
    answer_time_seconds: Option<u32>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (READING_TIMER_WPM, READING_TIMER_ANSWER_SECONDS)
    /// 2. Config file (~/.config/reading-timer/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file first
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        // Override with environment variables
        if let Ok(wpm) = env::var("READING_TIMER_WPM") {
            if let Ok(value) = wpm.parse() {
                config.timing.words_per_minute = value;
            }
        }

        if let Ok(answer) = env::var("READING_TIMER_ANSWER_SECONDS") {
            if let Ok(value) = answer.parse() {
                config.timing.answer_time_seconds = value;
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalyzerError::io(path, e))?;

        let file_config: ConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| AnalyzerError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(timing) = file_config.timing {
            if let Some(wpm) = timing.words_per_minute {
                config.timing.words_per_minute = wpm;
            }
            if let Some(answer) = timing.answer_time_seconds {
                config.timing.answer_time_seconds = answer;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "reading-timer")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that the configured values fall inside the accepted ranges.
    pub fn validate(&self) -> Result<()> {
        let wpm = self.timing.words_per_minute;
        if !(MIN_WORDS_PER_MINUTE..=MAX_WORDS_PER_MINUTE).contains(&wpm) {
            return Err(AnalyzerError::Config(format!(
                "words_per_minute must be between {} and {}, got {}",
                MIN_WORDS_PER_MINUTE, MAX_WORDS_PER_MINUTE, wpm
            )));
        }

        let answer = self.timing.answer_time_seconds;
        if !(MIN_ANSWER_TIME_SECONDS..=MAX_ANSWER_TIME_SECONDS).contains(&answer) {
            return Err(AnalyzerError::Config(format!(
                "answer_time_seconds must be between {} and {}, got {}",
                MIN_ANSWER_TIME_SECONDS, MAX_ANSWER_TIME_SECONDS, answer
            )));
        }

        Ok(())
    }

    /// Timing options for the analyzer core.
    pub fn timing_options(&self) -> TimingOptions {
        TimingOptions {
            words_per_minute: self.timing.words_per_minute,
            answer_time_seconds: self.timing.answer_time_seconds,
        }
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_timing(words_per_minute: u32, answer_time_seconds: u32) -> Self {
        Self {
            timing: TimingConfig {
                words_per_minute,
                answer_time_seconds,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timing.words_per_minute, 180);
        assert_eq!(config.timing.answer_time_seconds, 35);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_pace() {
        assert!(Config::with_timing(99, 35).validate().is_err());
        assert!(Config::with_timing(301, 35).validate().is_err());
        assert!(Config::with_timing(100, 35).validate().is_ok());
        assert!(Config::with_timing(300, 35).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_answer_time() {
        assert!(Config::with_timing(180, 9).validate().is_err());
        assert!(Config::with_timing(180, 121).validate().is_err());
        assert!(Config::with_timing(180, 10).validate().is_ok());
        assert!(Config::with_timing(180, 120).validate().is_ok());
    }

    #[test]
    fn test_timing_options() {
        let options = Config::with_timing(150, 40).timing_options();
        assert_eq!(options.words_per_minute, 150);
        assert_eq!(options.answer_time_seconds, 40);
    }

    #[test]
    fn test_yaml_partial_section() {
        let parsed: ConfigFile = serde_yaml::from_str("timing:\n  words_per_minute: 200\n").unwrap();
        let section = parsed.timing.unwrap();
        assert_eq!(section.words_per_minute, Some(200));
        assert_eq!(section.answer_time_seconds, None);
    }
}
