//! Run configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid step selector '{0}', expected PART.STEP")]
    InvalidStep(String),
}

/// What to run and how long to wait
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seconds to wait after a clear before checking erased data
    #[serde(default = "default_settle_seconds")]
    pub settle_seconds: u32,

    /// Length of one settle second; shortened for demos against the simulator
    #[serde(default = "default_settle_unit_ms")]
    pub settle_unit_ms: u64,

    /// Steps to run as "PART.STEP"; empty runs every step
    #[serde(default)]
    pub steps: Vec<String>,
}

fn default_settle_seconds() -> u32 {
    5
}

fn default_settle_unit_ms() -> u64 {
    1000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            settle_seconds: default_settle_seconds(),
            settle_unit_ms: default_settle_unit_ms(),
            steps: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for selector in &self.steps {
            parse_selector(selector)?;
        }
        Ok(())
    }

    pub fn settle_unit(&self) -> Duration {
        Duration::from_millis(self.settle_unit_ms)
    }

    /// Whether the step `part.step` is selected
    pub fn selects(&self, part: u8, step: u8) -> bool {
        self.steps.is_empty()
            || self
                .steps
                .iter()
                .filter_map(|s| parse_selector(s).ok())
                .any(|id| id == (part, step))
    }
}

fn parse_selector(selector: &str) -> Result<(u8, u8), ConfigError> {
    let invalid = || ConfigError::InvalidStep(selector.to_string());
    let (part, step) = selector.trim().split_once('.').ok_or_else(invalid)?;
    Ok((
        part.parse().map_err(|_| invalid())?,
        step.parse().map_err(|_| invalid())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config: RunConfig = toml::from_str("").unwrap();
        assert_eq!(config.settle_seconds, 5);
        assert_eq!(config.settle_unit(), Duration::from_secs(1));
        assert!(config.selects(12, 9));
    }

    #[test]
    fn test_step_selection() {
        let config = RunConfig {
            steps: vec!["3.7".to_string(), "12.9".to_string()],
            ..RunConfig::default()
        };
        assert!(config.selects(3, 7));
        assert!(config.selects(12, 9));
        assert!(!config.selects(2, 9));
    }

    #[test]
    fn test_load_rejects_bad_selector() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "steps = [\"12-9\"]").unwrap();
        assert!(matches!(
            RunConfig::load(file.path()),
            Err(ConfigError::InvalidStep(s)) if s == "12-9"
        ));
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "settle_unit_ms = 10\nsteps = [\"2.9\"]").unwrap();
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.settle_unit(), Duration::from_millis(10));
        assert_eq!(config.steps, vec!["2.9"]);
    }
}
