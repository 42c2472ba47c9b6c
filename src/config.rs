//! Ledger configuration

use serde::Deserialize;
use thiserror::Error;

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::blockchain::pow::{ProofOfWork, MAX_DIFFICULTY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Leading zero hex characters required of a proof of work digest
    pub difficulty: usize,
    /// Give up mining after this many attempts
    pub max_attempts: Option<u64>,
    /// Give up mining after this many milliseconds
    pub timeout_ms: Option<u64>,
    /// Seed for the block nonce generator; entropy seeded when absent
    pub nonce_seed: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            max_attempts: None,
            timeout_ms: None,
            nonce_seed: None,
        }
    }
}

fn default_difficulty() -> usize {
    4
}

impl LedgerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml_str(&config_str)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::Invalid(format!(
                "difficulty must be at most {}, got {}",
                MAX_DIFFICULTY, self.difficulty
            )));
        }

        if self.max_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "max_attempts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The mining policy described by this config
    pub fn proof_of_work(&self) -> ProofOfWork {
        ProofOfWork::new(self.difficulty)
            .with_max_attempts(self.max_attempts)
            .with_timeout(self.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::from_toml_str("").unwrap();

        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_parse_all_fields() {
        let config = LedgerConfig::from_toml_str(
            "difficulty = 2\nmax_attempts = 1000\ntimeout_ms = 250\nnonce_seed = 9\n",
        )
        .unwrap();

        assert_eq!(config.difficulty, 2);
        assert_eq!(config.max_attempts, Some(1000));
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.nonce_seed, Some(9));
        assert_eq!(config.proof_of_work().difficulty(), 2);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            LedgerConfig::from_toml_str("difficulty = 33"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("max_attempts = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("difficulty = \"high\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("reward = 50"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "difficulty = 3").unwrap();

        let config = LedgerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.difficulty, 3);

        assert!(matches!(
            LedgerConfig::from_file("/nonexistent/ledger.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
