//! Application configuration.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory, or `--config <path>`
//! 3. Environment variables prefixed `CREDUPE_` (e.g. `CREDUPE_AUTO_POLICY`)
//! 4. Command-line flags, applied by the caller
//!
//! ```toml
//! auto_policy = "domain-credential"
//! interactive_policy = "uri"
//! large_file_warn_mb = 100
//! sample_threshold_mb = 500
//! sample_rows = 100
//! clean_names = false
//! confirm_phrase = "DELETE"
//! mask_passwords = true
//! accessible = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::KeyPolicy;
use crate::records::SamplingLimits;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "CREDUPE_";

/// Keys accepted in `config.toml`.
pub const KNOWN_KEYS: [&str; 9] = [
    "auto_policy",
    "interactive_policy",
    "large_file_warn_mb",
    "sample_threshold_mb",
    "sample_rows",
    "clean_names",
    "confirm_phrase",
    "mask_passwords",
    "accessible",
];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The layered configuration could not be extracted.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("invalid value for '{key}': {message}")]
    Value {
        /// Offending key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grouping policy for `auto` mode
    pub auto_policy: KeyPolicy,
    /// Grouping policy for `interactive` mode
    pub interactive_policy: KeyPolicy,
    /// Warn when the input exceeds this many megabytes
    pub large_file_warn_mb: f64,
    /// Sample instead of reading fully when listing columns above this size
    pub sample_threshold_mb: f64,
    /// Rows read when sampling
    pub sample_rows: usize,
    /// Strip parenthesized fragments from `name` before grouping
    pub clean_names: bool,
    /// Phrase typed to confirm automatic deletion
    pub confirm_phrase: String,
    /// Hide password values in interactive views
    pub mask_passwords: bool,
    /// Plain progress output for screen readers
    pub accessible: bool,
}

impl Default for Config {
    fn default() -> Self {
        let limits = SamplingLimits::default();
        Self {
            auto_policy: KeyPolicy::DomainCredential,
            interactive_policy: KeyPolicy::Uri,
            large_file_warn_mb: limits.large_file_warn_mb,
            sample_threshold_mb: limits.sample_threshold_mb,
            sample_rows: limits.sample_rows,
            clean_names: false,
            confirm_phrase: "DELETE".to_string(),
            mask_passwords: true,
            accessible: false,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// With `explicit` set, that file must exist. Otherwise the platform
    /// config file is used when present. Unknown keys are logged with a
    /// suggestion and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` for a missing explicit file,
    /// `ConfigError::Invalid` for malformed values, and `ConfigError::Value`
    /// when validation fails.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = &file {
            log::debug!("Loading config from {}", path.display());
            for (key, suggestion) in unknown_keys(path) {
                match suggestion {
                    Some(s) => log::warn!("Unknown config key '{}'; did you mean '{}'?", key, s),
                    None => log::warn!("Unknown config key '{}'", key),
                }
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform config file path (`.../credupe/config.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "credupe", "credupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Value` naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auto_policy == KeyPolicy::FullRow {
            return Err(ConfigError::Value {
                key: "auto_policy",
                message: "full-row duplicates are always removed; pick a semantic policy"
                    .to_string(),
            });
        }
        if self.interactive_policy == KeyPolicy::FullRow {
            return Err(ConfigError::Value {
                key: "interactive_policy",
                message: "full-row duplicates are always removed; pick a semantic policy"
                    .to_string(),
            });
        }
        if self.large_file_warn_mb.is_nan() || self.large_file_warn_mb < 0.0 {
            return Err(ConfigError::Value {
                key: "large_file_warn_mb",
                message: format!("must be non-negative, got {}", self.large_file_warn_mb),
            });
        }
        if self.sample_threshold_mb.is_nan() || self.sample_threshold_mb < 0.0 {
            return Err(ConfigError::Value {
                key: "sample_threshold_mb",
                message: format!("must be non-negative, got {}", self.sample_threshold_mb),
            });
        }
        if self.sample_threshold_mb < self.large_file_warn_mb {
            return Err(ConfigError::Value {
                key: "sample_threshold_mb",
                message: format!(
                    "must not be below large_file_warn_mb ({})",
                    self.large_file_warn_mb
                ),
            });
        }
        if self.sample_rows == 0 {
            return Err(ConfigError::Value {
                key: "sample_rows",
                message: "must be at least 1".to_string(),
            });
        }
        if self.confirm_phrase.trim().is_empty() {
            return Err(ConfigError::Value {
                key: "confirm_phrase",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Large-file thresholds for column listing.
    #[must_use]
    pub fn sampling_limits(&self) -> SamplingLimits {
        SamplingLimits {
            large_file_warn_mb: self.large_file_warn_mb,
            sample_threshold_mb: self.sample_threshold_mb,
            sample_rows: self.sample_rows,
        }
    }
}

/// Top-level keys in a TOML file that are not configuration keys, each with
/// the closest known key when one is similar enough.
#[must_use]
pub fn unknown_keys(path: &Path) -> Vec<(String, Option<&'static str>)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return Vec::new();
    };

    table
        .keys()
        .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
        .map(|k| (k.clone(), suggest_key(k)))
        .collect()
}

fn suggest_key(key: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|known| (*known, strsim::jaro_winkler(key, known)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auto_policy, KeyPolicy::DomainCredential);
        assert_eq!(config.interactive_policy, KeyPolicy::Uri);
        assert_eq!(config.confirm_phrase, "DELETE");
    }

    #[test]
    fn test_validate_rejects_zero_sample_rows() {
        let config = Config {
            sample_rows: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Value {
                key: "sample_rows",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_full_row_policy() {
        let config = Config {
            auto_policy: KeyPolicy::FullRow,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_threshold_below_warning() {
        let config = Config {
            large_file_warn_mb: 50.0,
            sample_threshold_mb: 10.0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Value {
                key: "sample_threshold_mb",
                ..
            })
        ));
    }

    #[test]
    fn test_suggest_key() {
        assert_eq!(suggest_key("auto_polcy"), Some("auto_policy"));
        assert_eq!(suggest_key("zzz"), None);
    }

    #[test]
    fn test_sampling_limits_follow_config() {
        let config = Config {
            sample_rows: 7,
            ..Config::default()
        };
        assert_eq!(config.sampling_limits().sample_rows, 7);
    }
}
