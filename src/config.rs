//! Configuration loading for the scan rig.
//!
//! Strongly-typed configuration loaded with Figment from:
//! 1. `config/scan-rig.toml` (base configuration)
//! 2. Environment variables (prefixed with `SCAN_RIG_`, with `__` between
//!    table and field, e.g. `SCAN_RIG_SCAN__DEFAULT_TIMEOUT=30s`)
//!
//! # Example
//! ```no_run
//! use scan_rig::config::RigConfig;
//!
//! # fn main() -> Result<(), scan_rig::error::RigError> {
//! let config = RigConfig::load()?;
//! println!("Topic: {}", config.scan.topic);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{RigError, RigResult};

/// Top-level rig configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Message broker endpoint
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Scan correlation settings
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Broker endpoint the caller connects before running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker hostname
    #[serde(default = "default_broker_host")]
    pub host: String,
    /// Broker port
    #[serde(default = "default_broker_port")]
    pub port: u16,
}

/// Scan correlation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Well-known topic all scan events are published on
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Instrument session newly acquired data is booked against
    #[serde(default = "default_instrument_session")]
    pub instrument_session: String,
    /// Default deadline for the completion wait
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub default_timeout: Duration,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            instrument_session: default_instrument_session(),
            default_timeout: default_timeout(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "scan-rig".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    61613
}

fn default_topic() -> String {
    "gda.messages.scan".to_string()
}

fn default_instrument_session() -> String {
    "cm40661-1".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl RigConfig {
    /// Load configuration from `config/scan-rig.toml` and environment
    /// variables. Environment variables override the file with prefix
    /// `SCAN_RIG_` and `__` as the table separator, so field names that
    /// themselves contain underscores stay addressable:
    /// `SCAN_RIG_BROKER__PORT=61614`,
    /// `SCAN_RIG_APPLICATION__LOG_LEVEL=debug`.
    pub fn load() -> RigResult<Self> {
        Self::load_from("config/scan-rig.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> RigResult<Self> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SCAN_RIG_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> RigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(RigError::ConfigValidation(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.broker.port == 0 {
            return Err(RigError::ConfigValidation(
                "Broker port must be non-zero".to_string(),
            ));
        }

        if self.scan.topic.trim().is_empty() {
            return Err(RigError::ConfigValidation(
                "Scan topic must not be empty".to_string(),
            ));
        }

        if self.scan.default_timeout.is_zero() {
            return Err(RigError::ConfigValidation(
                "Default timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RigConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scan.topic, "gda.messages.scan");
        assert_eq!(config.broker.port, 61613);
        assert_eq!(config.scan.default_timeout, Duration::from_secs(10));
    }

    #[test]
    fn parses_humantime_timeout() {
        let config: RigConfig = toml::from_str(
            r#"
            [application]
            name = "scan-rig"
            log_level = "debug"

            [scan]
            topic = "gda.messages.scan"
            default_timeout = "2m 30s"
            "#,
        )
        .expect("config should parse");
        assert_eq!(config.scan.default_timeout, Duration::from_secs(150));
        assert_eq!(config.application.log_level, "debug");
    }

    #[test]
    fn env_overrides_reach_multi_word_fields() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SCAN_RIG_APPLICATION__LOG_LEVEL", "debug");
            jail.set_env("SCAN_RIG_SCAN__DEFAULT_TIMEOUT", "45s");
            jail.set_env("SCAN_RIG_SCAN__INSTRUMENT_SESSION", "cm40661-2");
            jail.set_env("SCAN_RIG_BROKER__PORT", "61614");

            let config =
                RigConfig::load_from("absent.toml").expect("env-only config should load");
            assert_eq!(config.application.log_level, "debug");
            assert_eq!(config.scan.default_timeout, Duration::from_secs(45));
            assert_eq!(config.scan.instrument_session, "cm40661-2");
            assert_eq!(config.broker.port, 61614);
            Ok(())
        });
    }

    #[test]
    fn rejects_invalid_log_level() {
        let mut config = RigConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_topic() {
        let mut config = RigConfig::default();
        config.scan.topic = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = RigConfig::default();
        config.scan.default_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
