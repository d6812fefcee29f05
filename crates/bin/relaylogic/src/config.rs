//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `relaylogic.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;

use relaylogic_domain::settings::CompileSettings;
use serde::Deserialize;

const CONFIG_FILE: &str = "relaylogic.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the fact files live.
    pub facts: FactsConfig,
    /// Where compiled programs go.
    pub output: OutputConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Constants folded into every program.
    pub compile: CompileSettings,
    /// Optional replay of input events against one device.
    pub dry_run: DryRunConfig,
}

/// Fact file locations.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FactsConfig {
    /// Device registry (JSON array of devices).
    pub devices: PathBuf,
    /// Rule set (JSON array of rules).
    pub rules: PathBuf,
}

/// Program output location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one `<device>.js` per device.
    pub dir: PathBuf,
}

/// Dry-run settings. Nothing is replayed unless `device` is set.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DryRunConfig {
    /// Device whose program is executed.
    pub device: Option<String>,
    /// Replay file (JSON array of timed input events).
    pub events: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `relaylogic.toml` (if present), apply
    /// environment-variable overrides, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("RELAYLOGIC_DEVICES") {
            self.facts.devices = val.into();
        }
        if let Some(val) = var("RELAYLOGIC_RULES") {
            self.facts.rules = val.into();
        }
        if let Some(val) = var("RELAYLOGIC_OUT_DIR") {
            self.output.dir = val.into();
        }
        if let Some(val) = var("RELAYLOGIC_DRY_RUN_DEVICE") {
            self.dry_run.device = Some(val);
        }
        if let Some(val) = var("RELAYLOGIC_DRY_RUN_EVENTS") {
            self.dry_run.events = val.into();
        }
        if let Some(val) = var("RELAYLOGIC_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.compile
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.output.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output directory must not be empty".to_string(),
            ));
        }
        if self
            .dry_run
            .device
            .as_deref()
            .is_some_and(|device| device.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "dry-run device must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            devices: PathBuf::from("devices.json"),
            rules: PathBuf::from("rules.json"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("programs"),
        }
    }
}

impl Default for DryRunConfig {
    fn default() -> Self {
        Self {
            device: None,
            events: PathBuf::from("events.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "relaylogic=info,relaylogic_app=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
