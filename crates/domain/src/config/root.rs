use serde::{Deserialize, Serialize};

use super::dns::DnsParserConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;

const LOCAL_CONFIG_PATH: &str = "dnswatch.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/dnswatch/config.toml";

/// Main configuration structure for dnswatch
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Parser limits (flood threshold, memcaps)
    #[serde(default)]
    pub dns: DnsParserConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. dnswatch.toml in current directory
    /// 3. /etc/dnswatch/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(flood) = overrides.request_flood {
            self.dns.request_flood = flood;
        }
        if let Some(memcap) = overrides.state_memcap {
            self.dns.state_memcap = memcap;
        }
        if let Some(memcap) = overrides.global_memcap {
            self.dns.global_memcap = memcap;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dns.global_memcap != 0
            && self.dns.state_memcap != 0
            && self.dns.state_memcap > self.dns.global_memcap
        {
            return Err(ConfigError::Validation(format!(
                "state_memcap ({}) exceeds global_memcap ({})",
                self.dns.state_memcap, self.dns.global_memcap
            )));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "Unknown log format '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Some(LOCAL_CONFIG_PATH.to_string())
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Some(SYSTEM_CONFIG_PATH.to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub request_flood: Option<u32>,
    pub state_memcap: Option<u64>,
    pub global_memcap: Option<u64>,
    pub log_level: Option<String>,
}
