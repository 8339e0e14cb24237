use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::AutosavePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
        }
    }
}

impl AutosaveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.interval_secs == 0 {
            anyhow::bail!("autosave.interval_secs must be positive");
        }
        Ok(())
    }

    pub fn policy(&self) -> AutosavePolicy {
        if self.enabled {
            AutosavePolicy::every(Duration::from_secs(self.interval_secs))
        } else {
            AutosavePolicy::disabled()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Log to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_path: PathBuf,
    pub operator: Option<String>,
    pub autosave: AutosaveConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(".checkrun"),
            operator: None,
            autosave: AutosaveConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = config_path.unwrap_or_else(Self::default_config_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config
                .autosave
                .validate()
                .with_context(|| format!("Invalid config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn default_config_path() -> PathBuf {
        if let Some(config_path) = std::env::var_os("CHECKRUN_CONFIG") {
            PathBuf::from(config_path)
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("checkrun")
                .join("config.yaml")
        }
    }

    pub fn with_store_path(mut self, store_path: PathBuf) -> Self {
        self.store_path = store_path;
        self
    }

    pub fn with_autosave_interval(mut self, interval_secs: u64) -> Self {
        self.autosave.interval_secs = interval_secs;
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }
}
