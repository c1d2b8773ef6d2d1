//! Logging configuration

use anyhow::{bail, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`
    pub level: String,
    pub module_path: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), module_path: false }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("DOCFIELD_LOG_LEVEL") {
            self.level = level;
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        match self.level.parse() {
            Ok(filter) => Ok(filter),
            Err(_) => bail!("unknown log level: {}", self.level),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.level_filter().map(|_| ())
    }
}
