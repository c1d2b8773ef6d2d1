//! Document model configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Upper bound of a per-class version table
pub const MAX_VERSION_TABLE_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Capacity of the version table of newly registered classes, 0 disables it
    pub version_table_size: usize,
    /// Drop unknown fields when an in-memory store persists documents
    pub ignore_unknown: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { version_table_size: 1024, ignore_unknown: false }
    }
}

impl ModelConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(size) = env::var("DOCFIELD_VERSION_TABLE_SIZE") {
            match size.parse() {
                Ok(size) => self.version_table_size = size,
                Err(_) => log::warn!("ignoring DOCFIELD_VERSION_TABLE_SIZE={size}: not a number"),
            }
        }
        if let Ok(flag) = env::var("DOCFIELD_IGNORE_UNKNOWN") {
            self.ignore_unknown = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version_table_size > MAX_VERSION_TABLE_SIZE {
            bail!(
                "version_table_size {} exceeds the maximum of {}",
                self.version_table_size,
                MAX_VERSION_TABLE_SIZE
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_version_table_is_rejected() {
        let config = ModelConfig { version_table_size: MAX_VERSION_TABLE_SIZE + 1, ..ModelConfig::default() };
        assert!(config.validate().is_err());
        assert!(ModelConfig { version_table_size: 0, ..ModelConfig::default() }.validate().is_ok());
    }
}
