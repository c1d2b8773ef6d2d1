//! Configuration of the document model
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment Variables** (`DOCFIELD_*`)
//! 2. **Config File** (docfield.toml)
//! 3. **Defaults**
//!
//! # Example
//!
//! ```no_run
//! use docfield_core::config::DocfieldConfig;
//!
//! let config = DocfieldConfig::load()?;
//! docfield_core::logging::init_logging(&config.logging)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod logging;
pub mod model;

pub use logging::LoggingConfig;
pub use model::ModelConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocfieldConfig {
    pub model: ModelConfig,
    pub logging: LoggingConfig,
}

impl DocfieldConfig {
    /// Load with the full supersedence chain from `docfield.toml`
    pub fn load() -> Result<Self> {
        Self::load_from("docfield.toml")
    }

    /// Defaults, then the file if it exists, then environment variables
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::default();
        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }
        config.apply_env_vars();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.model.merge(other.model);
        self.logging.merge(other.logging);
    }

    pub fn apply_env_vars(&mut self) {
        self.model.apply_env_vars();
        self.logging.apply_env_vars();
    }

    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DocfieldConfig::default();
        assert_eq!(config.model.version_table_size, 1024);
        assert!(!config.model.ignore_unknown);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DocfieldConfig = toml::from_str("[model]\nignore_unknown = true\n").unwrap();
        assert!(config.model.ignore_unknown);
        assert_eq!(config.model.version_table_size, 1024);
        assert_eq!(config.logging.level, "info");
    }
}
