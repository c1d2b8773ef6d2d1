//! Logger installation
//!
//! The crate logs through the `log` facade only. Applications that want the
//! output on stderr install `env_logger` once at startup:
//!
//! ```no_run
//! use docfield_core::config::LoggingConfig;
//!
//! docfield_core::logging::init_logging(&LoggingConfig::default())?;
//! log::info!("model registered");
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::LoggingConfig;

/// Install `env_logger` at the configured level; `RUST_LOG` directives take
/// precedence. Safe to call more than once.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = config.level_filter()?;
    let installed = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .format_module_path(config.module_path)
        .try_init();
    if installed.is_err() {
        log::debug!("logger already installed, keeping it");
    }
    Ok(())
}
