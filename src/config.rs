//! Daemon configuration: port, logdir, log_frequency, debug_mode. Loaded
//! through a `ConfigBuilder` pipeline — defaults, an optional file source,
//! then prefixed environment overrides — narrowed to the fields this daemon
//! actually reads.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AppConfig {
    /// TCP port the supervisor binds on loopback.
    pub port: u16,

    /// Directory the metric sampler appends `<name>_log_mem`/`<name>_log_cpu`
    /// to. `None` disables disk logging; the sampler then reports
    /// `LogdirMissing` on every tick.
    pub logdir: Option<PathBuf>,

    /// Sampler ticks per minute (ticks happen every `60 / log_frequency`
    /// seconds).
    pub log_frequency: u32,

    /// Raises the logger's default level to `Trace` when set, mirroring the
    /// original's `PYPMDEBUG` environment toggle.
    pub debug_mode: bool,
}

impl AppConfig {
    /// Loads configuration from `Settings.toml` (optional), a run-mode
    /// overlay, then `PYPM_`-prefixed environment variables, falling back to
    /// hardcoded defaults when none of those sources set a field.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("port", 8080)?
            .set_default("logdir", None::<String>)?
            .set_default("log_frequency", 30)?
            .set_default("debug_mode", false)?
            .add_source(File::with_name("Settings").required(false))
            .add_source(File::with_name(&format!("Settings.{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("PYPM").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be nonzero".into());
        }
        if self.log_frequency == 0 {
            return Err("log_frequency must be greater than 0".into());
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            logdir: None,
            log_frequency: 30,
            debug_mode: false,
        }
    }
}
