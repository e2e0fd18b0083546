//! Periodic on-disk append of per-process CPU/memory samples.
//!
//! Driven from the supervisor's own `select!` loop rather than a separate
//! task, so the registry it reads needs no lock of its own.

use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::DaemonError;
use crate::log;
use crate::logger::LogLevel;
use crate::registry::Registry;

pub struct MetricSampler {
    logdir: Option<PathBuf>,
}

impl MetricSampler {
    pub fn new(logdir: Option<PathBuf>) -> Self {
        Self { logdir }
    }

    pub fn logdir(&self) -> Option<&Path> {
        self.logdir.as_deref()
    }

    /// One sampler tick: appends one sample per process in `log_mem_set`
    /// and `log_cpu_set`. Fails with [`DaemonError::LogdirMissing`] if no
    /// logdir is configured; the supervisor logs that and moves on rather
    /// than let it unwind the loop.
    pub async fn tick(&self, registry: &Registry) -> Result<(), DaemonError> {
        let dir = self.logdir.as_deref().ok_or(DaemonError::LogdirMissing)?;
        if !fs::try_exists(dir).await.unwrap_or(false) {
            fs::create_dir_all(dir).await?;
        }

        for name in registry.log_mem_set() {
            let Ok(process) = registry.find(name) else { continue };
            let bytes = process.get_mem_usage().await as f64;
            if let Err(e) = append_sample(dir, name, "_log_mem", bytes).await {
                log!(LogLevel::Error, "Failed to append mem sample for '{}': {}", name, e);
            }
        }

        for name in registry.log_cpu_set() {
            let Ok(process) = registry.find(name) else { continue };
            let perc = process.get_cpu_perc().await as f64;
            if let Err(e) = append_sample(dir, name, "_log_cpu", perc).await {
                log!(LogLevel::Error, "Failed to append cpu sample for '{}': {}", name, e);
            }
        }

        Ok(())
    }
}

async fn append_sample(dir: &Path, name: &str, suffix: &str, value: f64) -> std::io::Result<()> {
    let path = dir.join(format!("{}{}", name, suffix));
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(&value.to_le_bytes()).await
}
