//! Minimal daemon entry point: loads configuration, starts the supervisor,
//! and runs until shutdown. Not a CLI — operators configure via
//! `Settings.toml` or `PYPM__*` env vars, no argument parsing here.

use pypm::config::AppConfig;
use pypm::logger::{self, LogLevel};
use pypm::supervisor::Supervisor;
use pypm::{log, DaemonError};

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if config.debug_mode {
        logger::set_log_level(LogLevel::Trace);
    }

    log!(LogLevel::Info, "Starting pypm daemon (log_frequency={}/min)", config.log_frequency);

    let supervisor = Supervisor::start(&config).await?;
    supervisor.run().await;

    log!(LogLevel::Info, "pypm daemon stopped");
    Ok(())
}
