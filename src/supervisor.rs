//! Orchestrates the accept loop and the sampler tick on a single task,
//! shutdown, and final reaping.
//!
//! Bind, spawn workers, `tokio::select!` against a shutdown signal, then a
//! drain/cleanup phase. Registry mutation and sampler reads interleave on
//! this one task via `select!`, so no registry lock is needed.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::control::ShutdownFlag;
use crate::dispatcher::CommandDispatcher;
use crate::error::DaemonError;
use crate::log;
use crate::logger::LogLevel;
use crate::sampler::MetricSampler;
use crate::server::{self, TcpServer};

pub struct Supervisor {
    server: TcpServer,
    dispatcher: CommandDispatcher,
    sampler: MetricSampler,
    shutdown: Arc<ShutdownFlag>,
    log_frequency: u32,
}

impl Supervisor {
    /// Binds the TCP listener and wires up the dispatcher/sampler. Bind
    /// failures propagate as [`DaemonError::PortInUse`].
    pub async fn start(config: &AppConfig) -> Result<Self, DaemonError> {
        let server = TcpServer::bind(config.port).await?;
        let addr = server.local_addr();
        let shutdown = Arc::new(ShutdownFlag::new());
        let dispatcher = CommandDispatcher::new(shutdown.clone(), addr);
        let sampler = MetricSampler::new(config.logdir.clone());

        log!(LogLevel::Info, "pypm daemon listening on {}", addr);

        Ok(Self {
            server,
            dispatcher,
            sampler,
            shutdown,
            log_frequency: config.log_frequency,
        })
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.server.local_addr()
    }

    pub fn shutdown_flag(&self) -> Arc<ShutdownFlag> {
        self.shutdown.clone()
    }

    /// Runs until the shutdown flag is set, by a `stop` request or by
    /// `ctrl_c`, then kills every still-active child.
    pub async fn run(mut self) {
        let period = std::time::Duration::from_secs_f64(60.0 / self.log_frequency.max(1) as f64);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                accepted = self.server.accept_request() => {
                    match accepted {
                        Ok(Some((line, mut stream))) => {
                            server::serve_one(&mut self.dispatcher, &line, &mut stream).await;
                        }
                        Ok(None) => {}
                        Err(e) => log!(LogLevel::Warn, "Accept failed: {}", e),
                    }
                    if self.shutdown.is_set() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sampler.tick(self.dispatcher.registry()).await {
                        match e {
                            DaemonError::LogdirMissing => {
                                log!(LogLevel::Warn, "Sampler tick skipped: no logdir configured");
                            }
                            other => log!(LogLevel::Error, "Sampler tick failed: {}", other),
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    log!(LogLevel::Info, "Received interrupt, shutting down");
                    self.shutdown.set();
                }
            }

            if self.shutdown.is_set() {
                break;
            }
        }

        self.drain().await;
    }

    async fn drain(&mut self) {
        let names: Vec<String> = self.dispatcher.registry().names().map(|s| s.to_string()).collect();
        for name in names {
            if let Ok(process) = self.dispatcher.registry_mut().find_mut(&name) {
                if process.poll_active().await {
                    if let Err(e) = process.kill().await {
                        log!(LogLevel::Warn, "Failed to kill '{}' during shutdown: {}", name, e);
                    }
                }
            }
        }
    }
}
