//! Parses one request line, validates arity, and executes the matching verb
//! against the registry, producing exactly one response frame.
//!
//! One match arm per verb, with `DaemonError` bubbling up to a single caught
//! top-level response rather than letting a single bad request take down the
//! whole server.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::control::ShutdownFlag;
use crate::error::DaemonError;
use crate::log;
use crate::logger::LogLevel;
use crate::process::ManagedProcess;
use crate::registry::Registry;
use crate::units::format_uptime;
use crate::wire::{self, Frame};

pub struct CommandDispatcher {
    registry: Registry,
    shutdown: Arc<ShutdownFlag>,
    addr: SocketAddr,
}

impl CommandDispatcher {
    pub fn new(shutdown: Arc<ShutdownFlag>, addr: SocketAddr) -> Self {
        Self {
            registry: Registry::new(),
            shutdown,
            addr,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Tokenizes `line` with shell-style quoting and dispatches. A blank or
    /// unparsable line renders as `InvalidCommand` — a malformed request must
    /// never crash the server.
    pub async fn dispatch(&mut self, line: &str) -> Frame {
        let tokens = match shell_words::split(line.trim()) {
            Ok(tokens) if !tokens.is_empty() => tokens,
            _ => return err_frame(DaemonError::InvalidCommand),
        };

        let verb = tokens[0].as_str();
        let args = &tokens[1..];

        let result = match verb {
            "list" => self.verb_list(args),
            "mem" => self.verb_mem(args).await,
            "cpu" => self.verb_cpu(args).await,
            "pid" => self.verb_pid(args),
            "uptime" => self.verb_uptime(args),
            "stdout" => self.verb_stdout(args).await,
            "stderr" => self.verb_stderr(args).await,
            "add" => self.verb_add(args),
            "start" => self.verb_start(args).await,
            "restart" => self.verb_restart(args).await,
            "rem" => self.verb_rem(args).await,
            "kill" => self.verb_kill(args).await,
            "stop" => self.verb_stop(args),
            _ => Err(DaemonError::InvalidCommand),
        };

        match result {
            Ok(frame) => frame,
            Err(DaemonError::AlreadyRunning(name)) => Frame::Msg(format!("Warning: Process '{}' is already running", name)),
            Err(e) => {
                log!(LogLevel::Debug, "Verb '{}' failed: {}", verb, e);
                err_frame_for_verb(e, verb)
            }
        }
    }

    fn verb_list(&self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[0])?;
        let records: Vec<(String, String)> = self
            .registry
            .list()
            .map(|p| (p.name().to_string(), p.command().to_string()))
            .collect();
        Ok(Frame::Data(wire::encode_list(&records)))
    }

    async fn verb_mem(&self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[0, 1])?;
        let names = self.target_names(args)?;
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let process = self.registry.find(&name)?;
            records.push((name, process.get_mem_usage().await as f64));
        }
        Ok(Frame::Data(wire::encode_f64_records(&records)))
    }

    async fn verb_cpu(&self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[0, 1])?;
        let names = self.target_names(args)?;
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let process = self.registry.find(&name)?;
            records.push((name, process.get_cpu_perc().await as f64));
        }
        Ok(Frame::Data(wire::encode_f64_records(&records)))
    }

    fn verb_pid(&self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[0, 1])?;
        let names = self.target_names(args)?;
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let process = self.registry.find(&name)?;
            records.push((name, process.pid()));
        }
        Ok(Frame::Data(wire::encode_i32_records(&records)))
    }

    async fn verb_uptime(&self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[0, 1])?;
        let names = self.target_names(args)?;
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let process = self.registry.find(&name)?;
            records.push((name, format_uptime(process.uptime().await.as_secs())));
        }
        Ok(Frame::Data(wire::encode_uptime_records(&records)))
    }

    async fn verb_stdout(&self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[1])?;
        let process = self.registry.find(&args[0])?;
        Ok(Frame::Data(process.stdout_tail().await))
    }

    async fn verb_stderr(&self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[1])?;
        let process = self.registry.find(&args[0])?;
        Ok(Frame::Data(process.stderr_tail().await))
    }

    fn verb_add(&mut self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[5])?;
        let [name, command, log_cpu, log_mem, dir] = match <[String; 5]>::try_from(args.to_vec()) {
            Ok(arr) => arr,
            Err(_) => return Err(DaemonError::InvalidArity),
        };
        let log_cpu = parse_bool(&log_cpu);
        let log_mem = parse_bool(&log_mem);
        let process = ManagedProcess::new(name.clone(), command, dir, log_cpu, log_mem);
        self.registry.add(process)?;
        Ok(Frame::Msg(format!("Successfully added process '{}'", name)))
    }

    async fn verb_start(&mut self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[0, 1])?;
        if let Some(name) = args.first() {
            let process = self.registry.find_mut(name)?;
            process.start(true).await?;
            return Ok(Frame::Msg(format!("Successfully started process '{}'", name)));
        }

        let total = self.registry.names().count();
        if total == 0 {
            return Ok(Frame::Msg("Warning: No processes to start".to_string()));
        }

        let names: Vec<String> = self.registry.names().map(|s| s.to_string()).collect();
        let mut started = 0;
        for name in &names {
            let process = self.registry.find_mut(name)?;
            if process.poll_active().await {
                continue;
            }
            if process.start(true).await.is_ok() {
                started += 1;
            }
        }

        if started == 0 {
            Ok(Frame::Msg("Warning: No processes were started".to_string()))
        } else {
            Ok(Frame::Msg(format!("Started {} out of {} processes", started, total)))
        }
    }

    async fn verb_restart(&mut self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[1])?;
        let name = &args[0];
        let process = self.registry.find_mut(name)?;
        if process.poll_active().await {
            process.kill().await?;
        }
        process.start(true).await?;
        Ok(Frame::Msg(format!("Successfully restarted process '{}'", name)))
    }

    async fn verb_rem(&mut self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[1])?;
        let name = &args[0];
        {
            let process = self.registry.find_mut(name)?;
            if process.poll_active().await {
                process.kill().await?;
            }
        }
        self.registry.remove(name)?;
        Ok(Frame::Msg(format!("Successfully removed process '{}'", name)))
    }

    async fn verb_kill(&mut self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[1])?;
        let name = &args[0];
        let process = self.registry.find_mut(name)?;
        process.kill().await?;
        Ok(Frame::Msg(format!("Successfully killed process '{}'", name)))
    }

    fn verb_stop(&mut self, args: &[String]) -> Result<Frame, DaemonError> {
        require_arity(args, &[0])?;
        self.shutdown.set();
        Ok(Frame::Msg(format!("Stopped pypm running on {}", self.addr)))
    }

    /// Resolves an arity-0/1 query's target set: every registered name if
    /// `args` is empty, or the single named process (checked against the
    /// registry so a `NotFound` surfaces before encoding begins).
    fn target_names(&self, args: &[String]) -> Result<Vec<String>, DaemonError> {
        if let Some(name) = args.first() {
            self.registry.find(name)?;
            Ok(vec![name.clone()])
        } else {
            Ok(self.registry.names().map(|s| s.to_string()).collect())
        }
    }
}

fn require_arity(args: &[String], allowed: &[usize]) -> Result<(), DaemonError> {
    if allowed.contains(&args.len()) {
        Ok(())
    } else {
        Err(DaemonError::InvalidArity)
    }
}

fn parse_bool(token: &str) -> bool {
    matches!(token.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn err_frame(e: DaemonError) -> Frame {
    Frame::Msg(e.to_string())
}

fn err_frame_for_verb(e: DaemonError, verb: &str) -> Frame {
    match e {
        DaemonError::InvalidCommand
        | DaemonError::InvalidArity
        | DaemonError::NotFound(_)
        | DaemonError::Duplicate(_)
        | DaemonError::NotActive(_) => Frame::Msg(e.to_string()),
        _ => Frame::Msg(format!("Error: Couldn't {}", verb)),
    }
}
