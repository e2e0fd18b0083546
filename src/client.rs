//! Thin client library: encode a request, send it, decode the response
//! frame into typed values.
//!
//! Same write-then-read-to-completion idiom as the daemon's own socket
//! handling, over a `TcpStream` carrying a tag+payload frame rather than a
//! length-prefixed JSON message.

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::server::MAX_REQUEST_BYTES;
use crate::wire::{self, Frame, TAG_DATA, TAG_MSG};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection to {0} failed: {1}")]
    Connect(SocketAddr, std::io::Error),
    #[error("I/O error talking to the daemon: {0}")]
    Io(#[from] std::io::Error),
    #[error("daemon sent an empty or malformed response")]
    MalformedResponse,
    #[error("{0}")]
    Daemon(String),
}

/// One logical record returned by a multi-process query.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub name: String,
    pub command: String,
}

pub struct Client {
    addr: SocketAddr,
}

impl Client {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Sends one request line and returns the raw decoded frame. Most
    /// callers want the typed `list`/`mem`/`cpu`/... helpers below.
    pub async fn request(&self, line: &str) -> Result<Frame, ClientError> {
        let mut stream = TcpStream::connect(self.addr)
            .await
            .map_err(|e| ClientError::Connect(self.addr, e))?;
        stream.write_all(line.as_bytes()).await?;

        let mut received = Vec::new();
        loop {
            let mut chunk = vec![0u8; MAX_REQUEST_BYTES];
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
            if n < MAX_REQUEST_BYTES {
                break;
            }
        }
        let (tag, payload) = Frame::split(&received).ok_or(ClientError::MalformedResponse)?;
        match tag {
            TAG_MSG => Ok(Frame::Msg(String::from_utf8_lossy(payload).into_owned())),
            TAG_DATA => Ok(Frame::Data(payload.to_vec())),
            _ => Err(ClientError::MalformedResponse),
        }
    }

    /// Joins `verb` and `args` with single spaces, letting the daemon
    /// re-tokenize with shell rules; the client applies no quoting itself —
    /// callers must pre-quote arguments containing spaces.
    async fn command(&self, verb: &str, args: &[&str]) -> Result<Frame, ClientError> {
        let mut line = verb.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.request(&line).await
    }

    pub async fn list(&self) -> Result<Vec<ListEntry>, ClientError> {
        let frame = self.command("list", &[]).await?;
        let payload = data_payload(frame)?;
        Ok(wire::decode_list(&payload)
            .into_iter()
            .map(|(name, command)| ListEntry { name, command })
            .collect())
    }

    pub async fn mem(&self, name: Option<&str>) -> Result<Vec<(String, f64)>, ClientError> {
        let args: Vec<&str> = name.into_iter().collect();
        let frame = self.command("mem", &args).await?;
        Ok(wire::decode_f64_records(&data_payload(frame)?))
    }

    pub async fn cpu(&self, name: Option<&str>) -> Result<Vec<(String, f64)>, ClientError> {
        let args: Vec<&str> = name.into_iter().collect();
        let frame = self.command("cpu", &args).await?;
        Ok(wire::decode_f64_records(&data_payload(frame)?))
    }

    pub async fn pid(&self, name: Option<&str>) -> Result<Vec<(String, i32)>, ClientError> {
        let args: Vec<&str> = name.into_iter().collect();
        let frame = self.command("pid", &args).await?;
        Ok(wire::decode_i32_records(&data_payload(frame)?))
    }

    pub async fn uptime(&self, name: Option<&str>) -> Result<Vec<(String, String)>, ClientError> {
        let args: Vec<&str> = name.into_iter().collect();
        let frame = self.command("uptime", &args).await?;
        Ok(wire::decode_uptime_records(&data_payload(frame)?))
    }

    pub async fn stdout(&self, name: &str) -> Result<Vec<u8>, ClientError> {
        let frame = self.command("stdout", &[name]).await?;
        data_payload(frame)
    }

    pub async fn stderr(&self, name: &str) -> Result<Vec<u8>, ClientError> {
        let frame = self.command("stderr", &[name]).await?;
        data_payload(frame)
    }

    pub async fn add(&self, name: &str, command_line: &str, log_cpu: bool, log_mem: bool, dir: &str) -> Result<String, ClientError> {
        let quoted_command = format!("'{}'", command_line);
        let args = [name, quoted_command.as_str(), bool_token(log_cpu), bool_token(log_mem), dir];
        let frame = self.command("add", &args).await?;
        msg_payload(frame)
    }

    pub async fn start(&self, name: Option<&str>) -> Result<String, ClientError> {
        let args: Vec<&str> = name.into_iter().collect();
        let frame = self.command("start", &args).await?;
        msg_payload(frame)
    }

    pub async fn restart(&self, name: &str) -> Result<String, ClientError> {
        msg_payload(self.command("restart", &[name]).await?)
    }

    pub async fn rem(&self, name: &str) -> Result<String, ClientError> {
        msg_payload(self.command("rem", &[name]).await?)
    }

    pub async fn kill(&self, name: &str) -> Result<String, ClientError> {
        msg_payload(self.command("kill", &[name]).await?)
    }

    pub async fn stop(&self) -> Result<String, ClientError> {
        msg_payload(self.command("stop", &[]).await?)
    }
}

fn bool_token(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn data_payload(frame: Frame) -> Result<Vec<u8>, ClientError> {
    match frame {
        Frame::Data(payload) => Ok(payload),
        Frame::Msg(msg) => Err(ClientError::Daemon(msg)),
    }
}

fn msg_payload(frame: Frame) -> Result<String, ClientError> {
    match frame {
        Frame::Msg(msg) => Ok(msg),
        Frame::Data(_) => Err(ClientError::MalformedResponse),
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.command)
    }
}
