//! Binds a loopback TCP listener and serves one request per connection:
//! accept, read, dispatch, reply, close.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::dispatcher::CommandDispatcher;
use crate::error::DaemonError;
use crate::log;
use crate::logger::LogLevel;

/// Maximum request size; a single `recv` is sufficient since the protocol is
/// one line per connection.
pub const MAX_REQUEST_BYTES: usize = 2048;

pub struct TcpServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpServer {
    /// Binds `localhost:<port>`. Maps a failed bind to
    /// [`DaemonError::PortInUse`] so the caller can fail fast at startup.
    pub async fn bind(port: u16) -> Result<Self, DaemonError> {
        let addr: SocketAddr = ([127, 0, 0, 1], port).into();
        let listener = TcpListener::bind(addr).await.map_err(DaemonError::PortInUse)?;
        let addr = listener.local_addr().map_err(DaemonError::PortInUse)?;
        Ok(Self { listener, addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accepts one connection, reads up to [`MAX_REQUEST_BYTES`], and
    /// returns the decoded request line paired with the stream to reply on.
    /// A blank request is returned as `None` so the caller can skip
    /// dispatching it.
    pub async fn accept_request(&self) -> std::io::Result<Option<(String, TcpStream)>> {
        let (mut stream, _) = self.listener.accept().await?;
        let mut buf = vec![0u8; MAX_REQUEST_BYTES];
        let n = stream.read(&mut buf).await?;
        let line = String::from_utf8_lossy(&buf[..n]).into_owned();
        if line.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some((line, stream)))
    }
}

pub async fn reply(stream: &mut TcpStream, frame: crate::wire::Frame) {
    if let Err(e) = stream.write_all(&frame.into_bytes()).await {
        log!(LogLevel::Warn, "Failed to write response: {}", e);
    }
}

/// Convenience used by the dispatcher's `add`-with-name start path and the
/// example binaries: runs one dispatch cycle end to end against an already
/// accepted connection.
pub async fn serve_one(dispatcher: &mut CommandDispatcher, line: &str, stream: &mut TcpStream) {
    let frame = dispatcher.dispatch(line).await;
    reply(stream, frame).await;
}
