// Errors visible to clients and errors surfaced only to the operator.
//
// Client-visible variants render to the exact `MSG` strings the wire
// protocol promises; operator-visible variants (`PortInUse`, `LogdirMissing`)
// are never written to a socket.

use dusa_collection_utils::errors::ErrorArrayItem;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    /// Zero tokens, or an unrecognized verb.
    #[error("Error: Invalid command")]
    InvalidCommand,

    /// Wrong argument count for the verb.
    #[error("Error: Invalid number of arguments")]
    InvalidArity,

    /// Named process absent from the registry.
    #[error("Error: Couldn't find process '{0}'")]
    NotFound(String),

    /// `add` with an already-registered name.
    #[error("Error: There is already a process named '{0}'")]
    Duplicate(String),

    /// `kill` (or an internal kill) on a process that isn't active.
    #[error("Error: Process '{0}' is not active")]
    NotActive(String),

    /// `start` (with a name) on a process that's already active. Not a hard
    /// failure — the dispatcher turns this into a `Warning:` success frame.
    #[error("Warning: Process '{0}' is already running")]
    AlreadyRunning(String),

    /// Bind failed at daemon startup. Exits the daemon; never reaches a client.
    #[error("port already in use: {0}")]
    PortInUse(#[source] io::Error),

    /// Sampler tick fired with no configured logdir.
    #[error("log directory wasn't specified")]
    LogdirMissing,

    /// Opaque I/O/OS failure; the dispatcher renders these as `Error: Couldn't <verb>`.
    #[error(transparent)]
    Io(#[from] ErrorArrayItem),
}

impl From<io::Error> for DaemonError {
    fn from(value: io::Error) -> Self {
        DaemonError::Io(ErrorArrayItem::from(value))
    }
}
