pub mod client;
pub mod config;
pub mod control;
pub mod dispatcher;
pub mod error;
pub mod logger;
pub mod process;
pub mod registry;
pub mod sampler;
pub mod server;
pub mod supervisor;
pub mod units;
pub mod wire;

pub use client::{Client, ClientError};
pub use config::AppConfig;
pub use dispatcher::CommandDispatcher;
pub use error::DaemonError;
pub use process::ManagedProcess;
pub use registry::Registry;
pub use supervisor::Supervisor;

// tests
#[path = "../src/tests/units_test.rs"]
mod units_test;

#[path = "../src/tests/wire_test.rs"]
mod wire_test;

#[path = "../src/tests/registry_test.rs"]
mod registry_test;

#[path = "../src/tests/process_test.rs"]
mod process_test;

#[path = "../src/tests/dispatcher_test.rs"]
mod dispatcher_test;

#[path = "../src/tests/client_server_test.rs"]
mod client_server_test;

#[path = "../src/tests/sampler_test.rs"]
mod sampler_test;
