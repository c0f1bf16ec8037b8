//! Engine bridge communication.
//!
//! An engine that does not run in-process is reached through a bridge: a
//! long-running child process that owns the engine connection. Prism
//! writes one JSON request per line to its stdin and reads one JSON
//! response per line from its stdout; the `olap.*` methods in
//! [`protocol::methods`] mirror the [`Engine`](crate::engine::Engine)
//! operations one to one.
//!
//! ```ignore
//! use prism::worker::{BridgeClient, protocol::*};
//!
//! let client = BridgeClient::spawn("./olap-bridge", &[], Duration::from_secs(30)).await?;
//! let names: CubeNamesResponse = client.request(methods::CUBE_NAMES, NoParams::default()).await?;
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::BridgeClient;
pub use error::{WorkerError, WorkerResult};
