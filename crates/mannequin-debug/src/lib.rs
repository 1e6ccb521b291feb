//! Preview tooling for mannequin - line-delimited JSON commands over TCP
//!
//! Start the tooling server next to the tick loop:
//! ```ignore
//! let handler = Arc::new(Mutex::new(studio));
//! let server = DebugServer::start(handler, "127.0.0.1:9742").await?;
//! ```
//!
//! Each request is one JSON object per line, e.g.
//! `{"cmd":"Select","params":{"actor":"...","name":"wave"}}`, answered by one
//! JSON response line.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{ClientError, DebugClient};
pub use protocol::*;
pub use server::{DebugHandler, DebugServer};

/// Default tooling server port
pub const DEFAULT_PORT: u16 = 9742;
