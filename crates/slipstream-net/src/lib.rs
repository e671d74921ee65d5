//! Message transport for slipstream - tagged JSON messages over TCP
//!
//! The simulation never touches sockets directly. It drains inbound messages
//! and queues outbound ones through a shared [`MessageQueue`]; the server
//! moves them on and off the wire in the background:
//! ```ignore
//! let queue = Arc::new(MessageQueue::new());
//! let _server = MessageServer::bind("0.0.0.0:7050", queue.clone()).await?;
//! for msg in queue.drain_inbound() { /* ... */ }
//! ```

pub mod protocol;
pub mod queue;
pub mod server;

pub use protocol::*;
pub use queue::MessageQueue;
pub use server::MessageServer;

/// Default port the flight server listens on
pub const DEFAULT_PORT: u16 = 7050;

/// Errors raised by the transport layer
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
}
