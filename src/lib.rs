//! TCP Chat Relay Library
//!
//! A many-client text chat relay built on tokio, using the Actor
//! pattern for the shared session registry.
//!
//! # Features
//! - Plain-text TCP protocol (one message per read, 1024-byte frames)
//! - Display name negotiation with uniqueness enforcement
//! - Broadcast relay with sender attribution
//! - Voluntary quit (`{quit}`) and unclean-disconnect handling
//! - Coordinated shutdown announcing `{end_conn}` to every client
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Registry` is the central actor owning the peer map and name index
//! - Each connection has a `Session` task (read side) and a writer task
//!   (write side) communicating through channels
//! - No locks needed - registry mutation and broadcast iteration are
//!   serialized on one command channel
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//! use tokio_util::task::TaskTracker;
//! use chat_relay::{spawn_registry, Acceptor, ShutdownCoordinator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("0.0.0.0:53000").await.unwrap();
//!     let registry = spawn_registry();
//!     let shutdown = CancellationToken::new();
//!     let tasks = TaskTracker::new();
//!
//!     let acceptor = Acceptor::new(listener, registry.clone(), shutdown.clone(), tasks.clone());
//!     let acceptor_task = tokio::spawn(acceptor.run());
//!
//!     ShutdownCoordinator::new(registry, shutdown, tasks)
//!         .run(acceptor_task)
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod acceptor;
pub mod error;
pub mod peer;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod shutdown;
pub mod types;

// Re-export main types for convenience
pub use acceptor::Acceptor;
pub use error::{RegistryError, SendError, SessionError};
pub use peer::Peer;
pub use registry::{
    spawn_registry, DisconnectReason, NameClaim, Registry, RegistryCommand, RegistryHandle,
};
pub use session::{Session, SessionState};
pub use shutdown::ShutdownCoordinator;
pub use types::SessionId;
