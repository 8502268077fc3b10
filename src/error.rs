//! Error types for the chat relay
//!
//! Defines session-level errors, registry command errors, and message
//! send errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Reasons a session's read loop stops
///
/// Every variant maps to the failure path: the session transitions to
/// Closing without a departure announcement. A voluntary quit is not an
/// error and does not appear here.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Peer closed the connection (read returned zero bytes)
    #[error("Connection closed by peer")]
    Disconnected,

    /// IO error on the connection (fatal for this session)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The session's own outbound channel is gone (writer task ended)
    #[error("Outbound channel closed")]
    OutboundClosed,

    /// Server shutdown was requested while waiting for a frame
    #[error("Server shutting down")]
    ShuttingDown,

    /// The registry actor is unreachable or dropped the record
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Registry command errors
///
/// Occur when the registry actor cannot serve a command.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry actor's channel is closed (server tearing down)
    #[error("Registry closed")]
    Closed,

    /// No record exists for the session (cleared by shutdown)
    #[error("Session not attached")]
    NotAttached,
}

/// Message send errors
///
/// Occurs when attempting to send frames through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
