//! Per-connection session state machine
//!
//! Owns the read half of one connection and drives it from name
//! negotiation through the relay loop to teardown. The write half lives
//! in a separate writer task; this side only queues frames to it.

use std::net::SocketAddr;

use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::protocol::{self, NAME_TAKEN_PROMPT, QUIT_SENTINEL, WELCOME_PROMPT};
use crate::registry::{DisconnectReason, NameClaim, RegistryHandle};
use crate::types::SessionId;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, name not yet negotiated
    AwaitingName,
    /// Name registered, relaying messages
    Active,
    /// Removed from the registry; terminal
    Closing,
}

/// Server-side state for one connected client
///
/// Created by the acceptor after the provisional registry record is in
/// place; runs as its own task and always detaches exactly once on the
/// way out.
pub struct Session {
    id: SessionId,
    addr: SocketAddr,
    reader: OwnedReadHalf,
    /// Prompts and greetings go through the same writer task the
    /// registry broadcasts to
    outbound: mpsc::Sender<String>,
    registry: RegistryHandle,
    shutdown: CancellationToken,
    state: SessionState,
    name: Option<String>,
}

impl Session {
    pub fn new(
        id: SessionId,
        addr: SocketAddr,
        reader: OwnedReadHalf,
        outbound: mpsc::Sender<String>,
        registry: RegistryHandle,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            addr,
            reader,
            outbound,
            registry,
            shutdown,
            state: SessionState::AwaitingName,
            name: None,
        }
    }

    /// Drive the session to completion
    pub async fn run(mut self) {
        debug!("Session {} started for {}", self.id, self.addr);

        let reason = match self.drive().await {
            Ok(()) => DisconnectReason::Quit,
            Err(e) => {
                debug!("Session {} read loop ended: {}", self.id, e);
                DisconnectReason::ConnectionLost
            }
        };

        self.state = SessionState::Closing;
        debug!("Session {} entered {:?}", self.id, self.state);
        self.registry.detach(self.id, reason).await;

        info!(
            "Session {} ({}) closed: {}",
            self.id,
            self.name.as_deref().unwrap_or("unnamed"),
            reason
        );
    }

    /// Name negotiation followed by the relay loop
    ///
    /// Returns Ok on a voluntary quit; every error is the failure path.
    async fn drive(&mut self) -> Result<(), SessionError> {
        self.send_to_self(WELCOME_PROMPT.to_string()).await?;

        let name = loop {
            let candidate = self.next_frame().await?;
            if candidate == QUIT_SENTINEL {
                return Ok(());
            }
            match self.registry.claim_name(self.id, &candidate).await? {
                NameClaim::Granted => break candidate,
                NameClaim::Taken => {
                    self.send_to_self(NAME_TAKEN_PROMPT.to_string()).await?;
                }
            }
        };

        self.state = SessionState::Active;
        self.name = Some(name.clone());
        debug!("Session {} entered {:?} as '{}'", self.id, self.state, name);

        self.send_to_self(protocol::greeting(&name)).await?;
        self.registry
            .broadcast(protocol::join_announcement(&name))
            .await?;

        loop {
            let body = self.next_frame().await?;
            if body == QUIT_SENTINEL {
                return Ok(());
            }
            self.registry
                .broadcast(protocol::relayed(&name, &body))
                .await?;
        }
    }

    /// Read the next frame, or stop on shutdown, EOF, or an IO error
    async fn next_frame(&mut self) -> Result<String, SessionError> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(SessionError::ShuttingDown),
            read = protocol::read_frame(&mut self.reader) => match read? {
                Some(frame) => Ok(frame),
                None => Err(SessionError::Disconnected),
            },
        }
    }

    /// Queue a frame for this session's own writer task
    async fn send_to_self(&self, frame: String) -> Result<(), SessionError> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| SessionError::OutboundClosed)
    }
}
