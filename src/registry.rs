//! Registry actor implementation
//!
//! The central actor owning all shared state: the peer map and the name
//! index. Every registration, removal, and broadcast goes through one
//! command channel, so no mutation can interleave with a broadcast
//! iteration.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::peer::Peer;
use crate::protocol::{self, END_CONN_SENTINEL};
use crate::types::SessionId;

/// Command channel depth for the registry actor
const COMMAND_BUFFER: usize = 256;

/// Outcome of a name claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClaim {
    /// The name was free and is now bound to the session
    Granted,
    /// The name is held by another session
    Taken,
}

/// Why a session detached from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client sent the quit sentinel
    Quit,
    /// EOF, IO failure, or forced shutdown
    ConnectionLost,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::Quit => write!(f, "quit"),
            DisconnectReason::ConnectionLost => write!(f, "connection lost"),
        }
    }
}

/// Commands sent from the acceptor and sessions to the registry actor
#[derive(Debug)]
pub enum RegistryCommand {
    /// New connection accepted; insert a provisional record
    Attach {
        id: SessionId,
        addr: SocketAddr,
        outbound: mpsc::Sender<String>,
    },
    /// Bind a name to an attached session if no one else holds it
    ClaimName {
        id: SessionId,
        name: String,
        respond_to: oneshot::Sender<Result<NameClaim, RegistryError>>,
    },
    /// Deliver a frame to every attached session
    Broadcast {
        frame: String,
    },
    /// Remove a session's record; a named quit announces the departure
    Detach {
        id: SessionId,
        reason: DisconnectReason,
        respond_to: oneshot::Sender<()>,
    },
    /// Deliver the end-of-connection sentinel everywhere and clear the map
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// The registry actor
///
/// Owns the peer map and the name index and processes commands until
/// all handles are dropped. Uses HashMap/HashSet for O(1) lookups on
/// session ids and names.
pub struct Registry {
    /// All attached sessions: SessionId -> Peer
    peers: HashMap<SessionId, Peer>,
    /// Registered names; each appears for exactly one live session
    names: HashSet<String>,
    /// Command receiver channel
    receiver: mpsc::Receiver<RegistryCommand>,
}

impl Registry {
    /// Create a new Registry with the given command receiver
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>) -> Self {
        Self {
            peers: HashMap::new(),
            names: HashSet::new(),
            receiver,
        }
    }

    /// Run the registry event loop
    ///
    /// Continuously receives and processes commands until all senders
    /// are dropped.
    pub async fn run(mut self) {
        info!("Registry started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Registry stopped");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Attach { id, addr, outbound } => {
                self.handle_attach(id, addr, outbound);
            }
            RegistryCommand::ClaimName { id, name, respond_to } => {
                let outcome = self.handle_claim_name(id, name);
                let _ = respond_to.send(outcome);
            }
            RegistryCommand::Broadcast { frame } => {
                self.broadcast(&frame).await;
            }
            RegistryCommand::Detach { id, reason, respond_to } => {
                self.handle_detach(id, reason).await;
                let _ = respond_to.send(());
            }
            RegistryCommand::Shutdown { respond_to } => {
                self.handle_shutdown().await;
                let _ = respond_to.send(());
            }
        }
    }

    /// Insert the provisional record for a newly accepted connection
    fn handle_attach(&mut self, id: SessionId, addr: SocketAddr, outbound: mpsc::Sender<String>) {
        info!("Session {} attached from {}", id, addr);
        self.peers.insert(id, Peer::new(addr, outbound));
        debug!("Attached sessions: {}", self.peers.len());
    }

    /// Bind a name to a session unless another session holds it
    fn handle_claim_name(
        &mut self,
        id: SessionId,
        name: String,
    ) -> Result<NameClaim, RegistryError> {
        let Some(peer) = self.peers.get_mut(&id) else {
            return Err(RegistryError::NotAttached);
        };

        if self.names.contains(&name) {
            debug!("Session {} asked for taken name '{}'", id, name);
            return Ok(NameClaim::Taken);
        }

        // A repeat claim rebinds the session; its previous name is freed.
        if let Some(old) = peer.name.take() {
            self.names.remove(&old);
        }

        self.names.insert(name.clone());
        peer.set_name(name.clone());
        info!("Session {} registered as '{}'", id, name);
        Ok(NameClaim::Granted)
    }

    /// Remove a session's record and free its name
    ///
    /// A quit by a named session is announced to the remaining sessions;
    /// the failure path stays silent. Detaching an unknown id is a
    /// no-op, so removal happens at most once per session.
    async fn handle_detach(&mut self, id: SessionId, reason: DisconnectReason) {
        let Some(peer) = self.peers.remove(&id) else {
            return;
        };

        info!(
            "Session {} ('{}', {}) detached: {}",
            id,
            peer.display_name(),
            peer.addr,
            reason
        );

        if let Some(name) = peer.name {
            self.names.remove(&name);
            if reason == DisconnectReason::Quit {
                self.broadcast(&protocol::departure_announcement(&name)).await;
            }
        }

        debug!("Attached sessions: {}", self.peers.len());
    }

    /// Queue the shutdown sentinel to every session, then clear the map
    async fn handle_shutdown(&mut self) {
        info!("Notifying {} session(s) of shutdown", self.peers.len());
        self.broadcast(END_CONN_SENTINEL).await;
        self.peers.clear();
        self.names.clear();
    }

    /// Deliver a frame to every attached session, best-effort
    ///
    /// A closed outbound channel means that session is mid-teardown; it
    /// is skipped and the rest still receive the frame. Sends into a
    /// full channel are awaited, so one session's stalled writer parks
    /// the actor until its queue drains; no frame is dropped for a
    /// live connection.
    async fn broadcast(&self, frame: &str) {
        debug!("Broadcasting to {} session(s): {}", self.peers.len(), frame);
        for (id, peer) in &self.peers {
            if peer.send(frame.to_string()).await.is_err() {
                debug!("Dropping frame for session {}: writer gone", id);
            }
        }
    }
}

/// Cheap-to-clone handle for talking to the registry actor
#[derive(Clone, Debug)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Insert a provisional record for a newly accepted connection
    ///
    /// Fire-and-forget: command order on the channel guarantees the
    /// record exists before any later command from the same session.
    pub async fn attach(&self, id: SessionId, addr: SocketAddr, outbound: mpsc::Sender<String>) {
        let _ = self
            .sender
            .send(RegistryCommand::Attach { id, addr, outbound })
            .await;
    }

    /// Try to bind a name to the session
    pub async fn claim_name(&self, id: SessionId, name: &str) -> Result<NameClaim, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::ClaimName {
                id,
                name: name.to_string(),
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::Closed)?;
        rx.await.map_err(|_| RegistryError::Closed)?
    }

    /// Deliver a frame to every attached session
    pub async fn broadcast(&self, frame: String) -> Result<(), RegistryError> {
        self.sender
            .send(RegistryCommand::Broadcast { frame })
            .await
            .map_err(|_| RegistryError::Closed)
    }

    /// Remove the session's record, waiting for the removal to complete
    pub async fn detach(&self, id: SessionId, reason: DisconnectReason) {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(RegistryCommand::Detach {
                id,
                reason,
                respond_to: tx,
            })
            .await
            .is_err()
        {
            return;
        }
        let _ = rx.await;
    }

    /// Broadcast the end-of-connection sentinel and clear the registry
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(RegistryCommand::Shutdown { respond_to: tx })
            .await
            .is_err()
        {
            return;
        }
        let _ = rx.await;
    }
}

/// Start the registry actor and return a handle to it
pub fn spawn_registry() -> RegistryHandle {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let registry = Registry::new(rx);
    tokio::spawn(registry.run());
    RegistryHandle::new(tx)
}
