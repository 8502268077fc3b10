//! Peer record definition
//!
//! Represents one attached session as the registry sees it: remote
//! address, registered name, and the outbound frame channel.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::error::SendError;

/// Registry-side record of an attached session
///
/// Holds the remote address, the registered name (None while the
/// session is still at the name prompt), and the sender half of the
/// channel its writer task drains to the socket.
#[derive(Debug)]
pub struct Peer {
    /// Remote address of the connection
    pub addr: SocketAddr,
    /// Registered name (None while provisional)
    pub name: Option<String>,
    /// Registry -> writer task frame channel
    pub outbound: mpsc::Sender<String>,
}

impl Peer {
    /// Create a provisional record with no name yet
    pub fn new(addr: SocketAddr, outbound: mpsc::Sender<String>) -> Self {
        Self {
            addr,
            name: None,
            outbound,
        }
    }

    /// Queue a frame for this peer's writer task
    ///
    /// Returns an error if the channel is closed (the writer task ended).
    pub async fn send(&self, frame: String) -> Result<(), SendError> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Name for log lines: the registered name or a placeholder
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Bind the registered name to this record
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_addr() -> SocketAddr {
        "127.0.0.1:53000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_peer_starts_provisional() {
        let (tx, _rx) = mpsc::channel(32);
        let peer = Peer::new(local_addr(), tx);

        assert!(peer.name.is_none());
        assert_eq!(peer.display_name(), "unnamed");
    }

    #[tokio::test]
    async fn test_peer_send_reaches_writer_channel() {
        let (tx, mut rx) = mpsc::channel(32);
        let peer = Peer::new(local_addr(), tx);

        peer.send("ciao".to_string()).await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("ciao"));
    }

    #[tokio::test]
    async fn test_peer_send_after_writer_gone() {
        let (tx, rx) = mpsc::channel(32);
        let peer = Peer::new(local_addr(), tx);
        drop(rx);

        assert!(peer.send("ciao".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_peer_set_name() {
        let (tx, _rx) = mpsc::channel(32);
        let mut peer = Peer::new(local_addr(), tx);

        peer.set_name("Ana".to_string());
        assert_eq!(peer.display_name(), "Ana");
    }
}
