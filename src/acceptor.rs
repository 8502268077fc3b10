//! Connection acceptor
//!
//! Owns the listening socket. Each accepted connection gets a session
//! id, a writer task, a provisional registry record, and a session
//! task, in that order, before the loop resumes accepting.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::registry::RegistryHandle;
use crate::session::Session;
use crate::types::SessionId;

/// Depth of each session's outbound frame channel
const OUTBOUND_BUFFER: usize = 32;

/// Accept loop: turns incoming connections into session tasks
pub struct Acceptor {
    listener: TcpListener,
    registry: RegistryHandle,
    shutdown: CancellationToken,
    /// Carries every session and writer task, so shutdown can wait for
    /// their outbound queues to drain before the process exits
    tasks: TaskTracker,
}

impl Acceptor {
    pub fn new(
        listener: TcpListener,
        registry: RegistryHandle,
        shutdown: CancellationToken,
        tasks: TaskTracker,
    ) -> Self {
        Self {
            listener,
            registry,
            shutdown,
            tasks,
        }
    }

    /// Accept connections until the shutdown token fires
    ///
    /// Returning is the designed exit; cancellation is not an error.
    /// A failed accept is logged and the loop continues. The listening
    /// socket closes when the acceptor is dropped.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        info!("New connection from {}", addr);
                        self.start_session(stream, addr).await;
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
            }
        }
        info!("Acceptor stopped");
    }

    /// Set up the writer task and registry record, then spawn the session
    async fn start_session(&self, stream: TcpStream, addr: SocketAddr) {
        let id = SessionId::new();
        let (reader, writer) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

        spawn_writer(&self.tasks, id, writer, outbound_rx);

        // The record must be queued before the session's first registry
        // command; command order on the channel is send order.
        self.registry.attach(id, addr, outbound_tx.clone()).await;

        let session = Session::new(
            id,
            addr,
            reader,
            outbound_tx,
            self.registry.clone(),
            self.shutdown.clone(),
        );
        self.tasks.spawn(session.run());
    }
}

/// Writer task: drain queued frames into the write half
///
/// Ends when every sender is gone or a write fails, then shuts the
/// write half down, so the peer sees EOF only after the queue drained.
/// Runs on the task tracker; shutdown waits for the drain.
fn spawn_writer(
    tasks: &TaskTracker,
    id: SessionId,
    mut writer: OwnedWriteHalf,
    mut frames: mpsc::Receiver<String>,
) {
    tasks.spawn(async move {
        while let Some(frame) = frames.recv().await {
            if let Err(e) = writer.write_all(frame.as_bytes()).await {
                warn!("Write failed for session {}: {}", id, e);
                break;
            }
        }
        let _ = writer.shutdown().await;
        debug!("Writer task ended for session {}", id);
    });
}
