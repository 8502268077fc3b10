//! Coordinated shutdown
//!
//! One signal drives the whole teardown. The registry notifies every
//! session first; only then does the cancellation token stop the read
//! loops and the accept loop.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use crate::registry::RegistryHandle;

/// Drives the end of the process after the interrupt signal
pub struct ShutdownCoordinator {
    registry: RegistryHandle,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl ShutdownCoordinator {
    pub fn new(registry: RegistryHandle, shutdown: CancellationToken, tasks: TaskTracker) -> Self {
        Self {
            registry,
            shutdown,
            tasks,
        }
    }

    /// Block until the interrupt signal, then run the shutdown sequence
    ///
    /// Signals after the first are ignored; the sequence runs once.
    pub async fn run(self, acceptor: JoinHandle<()>) -> std::io::Result<()> {
        wait_for_signal().await?;
        info!("Shutdown signal received");
        self.execute(acceptor).await;
        Ok(())
    }

    /// The shutdown sequence after the signal
    ///
    /// The registry queues the end-of-connection sentinel to every
    /// session before the token cancels their read loops. Waiting on
    /// the task tracker holds the process open until every writer task
    /// has drained its queue to the socket and closed it.
    pub async fn execute(self, acceptor: JoinHandle<()>) {
        self.registry.shutdown().await;
        self.shutdown.cancel();
        if let Err(e) = acceptor.await {
            error!("Acceptor task failed: {}", e);
        }
        // The acceptor has returned, so nothing joins the tracker anymore.
        self.tasks.close();
        self.tasks.wait().await;
        info!("All connection tasks finished");
    }
}

/// Wait for SIGINT or SIGTERM on Unix, Ctrl+C elsewhere
async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}
