//! TCP Chat Relay - Entry Point
//!
//! Starts the TCP listener, the Registry actor, and the acceptor, then
//! parks the main task on the shutdown coordinator.

use std::env;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{spawn_registry, Acceptor, ShutdownCoordinator};

/// Default bind address
const DEFAULT_ADDR: &str = "0.0.0.0:53000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Get bind address from command line or use default
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    // Failing to bind is the one fatal startup error
    let listener = TcpListener::bind(&addr).await?;
    info!("Chat relay listening on {}", addr);

    let registry = spawn_registry();
    let shutdown = CancellationToken::new();
    let tasks = TaskTracker::new();

    let acceptor = Acceptor::new(listener, registry.clone(), shutdown.clone(), tasks.clone());
    let acceptor_task = tokio::spawn(acceptor.run());

    ShutdownCoordinator::new(registry, shutdown, tasks)
        .run(acceptor_task)
        .await?;

    info!("Server closed");
    Ok(())
}
