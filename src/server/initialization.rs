// src/server/initialization.rs

//! Binds the listening socket and prepares the acceptor's context.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::BridgeError;
use crate::core::state::{BridgeState, ConnectionState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Binds the listener and moves the session from `Unbound` to `Listening`.
pub async fn setup(state: Arc<BridgeState>) -> Result<ServerContext, BridgeError> {
    log_startup_info(&state.config);

    let shutdown_rx = state.shutdown_tx.subscribe();
    let addr = state.config.bind_addr();
    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|e| BridgeError::Bind {
            addr: addr.clone(),
            source: Arc::new(e),
        })?;

    // A concurrent `start()` or `stop()` may have won the race.
    if !state
        .connection
        .transition(ConnectionState::Unbound, ConnectionState::Listening)
    {
        return Err(BridgeError::InvalidState(format!(
            "cannot listen while {}",
            state.connection_state()
        )));
    }

    let local_addr = listener.local_addr()?;
    info!("Debug bridge listening on {}", local_addr);

    Ok(ServerContext {
        state,
        listener,
        shutdown_rx,
    })
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!(
        "Polling the command queue every {} ms; start directive '{}'.",
        config.poll_interval_ms, config.start_directive
    );
    match config.response_timeout() {
        Some(timeout) => info!("Pending commands time out after {:?}.", timeout),
        None => warn!("WARNING: response timeout disabled. An unanswered command stalls the queue."),
    }
}
