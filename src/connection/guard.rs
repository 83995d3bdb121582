// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection teardown.

use crate::core::BridgeError;
use crate::core::state::{BridgeState, ConnectionState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Ensures the session is closed and the listener told about it, however the
/// connection handler's scope is exited.
pub struct ConnectionGuard {
    pub(crate) state: Arc<BridgeState>,
    pub(crate) addr: SocketAddr,
    /// Set once `on_connected` has been delivered; `on_disconnected` pairs with it.
    connected: bool,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<BridgeState>, addr: SocketAddr) -> Self {
        Self {
            state,
            addr,
            connected: false,
        }
    }

    /// Notifies the listener of the connection.
    pub(crate) fn connect(&mut self) {
        self.state.listener.on_connected(self.addr);
        self.connected = true;
    }
}

impl Drop for ConnectionGuard {
    /// Closes the command queue, abandoning anything still queued or pending,
    /// and marks the connection closed.
    fn drop(&mut self) {
        debug!(
            "ConnectionGuard dropping, cleaning up session for debuggee {}",
            self.addr
        );
        self.state.queue.close(&BridgeError::ConnectionClosed);
        self.state.connection.advance(ConnectionState::Closed);
        if self.connected {
            self.state.listener.on_disconnected();
        }
    }
}
