// src/core/listener.rs

//! The session-side collaborator that receives everything the debuggee says
//! outside of a command's response.

use crate::core::BridgeError;
use std::net::SocketAddr;
use tracing::warn;

/// Receives routed unsolicited events and connection lifecycle notifications.
///
/// Callbacks are invoked from the bridge's reader and send-loop tasks, never
/// while the command queue's lock is held.
pub trait SessionListener: Send + Sync {
    /// An unsolicited event such as `202 Paused main.lua 12`.
    fn handle_resp(&self, code: i32, params: &[String]);

    /// A protocol or steady-state transport fault. The bridge keeps running
    /// after protocol faults.
    fn handle_fault(&self, error: &BridgeError) {
        warn!("Debug session fault: {}", error);
    }

    fn on_connected(&self, _peer: SocketAddr) {}

    fn on_disconnected(&self) {}
}
