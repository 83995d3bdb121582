// src/server/context.rs

use crate::core::state::BridgeState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Holds all the initialized state required to run the acceptor.
pub struct ServerContext {
    pub state: Arc<BridgeState>,
    pub listener: TcpListener,
    /// Subscribed before the acceptor is spawned so no stop signal is missed.
    pub shutdown_rx: broadcast::Receiver<()>,
}
