// src/core/state/core.rs

//! Defines `BridgeState`, the state shared by the acceptor, the send-loop and
//! the reader of one debug session.

use super::connection::{ConnectionState, StateCell};
use crate::config::Config;
use crate::core::listener::SessionListener;
use crate::core::queue::CommandQueue;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared, session-wide state. Wrapped in an `Arc` and handed to every task.
pub struct BridgeState {
    pub config: Config,
    /// Outbound commands and the pending slot.
    pub queue: CommandQueue,
    pub listener: Arc<dyn SessionListener>,
    pub connection: StateCell,
    /// Every task subscribes to this channel and exits when it fires.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl BridgeState {
    pub fn new(config: Config, listener: Arc<dyn SessionListener>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            queue: CommandQueue::new(),
            listener,
            connection: StateCell::default(),
            shutdown_tx,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.get()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.connection_state() >= ConnectionState::Closing
    }
}
