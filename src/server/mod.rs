// src/server/mod.rs

//! The session-facing API: `DebugServer` owns the listening socket, the
//! command queue and every task servicing the debuggee connection.

use crate::config::Config;
use crate::core::BridgeError;
use crate::core::commands::{DebugCommand, DefaultCommand, ReplyCommand, ResponseFuture};
use crate::core::listener::SessionListener;
use crate::core::state::{BridgeState, ConnectionState};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

mod connection_loop;
mod context;
mod initialization;

/// How long `stop()` waits for the tasks to wind down before aborting them.
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// A single-client debug-protocol server.
///
/// `start()` binds the listener and spawns the acceptor; the first debuggee
/// to connect is serviced until it disconnects or `stop()` is called. A
/// stopped server cannot be restarted.
pub struct DebugServer {
    state: Arc<BridgeState>,
    acceptor: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl DebugServer {
    pub fn new(config: Config, listener: Arc<dyn SessionListener>) -> Self {
        Self {
            state: Arc::new(BridgeState::new(config, listener)),
            acceptor: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    /// Binds the listening socket and spawns the acceptor. Returns the bound
    /// address, which differs from the configured one when `port = 0`.
    pub async fn start(&self) -> Result<SocketAddr, BridgeError> {
        let current = self.state.connection_state();
        if current != ConnectionState::Unbound {
            return Err(BridgeError::InvalidState(format!(
                "cannot start while {current}"
            )));
        }

        let ctx = initialization::setup(self.state.clone()).await?;
        let addr = ctx.listener.local_addr()?;
        *self.local_addr.lock() = Some(addr);
        *self.acceptor.lock() = Some(tokio::spawn(connection_loop::run(ctx)));
        Ok(addr)
    }

    /// Stops every task and closes the socket. Queued and pending commands
    /// are abandoned with `ConnectionClosed`. Safe to call more than once,
    /// concurrently with I/O, or before `start()`.
    pub async fn stop(&self) {
        let previous = self.state.connection.advance(ConnectionState::Closing);
        if previous < ConnectionState::Closing {
            info!("Stopping debug bridge (was {}).", previous);
        }
        // No receivers means nothing is running; that is fine.
        let _ = self.state.shutdown_tx.send(());
        self.state.queue.close(&BridgeError::ConnectionClosed);

        let acceptor = self.acceptor.lock().take();
        if let Some(mut handle) = acceptor {
            if tokio::time::timeout(STOP_GRACE_PERIOD, &mut handle)
                .await
                .is_err()
            {
                warn!("Timed out waiting for the debug connection to close; aborting.");
                handle.abort();
                let _ = handle.await;
            }
        }
        self.state.connection.advance(ConnectionState::Closed);
        debug!("Debug bridge stopped.");
    }

    /// Enqueues a command. Returns `false` if the session is already closed,
    /// in which case the command is dropped.
    pub fn add_command<C>(&self, command: C) -> bool
    where
        C: DebugCommand + 'static,
    {
        self.state.queue.enqueue(Box::new(command))
    }

    /// Enqueues a fire-and-forget text directive.
    pub fn add_text_command(&self, text: impl Into<String>) -> bool {
        self.add_command(DefaultCommand::new(text))
    }

    /// Enqueues `text` as a command expecting `lines` response lines and
    /// returns a future resolving to them. With `lines == 0` the command is
    /// fire-and-forget and the future resolves to no lines once it is sent.
    pub fn request(&self, text: impl Into<String>, lines: usize) -> ResponseFuture {
        let (command, response) = ReplyCommand::new(text, lines);
        // A rejected command is dropped, which resolves the future.
        self.add_command(command);
        response
    }

    pub fn state(&self) -> ConnectionState {
        self.state.connection_state()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Number of commands waiting to be written.
    pub fn queued_commands(&self) -> usize {
        self.state.queue.len()
    }
}

impl Drop for DebugServer {
    fn drop(&mut self) {
        if self.state.connection.advance(ConnectionState::Closing) < ConnectionState::Closing {
            debug!("DebugServer dropped without stop(); signalling shutdown.");
        }
        let _ = self.state.shutdown_tx.send(());
        self.state.queue.close(&BridgeError::ConnectionClosed);
        if let Some(handle) = self.acceptor.lock().take() {
            handle.abort();
        }
    }
}
