// src/server/connection_loop.rs

//! Accepts exactly one debuggee connection and hands it to the connection
//! handler. The listening socket is consumed by the first accept.

use super::context::ServerContext;
use crate::connection::ConnectionHandler;
use crate::core::BridgeError;
use crate::core::state::ConnectionState;
use tracing::{debug, error, info, warn};

/// Runs the acceptor. Returns when the connection ends or the bridge stops.
pub async fn run(ctx: ServerContext) {
    let ServerContext {
        state,
        listener,
        mut shutdown_rx,
    } = ctx;

    let accepted = tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
            info!("Bridge stopped before a debuggee connected.");
            return;
        }
        res = listener.accept() => res,
    };
    // No second connection is ever serviced.
    drop(listener);

    match accepted {
        Ok((socket, addr)) => {
            if !state
                .connection
                .transition(ConnectionState::Listening, ConnectionState::Accepted)
            {
                debug!("Dropping connection from {}: bridge is shutting down.", addr);
                return;
            }
            info!("Accepted debuggee connection from: {}", addr);
            if let Err(e) = socket.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }

            let handler = ConnectionHandler::new(socket, addr, state.clone(), shutdown_rx);
            if let Err(e) = handler.run().await {
                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
            }
        }
        Err(e) => {
            let fault = BridgeError::from(e);
            if !state.is_shutting_down() {
                error!("Failed to accept debuggee connection: {}", fault);
                state.listener.handle_fault(&fault);
            }
            state.queue.close(&BridgeError::ConnectionClosed);
            state.connection.advance(ConnectionState::Closed);
        }
    }
}
