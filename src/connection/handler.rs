// src/connection/handler.rs

//! Defines the `ConnectionHandler`, which owns the accepted debuggee socket:
//! it runs the send-loop on its own task and the framed reader on another.

use super::guard::ConnectionGuard;
use super::reader::{FramedReader, ReaderExit};
use super::router::ResponseRouter;
use crate::core::BridgeError;
use crate::core::errors::is_normal_disconnect;
use crate::core::protocol::LineCodec;
use crate::core::state::{BridgeState, ConnectionState};
use futures::SinkExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::broadcast;
use tokio_util::codec::FramedWrite;
use tracing::{debug, error, info, warn};

type LineWriter = FramedWrite<OwnedWriteHalf, LineCodec>;

/// Why the connection's main select loop ended.
enum LoopExit {
    Stopped,
    Reader(ReaderExit),
    Writer(BridgeError),
}

/// Manages the full lifecycle of the accepted debuggee connection.
pub struct ConnectionHandler {
    socket: TcpStream,
    addr: SocketAddr,
    state: Arc<BridgeState>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    /// `shutdown_rx` must have been subscribed before the connection was
    /// accepted so that a concurrent `stop()` is never missed.
    pub fn new(
        socket: TcpStream,
        addr: SocketAddr,
        state: Arc<BridgeState>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            socket,
            addr,
            state,
            shutdown_rx,
        }
    }

    /// Runs until the debuggee disconnects, a transport fault occurs, or the
    /// bridge is stopped. Faults observed during shutdown are swallowed.
    pub async fn run(self) -> Result<(), BridgeError> {
        let Self {
            socket,
            addr,
            state,
            mut shutdown_rx,
        } = self;

        let mut guard = ConnectionGuard::new(state.clone(), addr);
        if !state
            .connection
            .transition(ConnectionState::Accepted, ConnectionState::Streaming)
        {
            debug!("Connection from {} closed before streaming began.", addr);
            return Ok(());
        }
        guard.connect();

        let max_line_length = state.config.max_line_length;
        let (read_half, write_half) = socket.into_split();
        let router = Arc::new(ResponseRouter::new(state.clone()));
        let mut reader_task = FramedReader::new(read_half, LineCodec::new(max_line_length))
            .spawn(router, state.shutdown_tx.subscribe());
        let mut writer = FramedWrite::new(write_half, LineCodec::new(max_line_length));

        let exit = tokio::select! {
            // Prioritize shutdown signals over other events.
            biased;
            _ = shutdown_rx.recv() => LoopExit::Stopped,
            res = &mut reader_task => LoopExit::Reader(
                res.unwrap_or_else(|e| ReaderExit::Failed(BridgeError::Internal(e.to_string())))
            ),
            Err(e) = send_loop(&state, &mut writer) => LoopExit::Writer(e),
        };

        // `stop()` marks the session as closing before signalling.
        let stop_requested = state.is_shutting_down();
        state.connection.advance(ConnectionState::Closing);
        if !matches!(exit, LoopExit::Reader(_)) {
            reader_task.abort();
            let _ = reader_task.await;
        }
        drop(writer);

        match exit {
            LoopExit::Stopped => info!("Debug connection to {} stopped.", addr),
            LoopExit::Reader(ReaderExit::EndOfStream) => info!("Debuggee {} disconnected.", addr),
            LoopExit::Reader(ReaderExit::Stopped) => debug!("Reader for {} stopped.", addr),
            LoopExit::Reader(ReaderExit::Failed(e)) | LoopExit::Writer(e) => {
                report_fault(&state, addr, e, stop_requested)
            }
        }
        Ok(())
    }
}

fn report_fault(state: &BridgeState, addr: SocketAddr, e: BridgeError, stop_requested: bool) {
    if stop_requested || is_normal_disconnect(&e) {
        debug!("Connection to {} closed: {}", addr, e);
        return;
    }
    if e.is_protocol_fault() {
        warn!("Protocol fault on connection to {}: {}", addr, e);
    } else {
        error!("Transport fault on connection to {}: {}", addr, e);
    }
    state.listener.handle_fault(&e);
}

/// Drains the command queue onto the socket. Returns only on a write error.
///
/// Commands queued before the debuggee connected are flushed first, then the
/// start directive is written exactly once, then the loop runs steady-state.
async fn send_loop(state: &BridgeState, writer: &mut LineWriter) -> Result<(), BridgeError> {
    while !state.queue.is_idle() {
        send_next(state, writer).await?;
    }

    let directive = state.config.start_directive.trim().to_string();
    writer.send(directive.as_str()).await?;
    info!("Start directive '{}' sent.", directive);

    loop {
        send_next(state, writer).await?;
    }
}

/// Writes the next eligible command, or waits until one may be eligible.
async fn send_next(state: &BridgeState, writer: &mut LineWriter) -> Result<(), BridgeError> {
    if let Some(timeout) = state.config.response_timeout()
        && let Some(fault) = state.queue.expire_pending(timeout)
    {
        warn!("{}", fault);
        state.listener.handle_fault(&fault);
    }

    match state.queue.try_dispatch_if_idle(state.listener.as_ref()) {
        Ok(Some(dispatch)) => {
            debug!(
                "Sending command '{}' (awaiting response: {})",
                dispatch.payload, dispatch.expects_response
            );
            // `send` flushes the line before returning.
            writer.send(dispatch.payload).await?;
        }
        Ok(None) => state.queue.wait_ready(state.config.poll_interval()).await,
        // The command was abandoned; the session carries on with the next one.
        Err(fault) => {
            warn!("{}", fault);
            state.listener.handle_fault(&fault);
        }
    }
    Ok(())
}
