// src/core/errors.rs

//! Defines the primary error type for the bridge.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The main error enum, representing every failure the bridge can report.
///
/// Faults fall into two families: transport faults (socket bind, accept, read
/// and write failures) and protocol faults (the debuggee sent something the
/// bridge cannot interpret, or never answered a command).
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: Arc<std::io::Error>,
    },

    #[error("Connection closed")]
    ConnectionClosed,

    /// An unsolicited unit without a valid decimal status code prefix.
    #[error("Malformed event '{0}': missing numeric status code")]
    MalformedEvent(String),

    /// An outbound command encoded to more than one line.
    #[error("Command payload {0:?} spans more than one line")]
    InvalidPayload(String),

    #[error("Line exceeds maximum length of {max} bytes")]
    LineTooLong { max: usize },

    /// The pending command did not receive its declared response lines in time.
    #[error("Command '{command}' received no complete response within {elapsed:?}")]
    ResponseTimeout { command: String, elapsed: Duration },

    #[error("Operation not allowed in the current state: {0}")]
    InvalidState(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Returns true for faults caused by the bytes the debuggee put on the wire
    /// (or failed to put there).
    pub fn is_protocol_fault(&self) -> bool {
        matches!(
            self,
            BridgeError::MalformedEvent(_)
                | BridgeError::LineTooLong { .. }
                | BridgeError::InvalidPayload(_)
                | BridgeError::ResponseTimeout { .. }
        )
    }

    /// Returns true for socket-level failures.
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            BridgeError::Io(_) | BridgeError::Bind { .. } | BridgeError::ConnectionClosed
        )
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
impl Clone for BridgeError {
    fn clone(&self) -> Self {
        match self {
            BridgeError::Io(e) => BridgeError::Io(Arc::clone(e)),
            BridgeError::Bind { addr, source } => BridgeError::Bind {
                addr: addr.clone(),
                source: Arc::clone(source),
            },
            BridgeError::ConnectionClosed => BridgeError::ConnectionClosed,
            BridgeError::MalformedEvent(s) => BridgeError::MalformedEvent(s.clone()),
            BridgeError::InvalidPayload(s) => BridgeError::InvalidPayload(s.clone()),
            BridgeError::LineTooLong { max } => BridgeError::LineTooLong { max: *max },
            BridgeError::ResponseTimeout { command, elapsed } => BridgeError::ResponseTimeout {
                command: command.clone(),
                elapsed: *elapsed,
            },
            BridgeError::InvalidState(s) => BridgeError::InvalidState(s.clone()),
            BridgeError::Internal(s) => BridgeError::Internal(s.clone()),
        }
    }
}

impl PartialEq for BridgeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BridgeError::Io(e1), BridgeError::Io(e2)) => e1.kind() == e2.kind(),
            (
                BridgeError::Bind { addr: a1, .. },
                BridgeError::Bind { addr: a2, .. },
            ) => a1 == a2,
            (BridgeError::MalformedEvent(s1), BridgeError::MalformedEvent(s2)) => s1 == s2,
            (BridgeError::InvalidPayload(s1), BridgeError::InvalidPayload(s2)) => s1 == s2,
            (BridgeError::LineTooLong { max: m1 }, BridgeError::LineTooLong { max: m2 }) => {
                m1 == m2
            }
            (
                BridgeError::ResponseTimeout { command: c1, .. },
                BridgeError::ResponseTimeout { command: c2, .. },
            ) => c1 == c2,
            (BridgeError::InvalidState(s1), BridgeError::InvalidState(s2)) => s1 == s2,
            (BridgeError::Internal(s1), BridgeError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Io(Arc::new(e))
    }
}

/// Checks for I/O errors that simply mean the peer went away.
pub(crate) fn is_normal_disconnect(e: &BridgeError) -> bool {
    match e {
        BridgeError::ConnectionClosed => true,
        BridgeError::Io(arc_err) => matches!(
            arc_err.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionAborted
        ),
        _ => false,
    }
}
