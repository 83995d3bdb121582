// src/core/state/connection.rs

//! The lifecycle of the single debuggee connection.

use std::sync::atomic::{AtomicU8, Ordering};
use strum_macros::{Display, FromRepr};

/// Where the bridge is in its one-connection lifecycle. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, FromRepr)]
#[repr(u8)]
pub enum ConnectionState {
    Unbound,
    Listening,
    Accepted,
    Streaming,
    Closing,
    Closed,
}

/// An atomic cell holding a `ConnectionState`.
#[derive(Debug)]
pub struct StateCell {
    inner: AtomicU8,
}

impl StateCell {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_repr(self.inner.load(Ordering::Acquire))
            .unwrap_or(ConnectionState::Closed)
    }

    /// Moves to `next` only if the current state is `expected`.
    pub fn transition(&self, expected: ConnectionState, next: ConnectionState) -> bool {
        self.inner
            .compare_exchange(
                expected as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves to `next` unless the cell is already at or past it.
    /// Returns the state observed before the call.
    pub fn advance(&self, next: ConnectionState) -> ConnectionState {
        let previous = self.inner.fetch_max(next as u8, Ordering::AcqRel);
        ConnectionState::from_repr(previous).unwrap_or(ConnectionState::Closed)
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(ConnectionState::Unbound)
    }
}
