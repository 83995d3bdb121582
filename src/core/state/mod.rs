// src/core/state/mod.rs

//! Defines the shared `BridgeState` and the connection lifecycle.

mod connection;
mod core;

pub use connection::{ConnectionState, StateCell};
pub use self::core::BridgeState;
