// src/core/mod.rs

//! The protocol-independent core of the bridge: errors, framing, commands,
//! the command queue and the shared session state.

pub mod commands;
pub mod errors;
pub mod listener;
pub mod protocol;
pub mod queue;
pub mod state;

pub use commands::{DebugCommand, DefaultCommand, ReplyCommand, ResponseFuture};
pub use errors::BridgeError;
pub use listener::SessionListener;
