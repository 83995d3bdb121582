// src/core/commands/mod.rs

//! Outbound debug commands: the `DebugCommand` contract and the two stock
//! implementations, fire-and-forget text and awaited multi-line replies.

pub mod command_trait;
pub mod default;
pub mod reply;

pub use command_trait::DebugCommand;
pub use default::DefaultCommand;
pub use reply::{ReplyCommand, ResponseFuture};
