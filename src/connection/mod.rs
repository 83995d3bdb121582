// src/connection/mod.rs

//! Manages the lifecycle of the single debuggee TCP connection: framing the
//! inbound stream, routing responses, and draining the command queue.

mod guard;
mod handler;
mod reader;
mod router;

pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
pub use reader::{FramedReader, ReaderExit, UnitSink};
pub use router::{ResponseRouter, Routed};
