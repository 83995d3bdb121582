// src/core/protocol/mod.rs

pub mod event;
pub mod line_codec;
pub use event::EventFrame;
pub use line_codec::{DEFAULT_MAX_LINE_LENGTH, LineCodec};
