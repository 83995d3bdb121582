// src/core/protocol/line_codec.rs

//! Implements the newline-delimited text framing used on the debug socket and
//! the corresponding `Encoder` and `Decoder` for network communication.

use crate::core::BridgeError;
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// The line terminator for both directions of the protocol.
const LF: u8 = b'\n';
const CR: u8 = b'\r';

/// Upper bound for a single inbound line unless configured otherwise.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// A `tokio_util::codec` implementation that splits the inbound byte stream into
/// text lines and terminates outbound payloads with `\n`.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    /// Index already scanned for a terminator, so a partial line is never rescanned.
    next_index: usize,
}

impl LineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

/// Decodes a raw line lossily, dropping a trailing carriage return.
fn decode_text(mut line: &[u8]) -> String {
    if let Some((&CR, rest)) = line.split_last() {
        line = rest;
    }
    String::from_utf8_lossy(line).into_owned()
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = BridgeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A line of exactly `max_length` bytes still has room for its terminator.
        let read_to = src.len().min(self.max_length.saturating_add(1));
        let start = self.next_index.min(read_to);

        match src[start..read_to].iter().position(|b| *b == LF) {
            Some(offset) => {
                let newline_index = start + offset;
                self.next_index = 0;
                let line = src.split_to(newline_index + 1);
                Ok(Some(decode_text(&line[..newline_index])))
            }
            None if src.len() > self.max_length => {
                self.next_index = 0;
                Err(BridgeError::LineTooLong {
                    max: self.max_length,
                })
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    /// Delivers a final unterminated chunk when the peer closes the stream.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        self.next_index = 0;
        let rest = src.split_to(src.len());
        Ok(Some(decode_text(&rest)))
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = BridgeError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let text = item.as_ref();
        dst.reserve(text.len() + 1);
        dst.put_slice(text.as_bytes());
        dst.put_u8(LF);
        Ok(())
    }
}
