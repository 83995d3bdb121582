// src/connection/reader.rs

//! Defines `FramedReader`, which turns the inbound byte stream into decoded
//! text units and hands each one to a `UnitSink`.

use crate::core::BridgeError;
use crate::core::protocol::LineCodec;
use futures::StreamExt;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::debug;

/// Consumes decoded units. The reader knows nothing about what they mean.
pub trait UnitSink: Send + Sync {
    fn on_unit(&self, unit: String);
}

/// Why the reader stopped delivering units.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderExit {
    /// The peer closed the stream.
    EndOfStream,
    /// The shutdown signal fired.
    Stopped,
    /// A read or framing error ended the stream.
    Failed(BridgeError),
}

/// Frames an `AsyncRead` with `LineCodec` and forwards units in receive order.
pub struct FramedReader<R> {
    framed: FramedRead<R, LineCodec>,
}

impl<R> FramedReader<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R, codec: LineCodec) -> Self {
        Self {
            framed: FramedRead::new(reader, codec),
        }
    }

    /// Runs the reader on its own task.
    pub fn spawn(
        self,
        sink: Arc<dyn UnitSink>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<ReaderExit> {
        tokio::spawn(async move { self.run(sink.as_ref(), shutdown_rx).await })
    }

    /// Delivers units until the stream ends, fails, or shutdown is signalled.
    /// No unit is delivered after the shutdown signal has been observed.
    pub async fn run(
        mut self,
        sink: &dyn UnitSink,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> ReaderExit {
        loop {
            tokio::select! {
                // Prioritize shutdown so a stopped session stops delivering.
                biased;
                _ = shutdown_rx.recv() => {
                    debug!("Framed reader received shutdown signal.");
                    return ReaderExit::Stopped;
                }
                next = self.framed.next() => match next {
                    Some(Ok(unit)) => sink.on_unit(unit),
                    Some(Err(e)) => return ReaderExit::Failed(e),
                    None => return ReaderExit::EndOfStream,
                }
            }
        }
    }
}
