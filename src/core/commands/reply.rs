// src/core/commands/reply.rs

//! A command whose response is delivered to the caller through a future.

use super::command_trait::DebugCommand;
use crate::core::BridgeError;
use crate::core::listener::SessionListener;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

type ReplyResult = Result<Vec<String>, BridgeError>;

/// Expects a fixed number of response lines and hands them to the awaiting
/// caller once all of them have arrived. With zero lines the command is
/// fire-and-forget and resolves to an empty response once dispatched.
#[derive(Debug)]
pub struct ReplyCommand {
    text: String,
    expected_lines: usize,
    lines: Vec<String>,
    reply_tx: Option<oneshot::Sender<ReplyResult>>,
}

impl ReplyCommand {
    /// Builds the command and the future resolving to its response lines.
    pub fn new(text: impl Into<String>, expected_lines: usize) -> (Self, ResponseFuture) {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = Self {
            text: text.into(),
            expected_lines,
            lines: Vec::with_capacity(expected_lines),
            reply_tx: Some(reply_tx),
        };
        (command, ResponseFuture { rx: reply_rx })
    }

    fn resolve(&mut self, result: ReplyResult) {
        if let Some(tx) = self.reply_tx.take() {
            // The caller may have dropped the future; nothing to do then.
            let _ = tx.send(result);
        }
    }
}

impl DebugCommand for ReplyCommand {
    fn encode(&self, _session: &dyn SessionListener) -> String {
        self.text.clone()
    }

    fn expected_response_lines(&self) -> usize {
        self.expected_lines
    }

    fn on_response_unit(&mut self, unit: &str) -> bool {
        self.lines.push(unit.to_string());
        if self.lines.len() < self.expected_lines {
            return false;
        }
        let lines = std::mem::take(&mut self.lines);
        self.resolve(Ok(lines));
        true
    }

    fn on_dispatched(&mut self) {
        if self.expected_lines == 0 {
            self.resolve(Ok(Vec::new()));
        }
    }

    fn on_abandoned(&mut self, reason: &BridgeError) {
        self.resolve(Err(reason.clone()));
    }
}

/// Resolves to the response lines of a `ReplyCommand`, or to the reason the
/// command was abandoned. A command dropped without an answer resolves to
/// `ConnectionClosed`.
#[derive(Debug)]
pub struct ResponseFuture {
    rx: oneshot::Receiver<ReplyResult>,
}

impl Future for ResponseFuture {
    type Output = ReplyResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(BridgeError::ConnectionClosed)))
    }
}
