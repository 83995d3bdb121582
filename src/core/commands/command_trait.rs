// src/core/commands/command_trait.rs

//! Defines the contract every outbound debug instruction implements.

use crate::core::BridgeError;
use crate::core::listener::SessionListener;

/// One outbound instruction for the debuggee, plus the logic to consume its
/// response.
///
/// The send-loop calls `encode` exactly once, at write time, so commands whose
/// text depends on session state (the selected stack frame, for instance) see
/// the current state rather than the state at enqueue time.
pub trait DebugCommand: Send {
    /// Serializes the command. The line terminator is appended by the codec,
    /// and a payload containing `\n` or `\r` is rejected with `InvalidPayload`.
    ///
    /// Called without the queue's lock held, so it may enqueue further commands.
    fn encode(&self, session: &dyn SessionListener) -> String;

    /// How many response units the debuggee will send. `0` means fire-and-forget.
    fn expected_response_lines(&self) -> usize;

    /// Consumes one trimmed response unit. Returns `true` once the response is
    /// complete and the pending slot may be released.
    ///
    /// Runs while the command queue's lock is held: it must not block and must
    /// not enqueue further commands.
    fn on_response_unit(&mut self, unit: &str) -> bool;

    /// Called once a command expecting no response has been handed to the
    /// send-loop for writing.
    fn on_dispatched(&mut self) {}

    /// Called when the command leaves the queue or pending slot without a
    /// complete response: timeout, disconnect, shutdown or a rejected payload.
    fn on_abandoned(&mut self, _reason: &BridgeError) {}
}
