// src/core/queue.rs

//! The outbound command queue and the pending slot, guarded by one lock.

use crate::core::BridgeError;
use crate::core::commands::DebugCommand;
use crate::core::listener::SessionListener;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::debug;

/// The command currently awaiting its response lines.
struct PendingCommand {
    command: Box<dyn DebugCommand>,
    /// The payload as written, kept for logging and timeout reports.
    payload: String,
    remaining: usize,
    written_at: Instant,
}

#[derive(Default)]
struct QueueState {
    commands: VecDeque<Box<dyn DebugCommand>>,
    pending: Option<PendingCommand>,
    /// Set while the head command is being encoded outside the lock.
    dispatching: bool,
    closed: bool,
}

/// A command taken from the head of the queue, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub payload: String,
    pub expects_response: bool,
}

/// How a response unit was routed by `deliver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Consumed by the pending command, which still awaits `remaining` units.
    Partial { remaining: usize },
    /// Consumed by the pending command, which is now satisfied.
    Completed,
    /// No command was pending; the unit is an unsolicited event.
    Unsolicited,
}

/// A thread-safe FIFO of outbound commands with single-in-flight discipline.
///
/// Producers call `enqueue` from any thread. The send-loop is the only
/// consumer and takes commands through `try_dispatch_if_idle`, which refuses
/// while a command occupies the pending slot.
#[derive(Default)]
pub struct CommandQueue {
    state: Mutex<QueueState>,
    /// Signalled whenever a command becomes eligible for dispatch.
    ready: Notify,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command to the tail. After `close` the command is dropped
    /// silently and `false` is returned.
    pub fn enqueue(&self, command: Box<dyn DebugCommand>) -> bool {
        {
            let mut state = self.state.lock();
            if state.closed {
                debug!("Discarding command enqueued after the session closed.");
                return false;
            }
            state.commands.push_back(command);
        }
        self.ready.notify_one();
        true
    }

    /// Removes the head command and encodes it if no command is pending.
    ///
    /// The command is encoded without the lock held; the dispatch is reserved
    /// so no other command can be taken meanwhile. A command expecting a
    /// response enters the pending slot before this returns, so no other
    /// command can be dispatched between taking it and writing it.
    ///
    /// A payload spanning more than one line is abandoned and returned as
    /// `InvalidPayload`; the next command is then eligible.
    pub fn try_dispatch_if_idle(
        &self,
        session: &dyn SessionListener,
    ) -> Result<Option<Dispatch>, BridgeError> {
        let mut command = {
            let mut state = self.state.lock();
            if state.closed || state.dispatching || state.pending.is_some() {
                return Ok(None);
            }
            let Some(command) = state.commands.pop_front() else {
                return Ok(None);
            };
            state.dispatching = true;
            command
        };

        let payload = command.encode(session);
        let remaining = command.expected_response_lines();

        let rejection = {
            let mut state = self.state.lock();
            state.dispatching = false;
            if state.closed {
                Some(BridgeError::ConnectionClosed)
            } else if payload.contains(['\n', '\r']) {
                Some(BridgeError::InvalidPayload(payload.clone()))
            } else if remaining > 0 {
                state.pending = Some(PendingCommand {
                    command,
                    payload: payload.clone(),
                    remaining,
                    written_at: Instant::now(),
                });
                return Ok(Some(Dispatch {
                    payload,
                    expects_response: true,
                }));
            } else {
                None
            }
        };

        match rejection {
            None => {
                command.on_dispatched();
                Ok(Some(Dispatch {
                    payload,
                    expects_response: false,
                }))
            }
            // `close` ran while the command was being encoded.
            Some(BridgeError::ConnectionClosed) => {
                command.on_abandoned(&BridgeError::ConnectionClosed);
                Ok(None)
            }
            Some(error) => {
                debug!("Rejecting command: {}", error);
                command.on_abandoned(&error);
                Err(error)
            }
        }
    }

    /// Routes one response unit to the pending command, if there is one.
    pub fn deliver(&self, unit: &str) -> Delivery {
        {
            let mut state = self.state.lock();
            let Some(pending) = state.pending.as_mut() else {
                return Delivery::Unsolicited;
            };
            pending.remaining = pending.remaining.saturating_sub(1);
            if !pending.command.on_response_unit(unit) {
                return Delivery::Partial {
                    remaining: pending.remaining,
                };
            }
            debug!("Command '{}' satisfied.", pending.payload);
            state.pending = None;
        }
        self.ready.notify_one();
        Delivery::Completed
    }

    /// Evicts the pending command if it has waited longer than `timeout`.
    /// Returns the resulting fault after notifying the command.
    pub fn expire_pending(&self, timeout: Duration) -> Option<BridgeError> {
        let (mut pending, elapsed) = {
            let mut state = self.state.lock();
            let elapsed = state.pending.as_ref()?.written_at.elapsed();
            if elapsed < timeout {
                return None;
            }
            let pending = state.pending.take()?;
            (pending, elapsed)
        };
        self.ready.notify_one();
        let error = BridgeError::ResponseTimeout {
            command: pending.payload.clone(),
            elapsed,
        };
        pending.command.on_abandoned(&error);
        Some(error)
    }

    /// Closes the queue: further enqueues are discarded and every queued or
    /// pending command is abandoned with `reason`. Idempotent.
    pub fn close(&self, reason: &BridgeError) {
        let (pending, queued) = {
            let mut state = self.state.lock();
            state.closed = true;
            (state.pending.take(), std::mem::take(&mut state.commands))
        };
        // Abandon outside the lock; a command's hook may wake arbitrary waiters.
        if let Some(mut pending) = pending {
            pending.command.on_abandoned(reason);
        }
        for mut command in queued {
            command.on_abandoned(reason);
        }
        self.ready.notify_waiters();
    }

    /// Waits until a command may be eligible for dispatch or `max_wait`
    /// elapses, whichever comes first.
    pub async fn wait_ready(&self, max_wait: Duration) {
        let _ = tokio::time::timeout(max_wait, self.ready.notified()).await;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// True when nothing is queued and nothing awaits a response.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.pending.is_none() && !state.dispatching && state.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
