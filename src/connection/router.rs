// src/connection/router.rs

//! Defines `ResponseRouter`, which correlates each decoded unit with the
//! pending command or dispatches it as an unsolicited event.

use super::reader::UnitSink;
use crate::core::BridgeError;
use crate::core::protocol::EventFrame;
use crate::core::queue::Delivery;
use crate::core::state::BridgeState;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a unit ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Handed to the pending command's response handler.
    Response(Delivery),
    /// Dispatched to the session listener.
    Event(EventFrame),
    /// A blank unit with no command pending.
    Ignored,
}

pub struct ResponseRouter {
    state: Arc<BridgeState>,
}

impl ResponseRouter {
    pub fn new(state: Arc<BridgeState>) -> Self {
        Self { state }
    }

    /// Routes one unit. A pending command always takes precedence; the
    /// listener is only invoked when no command is awaiting a response.
    pub fn route(&self, unit: &str) -> Result<Routed, BridgeError> {
        let unit = unit.trim();
        match self.state.queue.deliver(unit) {
            Delivery::Unsolicited => {}
            delivery => {
                debug!("Response unit '{}' routed to pending command: {:?}", unit, delivery);
                return Ok(Routed::Response(delivery));
            }
        }

        if unit.is_empty() {
            debug!("Ignoring blank unit with no pending command.");
            return Ok(Routed::Ignored);
        }

        let event: EventFrame = unit.parse()?;
        debug!("Unsolicited event: {}", event);
        self.state.listener.handle_resp(event.code, &event.params);
        Ok(Routed::Event(event))
    }
}

impl UnitSink for ResponseRouter {
    fn on_unit(&self, unit: String) {
        if self.state.is_shutting_down() {
            debug!("Dropping unit received during shutdown.");
            return;
        }
        if let Err(e) = self.route(&unit) {
            // A malformed unit is dropped; the connection stays up.
            warn!("Dropping unroutable unit: {}", e);
            self.state.listener.handle_fault(&e);
        }
    }
}
