// src/core/protocol/event.rs

//! The parsed form of an unsolicited wire message: `<decimal-code> <params...>`.

use crate::core::BridgeError;
use std::fmt;
use std::str::FromStr;

/// An event the debuggee sent without being asked, e.g. `202 Paused main.lua 12`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFrame {
    pub code: i32,
    pub params: Vec<String>,
}

impl EventFrame {
    pub fn new(code: i32, params: Vec<String>) -> Self {
        Self { code, params }
    }
}

impl FromStr for EventFrame {
    type Err = BridgeError;

    /// Splits a trimmed unit on whitespace. The first token must be a decimal
    /// integer; anything else is reported as `MalformedEvent`.
    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        let mut tokens = unit.split_whitespace();
        let code = tokens
            .next()
            .and_then(|head| head.parse::<i32>().ok())
            .ok_or_else(|| BridgeError::MalformedEvent(unit.to_string()))?;
        Ok(Self {
            code,
            params: tokens.map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for EventFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        Ok(())
    }
}
