// src/core/commands/default.rs

use super::command_trait::DebugCommand;
use crate::core::listener::SessionListener;

/// A plain text directive that expects no response, e.g. `RUN` or `STEP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultCommand {
    pub text: String,
}

impl DefaultCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl DebugCommand for DefaultCommand {
    fn encode(&self, _session: &dyn SessionListener) -> String {
        self.text.clone()
    }

    fn expected_response_lines(&self) -> usize {
        0
    }

    fn on_response_unit(&mut self, _unit: &str) -> bool {
        true
    }
}

impl From<&str> for DefaultCommand {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for DefaultCommand {
    fn from(text: String) -> Self {
        Self { text }
    }
}
