//! Nombre de evento y payload entregado a los listeners.
//!
//! Contrato observable:
//! - `statusChange`: cada transición de estado, incluidas `blocked`, `error`
//!   y `done`.
//! - `done`: además de `statusChange`, al entrar en la fase `done`.
//! - Implementaciones concretas pueden emitir nombres propios (`Custom`).
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::step::{Step, StatusCode};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepEventName {
    StatusChange,
    Done,
    Custom(String),
}

impl StepEventName {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            StepEventName::StatusChange => "statusChange",
            StepEventName::Done => "done",
            StepEventName::Custom(name) => name,
        }
    }
}

impl From<String> for StepEventName {
    fn from(name: String) -> Self {
        match name.as_str() {
            "statusChange" => StepEventName::StatusChange,
            "done" => StepEventName::Done,
            _ => StepEventName::Custom(name),
        }
    }
}

impl From<&str> for StepEventName {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<StepEventName> for String {
    fn from(name: StepEventName) -> Self {
        match name {
            StepEventName::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for StepEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload de un evento. El estado del Step ya está comprometido cuando se
/// entrega: `step.status() == status`.
#[derive(Clone, Copy)]
pub struct StepEventData<'a> {
    pub step: &'a dyn Step,
    pub event: &'a StepEventName,
    pub previous_status: StatusCode,
    pub status: StatusCode,
    pub date: DateTime<Utc>,
    /// Motivo del bloqueo / error, si la transición lo informó.
    pub reason: Option<&'a str>,
}

impl fmt::Debug for StepEventData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepEventData")
         .field("step", &self.step.id())
         .field("event", self.event)
         .field("previous_status", &self.previous_status)
         .field("status", &self.status)
         .field("date", &self.date)
         .field("reason", &self.reason)
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_strings() {
        assert_eq!(StepEventName::from("statusChange"), StepEventName::StatusChange);
        assert_eq!(StepEventName::from("done"), StepEventName::Done);
        assert_eq!(StepEventName::custom("inputRequested"), StepEventName::Custom("inputRequested".into()));
        assert_eq!(String::from(StepEventName::StatusChange), "statusChange");
        assert_eq!(serde_json::to_string(&StepEventName::Done).unwrap(), "\"done\"");
        let parsed: StepEventName = serde_json::from_str("\"inputRequested\"").unwrap();
        assert_eq!(parsed.to_string(), "inputRequested");
    }
}
