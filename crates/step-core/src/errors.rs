//! Errores del contrato de Steps.
//!
//! `StepError` es el único error que cruza la API pública de un Step. Los
//! fallos de ejecución NO se reportan por aquí: se reflejan como transición a
//! `error` y se notifican por eventos.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::step::StatusCode;

/// Código de estado crudo fuera del espacio admitido (`0..=599`).
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum StatusError {
    #[error("negative status code {0}")] Negative(i64),
    #[error("status code {0} out of range 0..=599")] OutOfRange(i64),
}

/// Una violación concreta del schema de opciones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer de la instancia que falló (vacío = raíz).
    pub path: String,
    pub message: String,
}

/// Resultado fallido de validar opciones contra su schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Indica si alguna violación apunta a `path` o a un hijo suyo.
    pub fn touches(&self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        self.violations.iter().any(|v| is_within(&v.path, path))
    }
}

/// `candidate` es `path` o un descendiente (`/a/b` está dentro de `/a`, `/ab` no).
fn is_within(candidate: &str, path: &str) -> bool {
    match candidate.strip_prefix(path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for v in &self.violations {
            let path = if v.path.is_empty() { "(root)" } else { v.path.as_str() };
            write!(f, "; {path}: {}", v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("step already terminal ({status})")] StepAlreadyTerminal { status: StatusCode },
    #[error("status regression {from} -> {to}")] StatusRegression { from: StatusCode, to: StatusCode },
    #[error("invalid status: {0}")] InvalidStatus(#[from] StatusError),
    #[error("options validation failed: {0}")] Validation(#[from] ValidationError),
    #[error("invalid options schema: {0}")] InvalidSchema(String),
    #[error("options decode: {0}")] OptionsDecode(#[from] serde_json::Error),
    #[error("invalid input: {0}")] InvalidInput(String),
}

impl StepError {
    /// `true` para errores de validación de opciones (el caso que un formulario
    /// debe mostrar al usuario).
    pub fn is_validation(&self) -> bool {
        matches!(self, StepError::Validation(_))
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            StepError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = ValidationError::new(vec![Violation { path: String::new(),
                                                        message: "\"x\" is a required property".into() },
                                            Violation { path: "/count".into(),
                                                        message: "\"a\" is not of type \"integer\"".into() }]);
        let text = err.to_string();
        assert!(text.starts_with("2 violation(s)"));
        assert!(text.contains("(root): \"x\" is a required property"));
        assert!(text.contains("/count:"));
        assert!(err.touches("/count"));
        assert!(!err.touches("/other"));
    }

    #[test]
    fn touches_matches_whole_path_segments() {
        let err = ValidationError::new(vec![Violation { path: "/counter".into(),
                                                        message: "too big".into() },
                                            Violation { path: "/address/city".into(),
                                                        message: "missing".into() }]);
        assert!(!err.touches("/count"));
        assert!(err.touches("/counter"));
        assert!(err.touches("/address"));
        assert!(err.touches("/address/"));
        assert!(!err.touches("/address/ci"));
        assert!(err.touches(""));
    }

    #[test]
    fn step_error_classifies_validation() {
        let err: StepError = ValidationError::new(vec![]).into();
        assert!(err.is_validation());
        assert!(err.validation().is_some());
        let other = StepError::InvalidInput("nope".into());
        assert!(!other.is_validation());
        assert_eq!(other.to_string(), "invalid input: nope");
    }

    #[test]
    fn status_error_messages() {
        assert_eq!(StatusError::Negative(-1).to_string(), "negative status code -1");
        assert_eq!(StatusError::OutOfRange(600).to_string(), "status code 600 out of range 0..=599");
    }
}
