//! step-adapters: variantes concretas del contrato de `step-core`.
//!
//! - `TaskStep`: automatizado, recorre ítems con una función de trabajo.
//! - `FormStep`: guiado por un formulario (schema provisto por quien lo crea).
//! - `HumanGateStep`: compuerta que espera aprobaciones humanas.
//!
//! Todas comparten la misma interfaz (`Step`) y se pueden manejar como
//! `Box<dyn Step>`.

pub mod steps;

pub use steps::{Approval, FormStep, GateOptions, HumanGateStep, TaskOptions, TaskOutcome, TaskStep};

/// Evento propio que emiten los steps que esperan intervención humana.
pub const INPUT_REQUESTED: &str = "inputRequested";
