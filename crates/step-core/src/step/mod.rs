//! Contrato de Steps.
//!
//! Un Step es una unidad de trabajo con estado, opciones y notificaciones de
//! ciclo de vida. Este módulo define:
//! - `StepStatus` / `StatusCode`: espacio de estados y clasificación.
//! - `Step`: interfaz de capacidades compartida por todas las variantes
//!   concretas (opciones, ejecución, estado, suscripción).
//! - `StepLifecycle` + `LifecycleHost`: estado y listeners que cada variante
//!   embebe, con las transiciones que emiten eventos.

mod definition;
mod lifecycle;
pub mod macros;
mod status;

pub use definition::{Step, StepKind};
pub use lifecycle::{LifecycleHost, RunGate, StatusTransition, StepLifecycle};
pub use status::{check_transition, StatusCode, StepStatus, MAX_STATUS_CODE};
