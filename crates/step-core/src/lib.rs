//! step-core: contrato de Steps (estado, eventos y opciones).
//!
//! Sólo define el contrato. Cómo ejecuta cada Step concreto, cómo se
//! componen en flujos o cómo se persisten queda fuera de este crate.
pub mod errors;
pub mod event;
pub mod hashing;
pub mod options;
pub mod step;

pub use errors::{StatusError, StepError, ValidationError, Violation};
pub use event::{EmitReport, EventListeners, EventRecorder, RecordedEvent, StepEventData, StepEventHandler, StepEventName};
pub use options::{OptionsSchema, OptionsSlot};
pub use step::{check_transition, LifecycleHost, RunGate, StatusCode, StatusTransition, Step, StepKind, StepLifecycle,
               StepStatus};

pub use uuid::Uuid;
