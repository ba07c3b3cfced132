//! Eventos de un Step: nombres, payload, listeners y un recorder en memoria.

mod listeners;
mod recorder;
mod types;

pub use listeners::{EmitReport, EventListeners, StepEventHandler};
pub use recorder::{EventRecorder, RecordedEvent};
pub use types::{StepEventData, StepEventName};
