//! Registro de listeners por nombre de evento.
//!
//! Los handlers se invocan en orden de registro. Un handler que entra en
//! pánico no impide que el resto reciba el evento ni altera el estado del
//! Step: el pánico se captura y se registra en el log.
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexMap;
use log::warn;

use super::{StepEventData, StepEventName};

/// Handler de eventos. El valor de retorno no existe: el emisor no consume
/// nada del listener.
pub type StepEventHandler = Box<dyn Fn(&StepEventData<'_>) + Send + Sync>;

/// Resultado de una emisión.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct EventListeners {
    handlers: IndexMap<StepEventName, Vec<StepEventHandler>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, event: StepEventName, handler: StepEventHandler) {
        self.handlers.entry(event).or_default().push(handler);
    }

    pub fn count(&self, event: &StepEventName) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }

    /// Nombres con al menos un handler, en orden de primera suscripción.
    pub fn names(&self) -> impl Iterator<Item = &StepEventName> {
        self.handlers.keys()
    }

    pub fn emit(&self, data: &StepEventData<'_>) -> EmitReport {
        let mut report = EmitReport::default();
        let Some(handlers) = self.handlers.get(data.event) else {
            return report;
        };
        for (idx, handler) in handlers.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(data))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    report.failed += 1;
                    warn!("listener #{idx} for '{}' on step '{}' panicked: {}",
                          data.event,
                          data.step.id(),
                          panic_message(payload.as_ref()));
                }
            }
        }
        report
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, handlers) in &self.handlers {
            map.entry(&name.as_str(), &handlers.len());
        }
        map.finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
