//! Recorder de eventos en memoria (append-only, con `seq` incremental).
//!
//! Pensado para capas de reporte y para tests: se engancha como un listener
//! más y conserva una copia propia de cada payload.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{StepEventData, StepEventHandler, StepEventName};
use crate::step::{Step, StatusCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub seq: u64, // orden de llegada, compartido entre todos los steps observados
    pub step_id: String,
    pub instance_id: Uuid,
    pub event: StepEventName,
    pub previous_status: StatusCode,
    pub status: StatusCode,
    pub reason: Option<String>,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    inner: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> StepEventHandler {
        let inner = Arc::clone(&self.inner);
        Box::new(move |data: &StepEventData<'_>| {
            let mut events = lock(&inner);
            let seq = events.len() as u64;
            events.push(RecordedEvent { seq,
                                        step_id: data.step.id().to_string(),
                                        instance_id: data.step.instance_id(),
                                        event: data.event.clone(),
                                        previous_status: data.previous_status,
                                        status: data.status,
                                        reason: data.reason.map(str::to_owned),
                                        ts: data.date });
        })
    }

    /// Se suscribe a `statusChange` y `done` del step.
    pub fn attach(&self, step: &mut dyn Step) {
        self.attach_to(step, StepEventName::StatusChange);
        self.attach_to(step, StepEventName::Done);
    }

    pub fn attach_to(&self, step: &mut dyn Step, event: StepEventName) {
        step.on(event, self.handler());
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        lock(&self.inner).clone()
    }

    pub fn of_kind(&self, event: &StepEventName) -> Vec<RecordedEvent> {
        lock(&self.inner).iter().filter(|e| &e.event == event).cloned().collect()
    }

    /// Pares `(previo, nuevo)` de cada `statusChange` registrado.
    pub fn status_trail(&self) -> Vec<(StatusCode, StatusCode)> {
        lock(&self.inner).iter()
                         .filter(|e| e.event == StepEventName::StatusChange)
                         .map(|e| (e.previous_status, e.status))
                         .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock(inner: &Mutex<Vec<RecordedEvent>>) -> MutexGuard<'_, Vec<RecordedEvent>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
