//! Estado de ciclo de vida que cada Step concreto embebe.
//!
//! La mutación del estado y la emisión de eventos forman una sola unidad: el
//! nuevo código se aplica primero y luego los listeners se ejecutan con el
//! step prestado en modo compartido, de modo que nadie puede observar un
//! `status` distinto del que trae el payload.
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{check_transition, StatusCode, Step, StepStatus};
use crate::errors::StepError;
use crate::event::{EmitReport, EventListeners, StepEventData, StepEventHandler, StepEventName};

/// Registro de una transición ya aplicada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: StatusCode,
    pub to: StatusCode,
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Qué hacer ante una invocación de `run()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunGate {
    /// Primer arranque desde `pending`.
    Start,
    /// Reanudación desde `blocked`.
    Resume { from: StatusCode },
    /// Ya en ejecución o terminal: la llamada se ignora.
    Ignore { status: StatusCode },
}

#[derive(Debug)]
pub struct StepLifecycle {
    instance_id: Uuid,
    status: StatusCode,
    listeners: EventListeners,
    history: Vec<StatusTransition>,
    runs: u32,
    reason: Option<String>,
}

impl Default for StepLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl StepLifecycle {
    pub fn new() -> Self {
        Self { instance_id: Uuid::new_v4(),
               status: StatusCode::PENDING,
               listeners: EventListeners::new(),
               history: Vec::new(),
               runs: 0,
               reason: None }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn phase(&self) -> StepStatus {
        self.status.phase()
    }

    pub fn history(&self) -> &[StatusTransition] {
        &self.history
    }

    /// Cantidad de invocaciones de `run()` que arrancaron o reanudaron.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Motivo de la última transición que lo informó (bloqueo o error).
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn listeners(&self) -> &EventListeners {
        &self.listeners
    }

    pub fn on(&mut self, event: StepEventName, handler: StepEventHandler) {
        self.listeners.on(event, handler);
    }

    pub(crate) fn commit(&mut self, from: StatusCode, to: StatusCode, at: DateTime<Utc>, reason: Option<&str>) {
        self.status = to;
        self.reason = reason.map(str::to_owned);
        self.history.push(StatusTransition { from,
                                             to,
                                             at,
                                             reason: self.reason.clone() });
    }

    pub(crate) fn gate(&mut self) -> RunGate {
        match self.status.phase() {
            StepStatus::Pending => {
                self.runs += 1;
                RunGate::Start
            }
            StepStatus::Blocked => {
                self.runs += 1;
                RunGate::Resume { from: self.status }
            }
            _ => RunGate::Ignore { status: self.status },
        }
    }
}

/// Implementado por los Steps concretos que embeben un `StepLifecycle`.
///
/// Provee las transiciones con emisión de eventos; las implementaciones no
/// deberían tocar el estado por otra vía.
pub trait LifecycleHost: Step + Sized {
    fn lifecycle(&self) -> &StepLifecycle;

    fn lifecycle_mut(&mut self) -> &mut StepLifecycle;

    /// Aplica `from -> to` y notifica. `Ok(false)` si `to` es el estado actual.
    fn transition_to(&mut self, to: StatusCode, reason: Option<&str>) -> Result<bool, StepError> {
        let previous = self.lifecycle().status();
        if !check_transition(previous, to)? {
            return Ok(false);
        }
        let date = Utc::now();
        self.lifecycle_mut().commit(previous, to, date, reason);
        debug!("step '{}' {} -> {}", self.id(), previous, to);

        let host: &Self = self;
        let status_change = StepEventName::StatusChange;
        let data = StepEventData { step: host,
                                   event: &status_change,
                                   previous_status: previous,
                                   status: to,
                                   date,
                                   reason };
        host.lifecycle().listeners().emit(&data);

        if to.phase() == StepStatus::Done {
            let done = StepEventName::Done;
            host.lifecycle().listeners().emit(&StepEventData { event: &done, ..data });
        }
        Ok(true)
    }

    /// Variante de `transition_to` para usar dentro de `run()`: los errores
    /// de contrato se registran en el log en lugar de propagarse.
    fn advance(&mut self, to: impl Into<StatusCode>) -> bool {
        let to = to.into();
        match self.transition_to(to, None) {
            Ok(changed) => changed,
            Err(e) => {
                error!("step '{}' could not move to {}: {e}", self.id(), to);
                false
            }
        }
    }

    /// Pausa por un problema resoluble.
    fn block(&mut self, reason: &str) -> bool {
        info!("step '{}' blocked: {reason}", self.id());
        match self.transition_to(StatusCode::BLOCKED, Some(reason)) {
            Ok(changed) => changed,
            Err(e) => {
                error!("step '{}' could not block: {e}", self.id());
                false
            }
        }
    }

    /// Termina en `error` (irrecuperable).
    fn fail(&mut self, reason: &str) -> bool {
        warn!("step '{}' failed: {reason}", self.id());
        match self.transition_to(StatusCode::ERROR, Some(reason)) {
            Ok(changed) => changed,
            Err(e) => {
                error!("step '{}' could not fail: {e}", self.id());
                false
            }
        }
    }

    /// `pending -> assigned -> in progress`.
    fn start(&mut self) -> bool {
        self.advance(StepStatus::Assigned) && self.advance(StepStatus::InProgress)
    }

    /// Decide qué hace esta invocación de `run()` (ver `RunGate`).
    fn begin_run(&mut self) -> RunGate {
        let gate = self.lifecycle_mut().gate();
        if let RunGate::Ignore { status } = gate {
            warn!("step '{}' ignoring run() while {}", self.id(), status);
        }
        gate
    }

    /// Emite un evento propio de la implementación sin cambiar el estado.
    fn emit_custom(&self, name: &str, reason: Option<&str>) -> EmitReport {
        let event = StepEventName::custom(name);
        let status = self.lifecycle().status();
        let data = StepEventData { step: self,
                                   event: &event,
                                   previous_status: status,
                                   status,
                                   date: Utc::now(),
                                   reason };
        self.lifecycle().listeners().emit(&data)
    }
}
