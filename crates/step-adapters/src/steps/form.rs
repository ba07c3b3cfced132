//! Step guiado por formulario.
//!
//! El schema lo provee quien construye el step (se renderiza como `<form>` en
//! la UI). `run()` bloquea y emite `inputRequested` hasta que exista un envío
//! completo; en modo borrador se aceptan envíos parciales, pero el step sólo
//! termina cuando el envío satisface el schema completo.
use std::fmt;

use log::debug;
use serde_json::Value;
use step_core::{delegate_lifecycle, lifecycle_host};
use step_core::{LifecycleHost, OptionsSchema, OptionsSlot, RunGate, Step, StepError, StepKind, StepLifecycle,
                StepStatus};

use super::ensure_configurable;
use crate::INPUT_REQUESTED;

pub struct FormStep {
    id: String,
    lifecycle: StepLifecycle,
    schema: OptionsSchema,
    submission: OptionsSlot<Value>,
    draft: bool,
}

lifecycle_host!(FormStep => lifecycle);

impl FormStep {
    pub fn new(id: impl Into<String>, schema: OptionsSchema) -> Self {
        Self { id: id.into(),
               lifecycle: StepLifecycle::new(),
               schema,
               submission: OptionsSlot::empty(),
               draft: false }
    }

    /// Acepta envíos parciales (sin campos requeridos).
    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    pub fn submission(&self) -> Option<&Value> {
        self.submission.get()
    }

    /// `true` si el envío actual satisface el schema completo.
    pub fn is_complete(&self) -> bool {
        self.submission.get().is_some_and(|v| self.schema.validate(v).is_ok())
    }

    fn request_input(&self, reason: &str) {
        let report = self.emit_custom(INPUT_REQUESTED, Some(reason));
        debug!("step '{}' requested input ({} listener(s))", self.id, report.delivered);
    }

    fn wait_for_submission(&mut self) {
        let reason = if self.submission.is_set() { "submission incomplete" } else { "awaiting form submission" };
        self.block(reason);
        self.request_input(reason);
    }
}

impl fmt::Debug for FormStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormStep")
         .field("id", &self.id)
         .field("status", &self.lifecycle.status())
         .field("submission", &self.submission.get())
         .field("draft", &self.draft)
         .finish()
    }
}

impl Step for FormStep {
    delegate_lifecycle!();

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        self.schema.title().unwrap_or(&self.id)
    }

    fn kind(&self) -> StepKind {
        StepKind::Form
    }

    /// `{"draft": true}` devuelve el schema sin campos requeridos.
    fn get_options(&self, params: &Value) -> OptionsSchema {
        let draft = params.get("draft").and_then(Value::as_bool).unwrap_or(self.draft);
        if draft {
            self.schema.clone().without_required()
        } else {
            self.schema.clone()
        }
    }

    fn set_options(&mut self, options: Value) -> Result<(), StepError> {
        ensure_configurable(&*self)?;
        let schema = self.get_options(&Value::Null);
        self.submission.apply(options, &schema)?;
        Ok(())
    }

    fn options_value(&self) -> Option<Value> {
        self.submission.to_value()
    }

    fn run(&mut self) {
        match self.begin_run() {
            RunGate::Start => {
                if !self.start() {
                    return;
                }
            }
            RunGate::Resume { .. } => {
                if !self.is_complete() {
                    // sigue sin envío válido: recordatorio sin transición
                    self.request_input("awaiting form submission");
                    return;
                }
                if !self.advance(StepStatus::InProgress) {
                    return;
                }
            }
            RunGate::Ignore { .. } => return,
        }
        if self.is_complete() {
            self.advance(StepStatus::Done);
        } else {
            self.wait_for_submission();
        }
    }
}
