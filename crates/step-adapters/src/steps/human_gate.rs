//! Compuerta humana: el step queda en `blocked` hasta reunir las aprobaciones
//! requeridas. Un rechazo es irrecuperable y termina en `error`.
use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use step_core::{delegate_lifecycle, lifecycle_host};
use step_core::{LifecycleHost, OptionsSchema, OptionsSlot, RunGate, StatusCode, Step, StepError, StepKind,
                StepLifecycle, StepStatus};

use super::{ensure_configurable, strict_flag};
use crate::INPUT_REQUESTED;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GateOptions {
    /// Texto que se muestra a quien debe aprobar.
    pub prompt: String,
    /// Personas habilitadas; vacío = cualquiera.
    #[serde(default)]
    pub approvers: Vec<String>,
    #[serde(default = "default_required_approvals")]
    #[schemars(range(min = 1))]
    pub required_approvals: u32,
}

fn default_required_approvals() -> u32 {
    1
}

impl GateOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(),
               approvers: Vec::new(),
               required_approvals: default_required_approvals() }
    }

    pub fn with_approvers<I, S>(mut self, approvers: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.approvers = approvers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required_approvals(mut self, required: u32) -> Self {
        self.required_approvals = required;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub by: String,
    pub at: DateTime<Utc>,
}

pub struct HumanGateStep {
    id: String,
    lifecycle: StepLifecycle,
    options: OptionsSlot<GateOptions>,
    strict: bool,
    approvals: Vec<Approval>,
}

lifecycle_host!(HumanGateStep => lifecycle);

impl HumanGateStep {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(),
               lifecycle: StepLifecycle::new(),
               options: OptionsSlot::empty(),
               strict: false,
               approvals: Vec::new() }
    }

    /// En modo estricto `approvers` es obligatorio y no vacío.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn configure(&mut self, options: &GateOptions) -> Result<(), StepError> {
        self.set_options(serde_json::to_value(options)?)
    }

    pub fn options(&self) -> Option<&GateOptions> {
        self.options.get()
    }

    pub fn approvals(&self) -> &[Approval] {
        &self.approvals
    }

    fn satisfied(&self) -> bool {
        self.options
            .get()
            .is_some_and(|o| self.approvals.len() >= o.required_approvals as usize)
    }

    fn request_approval(&self) {
        let prompt = self.options.get().map(|o| o.prompt.as_str()).unwrap_or("gate not configured");
        let report = self.emit_custom(INPUT_REQUESTED, Some(prompt));
        debug!("step '{}' requested approval ({} listener(s))", self.id, report.delivered);
    }

    /// Verifica que la compuerta espere una decisión de `who`.
    fn check_decider(&self, who: &str) -> Result<&GateOptions, StepError> {
        let status = self.lifecycle.status();
        if status.is_terminal() {
            return Err(StepError::StepAlreadyTerminal { status });
        }
        if status.phase() != StepStatus::Blocked {
            return Err(StepError::InvalidInput(format!("gate '{}' is not awaiting a decision ({status})", self.id)));
        }
        let options = self.options
                          .get()
                          .ok_or_else(|| StepError::InvalidInput(format!("gate '{}' is not configured", self.id)))?;
        if !options.approvers.is_empty() && !options.approvers.iter().any(|a| a == who) {
            return Err(StepError::InvalidInput(format!("'{who}' is not an approver of '{}'", self.id)));
        }
        Ok(options)
    }

    /// Registra la aprobación de `who`. Devuelve `true` si con ella la
    /// compuerta se abrió (y el step terminó en `done`).
    pub fn approve(&mut self, who: &str) -> Result<bool, StepError> {
        self.check_decider(who)?;
        if self.approvals.iter().any(|a| a.by == who) {
            debug!("step '{}' ignoring duplicate approval from '{who}'", self.id);
            return Ok(false);
        }
        self.approvals.push(Approval { by: who.to_string(),
                                       at: Utc::now() });
        if !self.satisfied() {
            return Ok(false);
        }
        info!("step '{}' approved by {}", self.id, who);
        self.transition_to(StatusCode::IN_PROGRESS, None)?;
        self.transition_to(StatusCode::DONE, None)?;
        Ok(true)
    }

    /// Rechazo definitivo: el step termina en `error`.
    pub fn reject(&mut self, who: &str, reason: &str) -> Result<(), StepError> {
        self.check_decider(who)?;
        let reason = format!("rejected by {who}: {reason}");
        self.transition_to(StatusCode::ERROR, Some(&reason))?;
        Ok(())
    }
}

impl fmt::Debug for HumanGateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HumanGateStep")
         .field("id", &self.id)
         .field("status", &self.lifecycle.status())
         .field("options", &self.options.get())
         .field("approvals", &self.approvals)
         .finish()
    }
}

impl Step for HumanGateStep {
    delegate_lifecycle!();

    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> StepKind {
        StepKind::HumanGate
    }

    /// `{"strict": true}` exige una lista de aprobadores no vacía.
    fn get_options(&self, params: &Value) -> OptionsSchema {
        let schema = OptionsSchema::for_type::<GateOptions>();
        if strict_flag(params, self.strict) {
            schema.require("approvers").constrain("approvers", "minItems", json!(1))
        } else {
            schema
        }
    }

    fn set_options(&mut self, options: Value) -> Result<(), StepError> {
        ensure_configurable(&*self)?;
        let schema = self.get_options(&Value::Null);
        let applied = self.options.apply(options, &schema)?;
        if !applied.approvers.is_empty() {
            // sólo cuentan aprobaciones de quienes siguen habilitados
            let allowed = applied.approvers.clone();
            let before = self.approvals.len();
            self.approvals.retain(|a| allowed.contains(&a.by));
            if self.approvals.len() != before {
                debug!("step '{}' discarded {} approval(s) after reconfiguration",
                       self.id,
                       before - self.approvals.len());
            }
        }
        Ok(())
    }

    fn options_value(&self) -> Option<Value> {
        self.options.to_value()
    }

    fn run(&mut self) {
        match self.begin_run() {
            RunGate::Start => {
                if !self.start() {
                    return;
                }
                let reason = if self.options.is_set() { "awaiting approval" } else { "gate not configured" };
                if self.block(reason) {
                    self.request_approval();
                }
            }
            RunGate::Resume { .. } => {
                if self.satisfied() {
                    if self.advance(StepStatus::InProgress) {
                        self.advance(StepStatus::Done);
                    }
                } else {
                    self.request_approval();
                }
            }
            RunGate::Ignore { .. } => {}
        }
    }
}
