//! Step automatizado: recorre una lista de ítems con una función de trabajo.
//!
//! Reporta progreso granular con códigos intermedios entre `in progress` y
//! `done` (`200 + procesados * 99 / total`). Un ítem bloqueado deja el step en
//! `blocked` y el siguiente `run()` reintenta ese mismo ítem.
use std::fmt;
use std::sync::Arc;

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use step_core::{delegate_lifecycle, lifecycle_host};
use step_core::{LifecycleHost, OptionsSchema, OptionsSlot, RunGate, StatusCode, Step, StepError, StepKind,
                StepLifecycle, StepStatus};

use super::{ensure_configurable, strict_flag};

/// Configuración de un `TaskStep`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaskOptions {
    /// Ítems a procesar, en orden.
    pub items: Vec<String>,
    /// Intentos por ítem antes de terminar en `error` (un bloqueo los renueva).
    #[serde(default = "default_max_attempts")]
    #[schemars(range(min = 1))]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    1
}

impl TaskOptions {
    pub fn new<I, S>(items: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { items: items.into_iter().map(Into::into).collect(),
               max_attempts: default_max_attempts() }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Resultado de procesar un ítem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// Problema resoluble: el step queda en `blocked`.
    Blocked(String),
    /// Fallo del intento; se reintenta hasta `max_attempts`.
    Failed(String),
}

pub type TaskFn = Arc<dyn Fn(&str) -> TaskOutcome + Send + Sync>;

pub struct TaskStep {
    id: String,
    lifecycle: StepLifecycle,
    options: OptionsSlot<TaskOptions>,
    task: TaskFn,
    strict: bool,
    cursor: usize,
    attempts: u32,
}

lifecycle_host!(TaskStep => lifecycle);

impl TaskStep {
    pub fn new<F>(id: impl Into<String>, task: F) -> Self
        where F: Fn(&str) -> TaskOutcome + Send + Sync + 'static
    {
        Self { id: id.into(),
               lifecycle: StepLifecycle::new(),
               options: OptionsSlot::empty(),
               task: Arc::new(task),
               strict: false,
               cursor: 0,
               attempts: 0 }
    }

    /// En modo estricto la lista de ítems no puede estar vacía.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Aplica opciones tipadas pasando por la misma validación que
    /// `set_options`.
    pub fn configure(&mut self, options: &TaskOptions) -> Result<(), StepError> {
        self.set_options(serde_json::to_value(options)?)
    }

    pub fn options(&self) -> Option<&TaskOptions> {
        self.options.get()
    }

    /// Ítems ya completados.
    pub fn processed(&self) -> usize {
        self.cursor
    }

    fn progress_code(done: usize, total: usize) -> StatusCode {
        if total == 0 {
            return StatusCode::IN_PROGRESS;
        }
        let offset = (done.min(total) * 99 / total) as u16;
        StatusCode::within(StepStatus::InProgress, offset).unwrap_or(StatusCode::IN_PROGRESS)
    }

    fn process(&mut self) {
        let Some(options) = self.options.get().cloned() else {
            self.block("options not configured");
            return;
        };
        let total = options.items.len();
        while self.cursor < total {
            let item = &options.items[self.cursor];
            match (self.task)(item) {
                TaskOutcome::Completed => {
                    self.cursor += 1;
                    self.attempts = 0;
                    if self.cursor < total {
                        let code = Self::progress_code(self.cursor, total);
                        self.advance(code);
                    }
                }
                TaskOutcome::Blocked(reason) => {
                    // al reanudar el ítem tiene de nuevo todos sus intentos
                    self.attempts = 0;
                    self.block(&format!("item '{item}': {reason}"));
                    return;
                }
                TaskOutcome::Failed(reason) => {
                    self.attempts += 1;
                    if self.attempts >= options.max_attempts {
                        self.fail(&format!("item '{item}' failed after {} attempt(s): {reason}", self.attempts));
                        return;
                    }
                    debug!("step '{}' retrying item '{item}' ({}/{}): {reason}",
                           self.id,
                           self.attempts,
                           options.max_attempts);
                }
            }
        }
        self.advance(StepStatus::Done);
    }
}

impl fmt::Debug for TaskStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStep")
         .field("id", &self.id)
         .field("status", &self.lifecycle.status())
         .field("options", &self.options.get())
         .field("cursor", &self.cursor)
         .finish()
    }
}

impl Step for TaskStep {
    delegate_lifecycle!();

    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> StepKind {
        StepKind::Automated
    }

    fn get_options(&self, params: &Value) -> OptionsSchema {
        let schema = OptionsSchema::for_type::<TaskOptions>();
        if strict_flag(params, self.strict) {
            schema.constrain("items", "minItems", json!(1))
        } else {
            schema
        }
    }

    fn set_options(&mut self, options: Value) -> Result<(), StepError> {
        ensure_configurable(&*self)?;
        let schema = self.get_options(&Value::Null);
        let previous_items = self.options.get().map(|o| o.items.clone());
        let applied = self.options.apply(options, &schema)?;
        if previous_items.as_ref() != Some(&applied.items) {
            // otra lista de trabajo: se empieza de cero
            self.cursor = 0;
            self.attempts = 0;
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
            }
            RunGate::Resume { .. } => {
                if !self.options.is_set() {
                    debug!("step '{}' still waiting for options", self.id);
                    return;
                }
                let code = match self.options.get() {
                    Some(o) if self.cursor > 0 => Self::progress_code(self.cursor, o.items.len()),
                    _ => StatusCode::IN_PROGRESS,
                };
                if !self.advance(code) {
                    return;
                }
            }
            RunGate::Ignore { .. } => return,
        }
        self.process();
    }
}
