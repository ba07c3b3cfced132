//! Variantes concretas de Step.

pub mod form;
pub mod human_gate;
pub mod task;

use serde_json::Value;
use step_core::{Step, StepError};

pub use form::FormStep;
pub use human_gate::{Approval, GateOptions, HumanGateStep};
pub use task::{TaskFn, TaskOptions, TaskOutcome, TaskStep};

/// Lee el flag `strict` de los parámetros de `get_options`.
pub(crate) fn strict_flag(params: &Value, default: bool) -> bool {
    params.get("strict").and_then(Value::as_bool).unwrap_or(default)
}

/// Las opciones sólo se aceptan antes o durante la ejecución.
pub(crate) fn ensure_configurable(step: &dyn Step) -> Result<(), StepError> {
    let status = step.status();
    if status.is_terminal() {
        return Err(StepError::StepAlreadyTerminal { status });
    }
    Ok(())
}
