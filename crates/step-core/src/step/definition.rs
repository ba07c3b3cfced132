use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{StatusCode, StepStatus};
use crate::errors::StepError;
use crate::event::{StepEventData, StepEventHandler, StepEventName};
use crate::hashing::hash_value;
use crate::options::OptionsSchema;

/// Familia de un Step, útil para UI y reportes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Automated,
    Form,
    HumanGate,
    Custom,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKind::Automated => "automated",
            StepKind::Form => "form",
            StepKind::HumanGate => "human_gate",
            StepKind::Custom => "custom",
        };
        f.write_str(s)
    }
}

/// Interfaz común de un Step.
///
/// El progreso y el resultado de `run` se comunican sólo por eventos: la
/// ejecución puede ser larga, asíncrona o depender de una persona.
pub trait Step {
    /// Identificador estable del step.
    fn id(&self) -> &str;

    /// Nombre amigable (por defecto el id).
    fn name(&self) -> &str {
        self.id()
    }

    fn kind(&self) -> StepKind;

    /// Identificador de esta instancia concreta.
    fn instance_id(&self) -> Uuid;

    /// Schema de la configuración que la instancia requiere ahora. `params`
    /// depende de cada implementación (p. ej. `{"strict": true}`).
    fn get_options(&self, params: &Value) -> OptionsSchema;

    /// Valida `options` contra el schema de `get_options` y, sólo si es válido,
    /// lo aplica.
    fn set_options(&mut self, options: Value) -> Result<(), StepError>;

    /// Opciones aplicadas actualmente.
    fn options_value(&self) -> Option<Value>;

    fn options_fingerprint(&self) -> Option<String> {
        self.options_value().map(|v| hash_value(&v))
    }

    /// Dispara la ejecución. No devuelve progreso ni errores: los fallos se
    /// reflejan como transición a `error` (o `blocked` si son resolubles).
    fn run(&mut self);

    /// Estado crudo (puede ser un valor intermedio).
    fn status(&self) -> StatusCode;

    /// Estado clasificado al ancla inferior más cercana.
    fn get_status(&self) -> StepStatus {
        self.status().phase()
    }

    fn on(&mut self, event: StepEventName, handler: StepEventHandler);

    fn subscribe<F>(&mut self, event: StepEventName, handler: F) -> &mut Self
        where Self: Sized,
              F: Fn(&StepEventData<'_>) + Send + Sync + 'static
    {
        self.on(event, Box::new(handler));
        self
    }

    fn with_listener<F>(mut self, event: StepEventName, handler: F) -> Self
        where Self: Sized,
              F: Fn(&StepEventData<'_>) + Send + Sync + 'static
    {
        self.on(event, Box::new(handler));
        self
    }
}
