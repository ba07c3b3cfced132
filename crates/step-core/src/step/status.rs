//! Espacio de estados de un Step.
//!
//! Seis anclas separadas por 100 (idea inspirada en los códigos HTTP): los
//! huecos entre anclas quedan libres para estados intermedios propios de cada
//! implementación (p. ej. `250` = "en progreso, a mitad de camino").
//!
//! Transiciones:
//! - `done` y `error` son terminales.
//! - Desde `blocked` se puede volver a cualquier estado (se resolvió el
//!   bloqueo) o terminar.
//! - Desde el resto de estados activos el código crudo no puede decrecer.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{StatusError, StepError};

/// Mayor código crudo admitido. `500..=599` se clasifican como `error`.
pub const MAX_STATUS_CODE: u16 = 599;

/// Fase canónica de un Step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    /// Creado y sin ejecutor asignado.
    #[serde(rename = "pending")]
    Pending,
    /// Asignado a un ejecutor, pendiente de iniciar.
    #[serde(rename = "assigned")]
    Assigned,
    /// La ejecución comenzó.
    #[serde(rename = "in progress")]
    InProgress,
    /// Terminó correctamente.
    #[serde(rename = "done")]
    Done,
    /// Pausado por un problema resoluble; puede reanudarse.
    #[serde(rename = "blocked")]
    Blocked,
    /// Terminó en un estado imprevisto e irrecuperable.
    #[serde(rename = "error")]
    Error,
}

impl StepStatus {
    pub const ALL: [StepStatus; 6] = [StepStatus::Pending,
                                      StepStatus::Assigned,
                                      StepStatus::InProgress,
                                      StepStatus::Done,
                                      StepStatus::Blocked,
                                      StepStatus::Error];

    pub const fn value(self) -> u16 {
        match self {
            StepStatus::Pending => 0,
            StepStatus::Assigned => 100,
            StepStatus::InProgress => 200,
            StepStatus::Done => 300,
            StepStatus::Blocked => 400,
            StepStatus::Error => 500,
        }
    }

    pub const fn code(self) -> StatusCode {
        StatusCode(self.value())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Assigned => "assigned",
            StepStatus::InProgress => "in progress",
            StepStatus::Done => "done",
            StepStatus::Blocked => "blocked",
            StepStatus::Error => "error",
        }
    }

    /// Redondea hacia abajo al ancla más cercana (`250` -> `InProgress`).
    /// Valores negativos o mayores a `MAX_STATUS_CODE` se rechazan.
    pub fn classify(raw: i64) -> Result<StepStatus, StatusError> {
        StatusCode::new(raw).map(StatusCode::phase)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Done | StepStatus::Error)
    }

    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Código de estado crudo: un ancla o un valor intermedio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct StatusCode(u16);

impl StatusCode {
    pub const PENDING: StatusCode = StepStatus::Pending.code();
    pub const ASSIGNED: StatusCode = StepStatus::Assigned.code();
    pub const IN_PROGRESS: StatusCode = StepStatus::InProgress.code();
    pub const DONE: StatusCode = StepStatus::Done.code();
    pub const BLOCKED: StatusCode = StepStatus::Blocked.code();
    pub const ERROR: StatusCode = StepStatus::Error.code();

    pub fn new(raw: i64) -> Result<Self, StatusError> {
        if raw < 0 {
            return Err(StatusError::Negative(raw));
        }
        if raw > i64::from(MAX_STATUS_CODE) {
            return Err(StatusError::OutOfRange(raw));
        }
        Ok(Self(raw as u16))
    }

    /// Código intermedio `offset` unidades por encima de `anchor`. Falla si se
    /// sale del espacio admitido.
    pub fn within(anchor: StepStatus, offset: u16) -> Result<Self, StatusError> {
        Self::new(i64::from(anchor.value()) + i64::from(offset))
    }

    pub const fn value(self) -> u16 {
        self.0
    }

    pub const fn phase(self) -> StepStatus {
        match self.0 {
            0..=99 => StepStatus::Pending,
            100..=199 => StepStatus::Assigned,
            200..=299 => StepStatus::InProgress,
            300..=399 => StepStatus::Done,
            400..=499 => StepStatus::Blocked,
            _ => StepStatus::Error,
        }
    }

    pub const fn is_anchor(self) -> bool {
        self.0 % 100 == 0
    }

    pub const fn is_terminal(self) -> bool {
        self.phase().is_terminal()
    }
}

impl From<StepStatus> for StatusCode {
    fn from(status: StepStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i64> for StatusCode {
    type Error = StatusError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<StatusCode> for i64 {
    fn from(code: StatusCode) -> Self {
        i64::from(code.0)
    }
}

impl PartialEq<StepStatus> for StatusCode {
    fn eq(&self, other: &StepStatus) -> bool {
        self.0 == other.value()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anchor() {
            write!(f, "{} ({})", self.0, self.phase())
        } else {
            write!(f, "{} (~{})", self.0, self.phase())
        }
    }
}

/// Valida una transición `from -> to`.
///
/// `Ok(true)` si hay transición, `Ok(false)` si `to == from` (no-op, no se
/// emite evento).
pub fn check_transition(from: StatusCode, to: StatusCode) -> Result<bool, StepError> {
    if from == to {
        return Ok(false);
    }
    let phase = from.phase();
    if phase.is_terminal() {
        return Err(StepError::StepAlreadyTerminal { status: from });
    }
    if phase == StepStatus::Blocked || to > from {
        return Ok(true);
    }
    Err(StepError::StatusRegression { from, to })
}
