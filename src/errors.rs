use step_core::StepError;
use thiserror::Error;

/// Errores de la aplicación (shell alrededor de los crates de steps).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de step: {0}")]
    Step(#[from] StepError),
    #[error("Error de serialización: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
}
