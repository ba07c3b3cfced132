//! Configuración de la aplicación.
//! Carga variables de entorno (.env una sola vez) y expone `AppConfig`.
//!
//! Variables:
//! - `STEPFLOW_LOG`: nivel de log (`off`, `error`, `warn`, `info`, `debug`, `trace`).
//! - `STEPFLOW_DEMO_ITEMS`: ítems separados por coma para el step automatizado.
//! - `STEPFLOW_DEMO_APPROVER`: quién aprueba la compuerta humana de la demo.
//! - `STEPFLOW_DEMO_AUTO_APPROVE`: si la demo aprueba sola la compuerta.
use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use log::LevelFilter;
use once_cell::sync::Lazy;

use crate::errors::AppError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: LevelFilter,
    pub demo: DemoConfig,
}

/// Parámetros de la demo (`stepflow-demo`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub items: Vec<String>,
    pub approver: String,
    pub auto_approve: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { log_level: LevelFilter::Info,
               demo: DemoConfig { items: vec!["fetch".into(), "transform".into(), "load".into()],
                                  approver: "reviewer".into(),
                                  auto_approve: true } }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        init_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda
    /// (permite testear sin tocar el entorno del proceso).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let mut cfg = Self::default();
        if let Some(level) = lookup("STEPFLOW_LOG") {
            cfg.log_level = LevelFilter::from_str(level.trim())
                .map_err(|_| AppError::Config(format!("STEPFLOW_LOG inválido: '{level}'")))?;
        }
        if let Some(items) = lookup("STEPFLOW_DEMO_ITEMS") {
            cfg.demo.items = items.split(',')
                                  .map(str::trim)
                                  .filter(|s| !s.is_empty())
                                  .map(str::to_string)
                                  .collect();
            if cfg.demo.items.is_empty() {
                return Err(AppError::Config("STEPFLOW_DEMO_ITEMS no puede estar vacío".into()));
            }
        }
        if let Some(approver) = lookup("STEPFLOW_DEMO_APPROVER") {
            let approver = approver.trim();
            if approver.is_empty() {
                return Err(AppError::Config("STEPFLOW_DEMO_APPROVER no puede estar vacío".into()));
            }
            cfg.demo.approver = approver.to_string();
        }
        if let Some(flag) = lookup("STEPFLOW_DEMO_AUTO_APPROVE") {
            cfg.demo.auto_approve = parse_bool(&flag)
                .ok_or_else(|| AppError::Config(format!("STEPFLOW_DEMO_AUTO_APPROVE inválido: '{flag}'")))?;
        }
        Ok(cfg)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
