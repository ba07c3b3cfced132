//! stepflow
//!
//! Shell de aplicación alrededor de los crates de steps:
//! - `config`: carga de variables de entorno (`.env` incluido).
//! - `errors`: error de la aplicación (`AppError`).
//!
//! El contrato (`Step`, estados, eventos, opciones) vive en `step-core` y las
//! variantes concretas en `step-adapters`.

pub mod config;
pub mod errors;
