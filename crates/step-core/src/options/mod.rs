//! Contrato de opciones (configuración) de un Step.
//!
//! - `OptionsSchema`: colaborador de schema (formulario + validación).
//! - `OptionsSlot`: opciones tipadas que un Step posee en exclusiva; sólo se
//!   reemplazan tras validar y decodificar con éxito.

mod schema;
mod slot;

pub use schema::OptionsSchema;
pub use slot::OptionsSlot;
