//! Macros para reducir el boilerplate de los Steps concretos.
//!
//! Uso:
//! ```ignore
//! use step_core::{delegate_lifecycle, lifecycle_host};
//!
//! lifecycle_host!(MyStep => lifecycle);
//!
//! impl Step for MyStep {
//!     delegate_lifecycle!();
//!     // id, kind, get_options, set_options, options_value, run ...
//! }
//! ```

/// Implementa `LifecycleHost` para un tipo que guarda su `StepLifecycle` en
/// el campo indicado.
#[macro_export]
macro_rules! lifecycle_host {
    ($ty:ty => $field:ident) => {
        impl $crate::step::LifecycleHost for $ty {
            fn lifecycle(&self) -> &$crate::step::StepLifecycle {
                &self.$field
            }
            fn lifecycle_mut(&mut self) -> &mut $crate::step::StepLifecycle {
                &mut self.$field
            }
        }
    };
}

/// Dentro de `impl Step for T`: delega `instance_id`, `status` y `on` al
/// `StepLifecycle` (requiere `lifecycle_host!` para `T`).
#[macro_export]
macro_rules! delegate_lifecycle {
    () => {
        fn instance_id(&self) -> $crate::Uuid {
            $crate::step::LifecycleHost::lifecycle(self).instance_id()
        }
        fn status(&self) -> $crate::step::StatusCode {
            $crate::step::LifecycleHost::lifecycle(self).status()
        }
        fn on(&mut self, event: $crate::event::StepEventName, handler: $crate::event::StepEventHandler) {
            $crate::step::LifecycleHost::lifecycle_mut(self).on(event, handler)
        }
    };
}
