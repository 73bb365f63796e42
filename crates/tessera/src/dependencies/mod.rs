//! The ES-module dependency family and its templates.

mod esm_compat;
mod esm_import;
mod esm_init;
mod esm_side_effect;

pub use esm_compat::{EsmCompatibilityDependency, EsmCompatibilityTemplate};
pub use esm_import::{EsmImportDependency, EsmImportTemplate};
pub use esm_init::{EsmInitDependency, EsmInitTemplate};
pub use esm_side_effect::{EsmImportSideEffectDependency, EsmImportSideEffectTemplate};
