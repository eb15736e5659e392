//! Module Harness Core API Interface

mod check_module;
mod prepare_module;
pub use check_module::{check_module, ModuleCheckReport};
pub use prepare_module::{default_module_dir, prepare_module};
