//! Catalog configuration
//!
//! Loading and validation of catalog files: game content (packets, roles,
//! penalties, backgrounds, timing) and the session-code word list.

pub mod loader;
pub mod validation;

pub use interrogation_core::config::*;
pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use validation::{ValidationResult, Validator};
