//! Configuration loading and validation for alertbox.
//!
//! This module handles loading the optional YAML configuration file,
//! validating it, and compiling it into the [`RuntimeConfig`] the engine
//! consumes.

mod runtime;
mod types;
mod validation;

pub use runtime::RuntimeConfig;
pub use types::{
    Config, DEFAULT_REMINDER_CLASS, IntakeConfig, MarkupConfig, SeveritiesConfig, TimingsConfig,
};
