//! Runtime configuration compiled from the YAML form.

use super::types::{Config, IntakeConfig, TimingsConfig};
use crate::severity::SeverityTable;

/// Configuration in the shape the engine consumes.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub timings: TimingsConfig,
    pub severities: SeverityTable,
    pub intake: IntakeConfig,
    /// Markup template source.
    pub markup_template: String,
    pub reminder_class: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Config::default().compile()
    }
}

impl Config {
    /// Compile configuration into runtime-ready format.
    ///
    /// Expects a configuration that passed [`Config::validate`].
    pub fn compile(self) -> RuntimeConfig {
        let mut severities =
            SeverityTable::new(self.severities.default_rank, self.severities.unknown);
        for (name, rank) in &self.severities.custom {
            severities.register(name, *rank);
        }

        RuntimeConfig {
            timings: self.timings,
            severities,
            intake: self.intake,
            markup_template: self.markup.template_source().to_string(),
            reminder_class: self.markup.reminder_class,
        }
    }
}
