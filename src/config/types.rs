//! Core configuration types and loading.

use super::validation::{validate_jinja_template, validate_severity_name};
use crate::error::ConfigError;
use crate::markup::DEFAULT_ALERT_TEMPLATE;
use crate::severity::{DEFAULT_SEVERITY_RANK, UnknownSeverityPolicy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default class applied to an alert when a duplicate reinforces it.
pub const DEFAULT_REMINDER_CLASS: &str = "alert-reminder";

/// Main configuration structure for alertbox. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Fade and auto-dismiss timings.
    #[serde(default)]
    pub timings: TimingsConfig,
    /// Severity ranks and unknown-type policy.
    #[serde(default)]
    pub severities: SeveritiesConfig,
    /// Request admission rules.
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Markup handed to the rendering surface.
    #[serde(default)]
    pub markup: MarkupConfig,
}

/// Fade and auto-dismiss timings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingsConfig {
    #[serde(default = "default_fade_in", with = "humantime_serde")]
    pub fade_in: Duration,
    #[serde(default = "default_fade_out", with = "humantime_serde")]
    pub fade_out: Duration,
    /// Base time a non-error alert stays visible.
    #[serde(default = "default_init_delay", with = "humantime_serde")]
    pub init_delay: Duration,
    /// Extra time per visible non-error alert in the same holder.
    #[serde(default = "default_additional_delay", with = "humantime_serde")]
    pub additional_delay_per_alert: Duration,
}

fn default_fade_in() -> Duration {
    Duration::from_millis(150)
}

fn default_fade_out() -> Duration {
    Duration::from_millis(250)
}

fn default_init_delay() -> Duration {
    Duration::from_millis(3000)
}

fn default_additional_delay() -> Duration {
    Duration::from_millis(2000)
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            fade_in: default_fade_in(),
            fade_out: default_fade_out(),
            init_delay: default_init_delay(),
            additional_delay_per_alert: default_additional_delay(),
        }
    }
}

/// Severity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeveritiesConfig {
    /// Rank of custom severities without an explicit rank.
    #[serde(default = "default_rank")]
    pub default_rank: u32,
    /// Policy for custom severities that are not listed in `custom`.
    #[serde(default)]
    pub unknown: UnknownSeverityPolicy,
    /// Custom severities, each with an optional explicit rank.
    #[serde(default = "default_custom_severities")]
    pub custom: BTreeMap<String, Option<u32>>,
}

fn default_rank() -> u32 {
    DEFAULT_SEVERITY_RANK
}

fn default_custom_severities() -> BTreeMap<String, Option<u32>> {
    BTreeMap::from([("warning".to_string(), None)])
}

impl Default for SeveritiesConfig {
    fn default() -> Self {
        Self {
            default_rank: default_rank(),
            unknown: UnknownSeverityPolicy::default(),
            custom: default_custom_severities(),
        }
    }
}

/// Request admission rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Accept empty or whitespace-only messages (rendered as blank alerts).
    #[serde(default)]
    pub allow_empty_message: bool,
}

/// Markup configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkupConfig {
    /// minijinja source for one alert; the built-in template when unset.
    #[serde(default)]
    pub template: Option<String>,
    /// Transient class applied on reinforcement.
    #[serde(default = "default_reminder_class")]
    pub reminder_class: String,
}

fn default_reminder_class() -> String {
    DEFAULT_REMINDER_CLASS.to_string()
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            template: None,
            reminder_class: default_reminder_class(),
        }
    }
}

impl MarkupConfig {
    /// Template source in effect.
    pub fn template_source(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_ALERT_TEMPLATE)
    }
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// # Errors
    /// Returns [`ConfigError::LoadError`] if the file cannot be read.
    /// Returns [`ConfigError::ValidationError`] if the YAML is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text. An empty document yields defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::ValidationError`] if the YAML is invalid.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Validate the whole configuration.
    ///
    /// # Errors
    /// Returns a `Vec<ConfigError>` containing all validation errors found.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.timings.init_delay.is_zero() {
            errors.push(ConfigError::ValidationError(
                "timings.init_delay must be greater than zero".to_string(),
            ));
        }

        if self.severities.default_rank == 0 {
            errors.push(ConfigError::ValidationError(
                "severities.default_rank must be at least 1".to_string(),
            ));
        }

        for (name, rank) in &self.severities.custom {
            if let Err(message) = validate_severity_name(name) {
                errors.push(ConfigError::InvalidSeverity {
                    name: name.clone(),
                    message,
                });
            }
            if *rank == Some(0) {
                errors.push(ConfigError::InvalidSeverity {
                    name: name.clone(),
                    message: "rank must be at least 1".to_string(),
                });
            }
        }

        if let Some(template) = &self.markup.template
            && let Err(message) = validate_jinja_template(template)
        {
            errors.push(ConfigError::InvalidTemplate { message });
        }

        if self.markup.reminder_class.trim().is_empty() {
            errors.push(ConfigError::ValidationError(
                "markup.reminder_class cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
