//! Centralized error types for alertbox using thiserror.
//!
//! Failures that callers must handle are returned as `Result`s. Conditions
//! the engine recovers from on its own are modelled as [`Anomaly`] values:
//! they are logged and counted, never propagated.

use thiserror::Error;

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("invalid severity '{name}': {message}")]
    InvalidSeverity { name: String, message: String },
    #[error("invalid markup template: {message}")]
    InvalidTemplate { message: String },
}

/// Errors raised while admitting a single alert request.
///
/// A rejected request never affects the other requests of the same batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("alert message is empty")]
    EmptyMessage,
    #[error("unknown severity '{0}'")]
    UnknownSeverity(String),
    #[error("invalid severity name '{0}'")]
    InvalidSeverity(String),
    #[error("markup error: {0}")]
    Markup(#[from] TemplateError),
}

impl RequestError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "empty_message",
            Self::UnknownSeverity(_) => "unknown_severity",
            Self::InvalidSeverity(_) => "invalid_severity",
            Self::Markup(_) => "markup",
        }
    }
}

/// Errors related to alert markup rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("template render failed: {message}")]
    RenderFailed { message: String },
}

/// Errors related to talking to a running alert service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("alert service closed")]
    Closed,
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Errors related to loading and running a demo scenario.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to load scenario: {0}")]
    Load(String),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("alert service task failed: {0}")]
    Task(String),
}

/// Recoverable irregularities detected by the engine.
///
/// These are surfaced through `tracing::warn!` and the
/// `alertbox_anomalies_total` counter, then corrected locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    #[error("multiple alert containers found in target '{target}' ({found}), using the first")]
    AmbiguousContainers { target: String, found: usize },
    #[error("holder '{holder}' {field} drifted: tracked {expected}, live {actual}")]
    CounterDrift {
        holder: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("error count {error_count} exceeds visible count {count}")]
    NegativeVisibleCount { count: usize, error_count: usize },
}

impl Anomaly {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AmbiguousContainers { .. } => "ambiguous_containers",
            Self::CounterDrift { .. } => "counter_drift",
            Self::NegativeVisibleCount { .. } => "negative_visible_count",
        }
    }

    /// Log the anomaly and count it.
    pub fn report(&self) {
        tracing::warn!(kind = self.kind(), "{}", self);
        metrics::counter!("alertbox_anomalies_total", "kind" => self.kind()).increment(1);
    }
}
