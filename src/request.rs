//! Alert requests submitted to the engine.

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// A request to show one alert. Immutable once submitted.
///
/// The serde form matches the batch entries accepted by scenario files:
///
/// ```yaml
/// - { type: error, message: "Disk full", target: "#sidebar", freeze: true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    #[serde(rename = "type")]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
    /// Holder target; `None` uses the default holder.
    #[serde(default)]
    pub target: Option<String>,
    /// Exempt from timed removal; removed on navigation instead.
    #[serde(default)]
    pub freeze: bool,
    /// Skip deduplication against visible alerts.
    #[serde(default, rename = "allowMultiple", alias = "allow_multiple")]
    pub allow_multiple: bool,
    #[serde(default)]
    pub stamp: Option<String>,
}

impl AlertRequest {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            target: None,
            freeze: false,
            allow_multiple: false,
            stamp: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn freeze(mut self) -> Self {
        self.freeze = true;
        self
    }

    pub fn allow_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    pub fn stamp(mut self, stamp: impl Into<String>) -> Self {
        self.stamp = Some(stamp.into());
        self
    }
}
