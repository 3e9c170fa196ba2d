//! Alert severities and the rank table used to order batches.
//!
//! The three built-in severities have fixed ranks (error=1, info=2,
//! success=3). Anything else is a [`Severity::Custom`] that must either be
//! registered in the [`SeverityTable`] or be let through by the
//! [`UnknownSeverityPolicy`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Rank used for severities without an explicit rank.
pub const DEFAULT_SEVERITY_RANK: u32 = 10;

/// Severity category of an alert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Severity {
    Error,
    Info,
    Success,
    /// Any other category, stored lowercase.
    Custom(String),
}

impl Severity {
    /// Lowercase name of the severity.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::Success => "success",
            Self::Custom(name) => name,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Class suffix used by the markup (`alert-<class>`).
    pub fn css_class(&self) -> &str {
        match self {
            Self::Error => "danger",
            other => other.as_str(),
        }
    }

    /// Rank of built-in severities, `None` for custom ones.
    fn builtin_rank(&self) -> Option<u32> {
        match self {
            Self::Error => Some(1),
            Self::Info => Some(2),
            Self::Success => Some(3),
            Self::Custom(_) => None,
        }
    }
}

impl FromStr for Severity {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(RequestError::InvalidSeverity(s.to_string()));
        }
        Ok(match name.as_str() {
            "error" => Self::Error,
            "info" => Self::Info,
            "success" => Self::Success,
            _ => Self::Custom(name),
        })
    }
}

impl TryFrom<String> for Severity {
    type Error = RequestError;

    fn try_from(value: String) -> Result<Self, RequestError> {
        value.parse()
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a custom severity that is not registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownSeverityPolicy {
    /// Reject the request with [`RequestError::UnknownSeverity`].
    #[default]
    Reject,
    /// Keep it as a custom severity with the default rank.
    Accept,
}

/// Rank table for batch ordering and intake admission.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityTable {
    custom: BTreeMap<String, Option<u32>>,
    default_rank: u32,
    policy: UnknownSeverityPolicy,
}

impl Default for SeverityTable {
    fn default() -> Self {
        let mut custom = BTreeMap::new();
        custom.insert("warning".to_string(), None);
        Self {
            custom,
            default_rank: DEFAULT_SEVERITY_RANK,
            policy: UnknownSeverityPolicy::default(),
        }
    }
}

impl SeverityTable {
    /// Create a table with no custom severities.
    pub fn new(default_rank: u32, policy: UnknownSeverityPolicy) -> Self {
        Self {
            custom: BTreeMap::new(),
            default_rank,
            policy,
        }
    }

    /// Register a custom severity, optionally with its own rank.
    pub fn register(&mut self, name: &str, rank: Option<u32>) {
        self.custom.insert(name.to_ascii_lowercase(), rank);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: &str, rank: Option<u32>) -> Self {
        self.register(name, rank);
        self
    }

    pub fn default_rank(&self) -> u32 {
        self.default_rank
    }

    pub fn policy(&self) -> UnknownSeverityPolicy {
        self.policy
    }

    /// Registered custom severity names.
    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }

    pub fn is_registered(&self, severity: &Severity) -> bool {
        match severity {
            Severity::Custom(name) => self.custom.contains_key(name),
            _ => true,
        }
    }

    /// Sort rank of a severity. Lower ranks are dispatched first.
    pub fn rank(&self, severity: &Severity) -> u32 {
        if let Some(rank) = severity.builtin_rank() {
            return rank;
        }
        self.custom
            .get(severity.as_str())
            .copied()
            .flatten()
            .unwrap_or(self.default_rank)
    }

    /// Check a severity at intake against the table and policy.
    pub fn admit(&self, severity: &Severity) -> Result<(), RequestError> {
        if self.is_registered(severity) {
            return Ok(());
        }
        match self.policy {
            UnknownSeverityPolicy::Reject => {
                Err(RequestError::UnknownSeverity(severity.as_str().to_string()))
            }
            UnknownSeverityPolicy::Accept => {
                tracing::debug!(severity = %severity, "Accepting unregistered severity with default rank");
                Ok(())
            }
        }
    }
}
