//! alertbox - transient UI notifications with deduplication, severity
//! ordering and timed dismissal.
//!
//! The synchronous core is [`AlertManager`]; [`AlertService`] runs it on a
//! tokio task. Rendering targets any [`Surface`]; [`MemorySurface`] is the
//! in-memory implementation used by the CLI and tests.

pub mod cli;
pub mod config;
pub mod delay;
pub mod error;
pub mod holder;
pub mod lifecycle;
pub mod manager;
pub mod markup;
pub mod metrics;
pub mod registry;
pub mod request;
pub mod sanitize;
pub mod scenario;
pub mod schedule;
pub mod service;
pub mod severity;
pub mod sort;
pub mod surface;

// Re-export commonly used types
pub use cli::LogFormat;
pub use config::{Config, RuntimeConfig};
pub use delay::compute_delay;
pub use error::{Anomaly, ConfigError, RequestError, ScenarioError, ServiceError, TemplateError};
pub use holder::{HolderKey, HolderSnapshot, HolderStats};
pub use lifecycle::{Alert, AlertId, AlertState, RemovalReason};
pub use manager::{AlertManager, BatchReport, ItemOutcome, RenderOutcome};
pub use markup::{DEFAULT_ALERT_TEMPLATE, MarkupTemplate};
pub use crate::metrics::{initialize_metrics, register_metric_descriptions};
pub use request::AlertRequest;
pub use sanitize::{HtmlEscaper, Sanitizer};
pub use scenario::{Scenario, ScenarioReport, Step, StepReport};
pub use service::{AlertHandle, AlertService, NavigationEvent, NavigationSignal};
pub use severity::{Severity, SeverityTable, UnknownSeverityPolicy};
pub use sort::sort_batch;
pub use surface::{MemorySurface, Surface, SurfaceEvent};
