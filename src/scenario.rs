//! Scripted demo scenarios.
//!
//! A scenario is a YAML list of steps replayed against an [`AlertService`]
//! backed by a [`MemorySurface`]:
//!
//! ```yaml
//! steps:
//!   - render:
//!       - { type: error, message: "Upload failed" }
//!   - wait: 2s
//!   - navigate
//!   - stats: {}
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::RuntimeConfig;
use crate::error::ScenarioError;
use crate::holder::HolderSnapshot;
use crate::lifecycle::AlertId;
use crate::manager::{AlertManager, RenderOutcome};
use crate::request::AlertRequest;
use crate::service::{AlertHandle, AlertService, NavigationEvent, NavigationSignal};
use crate::surface::{MemorySurface, SurfaceEvent};

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Render a batch of requests.
    Render(Vec<AlertRequest>),
    Wait(#[serde(with = "humantime_serde")] Duration),
    Navigate,
    ClearAll {
        #[serde(default)]
        target: Option<String>,
    },
    ClearStamp(String),
    /// Dismiss an alert by its numeric id.
    Dismiss(u64),
    Stats {
        #[serde(default)]
        target: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScenarioError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ScenarioError> {
        serde_yaml::from_str(content).map_err(|e| ScenarioError::Load(e.to_string()))
    }
}

/// Outcome of one batch entry, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedItem {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RenderOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepReport {
    Render { items: Vec<RenderedItem> },
    Wait { waited_ms: u64 },
    Navigate { services: usize },
    ClearAll { target: Option<String>, removed: usize },
    ClearStamp { stamp: String, removed: usize },
    Dismiss { alert: AlertId, removed: bool },
    Stats { target: Option<String>, count: usize, error_count: usize },
}

/// Full result of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepReport>,
    /// `false` when the run was cancelled before the last step.
    pub completed: bool,
    pub holders: Vec<HolderSnapshot>,
    /// Markup left in each container, keyed by holder.
    pub surface: Vec<(String, Vec<String>)>,
    pub events: Vec<SurfaceEvent>,
}

/// Replay `steps` through `handle`, publishing navigation on `signal`.
pub async fn run_steps(
    steps: &[Step],
    handle: &AlertHandle,
    signal: &NavigationSignal,
) -> Result<Vec<StepReport>, ScenarioError> {
    let mut reports = Vec::with_capacity(steps.len());

    for (n, step) in steps.iter().enumerate() {
        tracing::debug!(step = n, ?step, "Running scenario step");
        let report = match step {
            Step::Render(requests) => {
                let batch = handle.render_batch(requests.clone()).await?;
                let items = batch
                    .outcomes
                    .into_iter()
                    .map(|o| match o.result {
                        Ok(outcome) => RenderedItem {
                            index: o.index,
                            outcome: Some(outcome),
                            error: None,
                        },
                        Err(e) => RenderedItem {
                            index: o.index,
                            outcome: None,
                            error: Some(e.to_string()),
                        },
                    })
                    .collect();
                StepReport::Render { items }
            }
            Step::Wait(duration) => {
                tokio::time::sleep(*duration).await;
                StepReport::Wait {
                    waited_ms: duration.as_millis() as u64,
                }
            }
            Step::Navigate => StepReport::Navigate {
                services: signal.navigate(NavigationEvent::default()),
            },
            Step::ClearAll { target } => StepReport::ClearAll {
                target: target.clone(),
                removed: handle.clear_all(target.as_deref()).await?,
            },
            Step::ClearStamp(stamp) => StepReport::ClearStamp {
                stamp: stamp.clone(),
                removed: handle.clear_by_stamp(stamp).await?,
            },
            Step::Dismiss(id) => StepReport::Dismiss {
                alert: AlertId(*id),
                removed: handle.dismiss(AlertId(*id)).await?,
            },
            Step::Stats { target } => {
                let stats = handle.stats(target.as_deref()).await?;
                StepReport::Stats {
                    target: target.clone(),
                    count: stats.count,
                    error_count: stats.error_count,
                }
            }
        };
        reports.push(report);
    }

    Ok(reports)
}

/// Run a scenario on a fresh service over a [`MemorySurface`].
///
/// Stops early when `cancel` fires; the report then covers the steps
/// that completed.
pub async fn execute(
    config: RuntimeConfig,
    scenario: &Scenario,
    cancel: CancellationToken,
) -> Result<ScenarioReport, ScenarioError> {
    let signal = NavigationSignal::default();
    let manager = AlertManager::new(config, MemorySurface::new());
    let (service, handle) = AlertService::new(manager, &signal);

    let service_cancel = cancel.child_token();
    let task = tokio::spawn(service.run(service_cancel.clone()));

    tracing::info!(steps = scenario.steps.len(), "Scenario started");
    let steps = tokio::select! {
        result = run_steps(&scenario.steps, &handle, &signal) => Some(result),
        _ = cancel.cancelled() => None,
    };

    service_cancel.cancel();
    let manager = task
        .await
        .map_err(|e| ScenarioError::Task(e.to_string()))?;

    let (steps, completed) = match steps {
        Some(result) => (result?, true),
        None => {
            tracing::info!("Scenario cancelled");
            (Vec::new(), false)
        }
    };

    let holders = manager.holders();
    let surface = manager.into_surface();
    tracing::info!(steps = steps.len(), completed, "Scenario finished");

    Ok(ScenarioReport {
        steps,
        completed,
        holders,
        surface: surface.snapshot(),
        events: surface.events().to_vec(),
    })
}
