//! Holders (alert containers) and their lazy resolution.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::Anomaly;
use crate::registry::AlertRegistry;
use crate::severity::Severity;
use crate::surface::{ContainerId, Surface};

/// Where a holder lives: the default page-wide holder or a named target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HolderKey {
    Default,
    Target(String),
}

impl HolderKey {
    pub fn target(name: impl Into<String>) -> Self {
        Self::Target(name.into())
    }

    pub fn from_target(target: Option<&str>) -> Self {
        match target {
            Some(t) => Self::Target(t.to_string()),
            None => Self::Default,
        }
    }
}

impl fmt::Display for HolderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Target(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HolderId(pub(crate) u64);

/// Aggregate counters of one holder (or of all holders).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HolderStats {
    pub count: usize,
    pub error_count: usize,
}

impl std::ops::Add for HolderStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            count: self.count + rhs.count,
            error_count: self.error_count + rhs.error_count,
        }
    }
}

/// Read-only view of a holder for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderSnapshot {
    pub key: String,
    pub count: usize,
    pub error_count: usize,
    pub last_type: Option<String>,
}

/// A visual scope tracking the alerts registered in it.
#[derive(Debug, Clone)]
pub struct Holder {
    id: HolderId,
    key: HolderKey,
    container: ContainerId,
    stats: HolderStats,
    last_type: Option<Severity>,
}

impl Holder {
    pub(crate) fn new(id: HolderId, key: HolderKey, container: ContainerId) -> Self {
        Self {
            id,
            key,
            container,
            stats: HolderStats::default(),
            last_type: None,
        }
    }

    pub fn id(&self) -> HolderId {
        self.id
    }

    pub fn key(&self) -> &HolderKey {
        &self.key
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn stats(&self) -> HolderStats {
        self.stats
    }

    /// Severity of the last request routed to this holder.
    pub fn last_type(&self) -> Option<&Severity> {
        self.last_type.as_ref()
    }

    pub fn snapshot(&self) -> HolderSnapshot {
        HolderSnapshot {
            key: self.key.to_string(),
            count: self.stats.count,
            error_count: self.stats.error_count,
            last_type: self.last_type.as_ref().map(|s| s.to_string()),
        }
    }

    pub(crate) fn note_request(&mut self, severity: &Severity) {
        self.last_type = Some(severity.clone());
    }

    pub(crate) fn record_added(&mut self, severity: &Severity) {
        self.stats.count += 1;
        if severity.is_error() {
            self.stats.error_count += 1;
        }
    }

    /// Replace the counters with the live values after one removal.
    ///
    /// Any difference from the decremented counters is reported.
    pub(crate) fn resync_after_removal(&mut self, removed: &Severity, live: HolderStats) {
        let expected_count = self.stats.count.saturating_sub(1);
        let expected_errors = if removed.is_error() {
            self.stats.error_count.saturating_sub(1)
        } else {
            self.stats.error_count
        };
        self.resync(expected_count, expected_errors, live);
    }

    pub(crate) fn resync(&mut self, expected_count: usize, expected_errors: usize, live: HolderStats) {
        if expected_count != live.count {
            Anomaly::CounterDrift {
                holder: self.key.to_string(),
                field: "count",
                expected: expected_count,
                actual: live.count,
            }
            .report();
        }
        if expected_errors != live.error_count {
            Anomaly::CounterDrift {
                holder: self.key.to_string(),
                field: "error_count",
                expected: expected_errors,
                actual: live.error_count,
            }
            .report();
        }
        self.stats = live;
    }
}

/// A holder together with the container it renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedHolder {
    pub id: HolderId,
    pub container: ContainerId,
}

/// Resolves holder keys to holders, creating them on first use.
///
/// Each key maps to exactly one holder for the lifetime of the resolver.
#[derive(Debug, Default)]
pub struct HolderResolver {
    by_key: HashMap<HolderKey, ResolvedHolder>,
    next_id: u64,
}

impl HolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holder already resolved for `key`, if any.
    pub fn lookup(&self, key: &HolderKey) -> Option<HolderId> {
        self.by_key.get(key).map(|r| r.id)
    }

    pub fn resolve<S: Surface + ?Sized>(
        &mut self,
        key: &HolderKey,
        surface: &mut S,
        registry: &mut AlertRegistry,
    ) -> ResolvedHolder {
        if let Some(resolved) = self.by_key.get(key) {
            return *resolved;
        }

        let found = surface.find_containers(key);
        let container = match found.as_slice() {
            [] => surface.create_container(key),
            [only] => *only,
            [first, ..] => {
                Anomaly::AmbiguousContainers {
                    target: key.to_string(),
                    found: found.len(),
                }
                .report();
                *first
            }
        };

        self.next_id += 1;
        let id = HolderId(self.next_id);
        registry.insert_holder(Holder::new(id, key.clone(), container));
        let resolved = ResolvedHolder { id, container };
        self.by_key.insert(key.clone(), resolved);
        tracing::debug!(holder = %key, container = container.0, "Holder resolved");
        resolved
    }
}
