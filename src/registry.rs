//! Registry of live alerts and their holders.
//!
//! The registry owns every live [`Alert`] and every [`Holder`]. Holder
//! counters are bumped on registration and recomputed from the live set
//! on every removal.

use std::collections::{BTreeMap, HashMap};

use crate::holder::{Holder, HolderId, HolderStats};
use crate::lifecycle::{Alert, AlertId};
use crate::severity::Severity;

#[derive(Debug, Default)]
pub struct AlertRegistry {
    holders: HashMap<HolderId, Holder>,
    alerts: BTreeMap<AlertId, Alert>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_holder(&mut self, holder: Holder) {
        self.holders.insert(holder.id(), holder);
    }

    pub fn holder(&self, id: HolderId) -> Option<&Holder> {
        self.holders.get(&id)
    }

    pub(crate) fn holder_mut(&mut self, id: HolderId) -> Option<&mut Holder> {
        self.holders.get_mut(&id)
    }

    /// Holders ordered by creation.
    pub fn holders(&self) -> Vec<&Holder> {
        let mut holders: Vec<&Holder> = self.holders.values().collect();
        holders.sort_by_key(|h| h.id());
        holders
    }

    pub fn alert(&self, id: AlertId) -> Option<&Alert> {
        self.alerts.get(&id)
    }

    pub(crate) fn alert_mut(&mut self, id: AlertId) -> Option<&mut Alert> {
        self.alerts.get_mut(&id)
    }

    /// Live alerts in creation order.
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.values()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Add a live alert and count it in its holder.
    pub(crate) fn register(&mut self, alert: Alert) {
        if let Some(holder) = self.holders.get_mut(&alert.holder) {
            holder.record_added(&alert.severity);
        }
        self.alerts.insert(alert.id, alert);
    }

    /// Remove a live alert and resync its holder. `None` if it is not live.
    pub(crate) fn unregister(&mut self, id: AlertId) -> Option<Alert> {
        let alert = self.alerts.remove(&id)?;
        let live = self.live_stats(alert.holder);
        if let Some(holder) = self.holders.get_mut(&alert.holder) {
            holder.resync_after_removal(&alert.severity, live);
        }
        Some(alert)
    }

    /// Counters recomputed from the live alert set of one holder.
    pub fn live_stats(&self, holder: HolderId) -> HolderStats {
        self.alerts
            .values()
            .filter(|a| a.holder == holder)
            .fold(HolderStats::default(), |mut stats, a| {
                stats.count += 1;
                if a.severity.is_error() {
                    stats.error_count += 1;
                }
                stats
            })
    }

    /// Sum of the counters of every holder.
    pub fn total_stats(&self) -> HolderStats {
        self.holders
            .values()
            .map(Holder::stats)
            .fold(HolderStats::default(), |acc, s| acc + s)
    }

    /// First live alert in `holder` with exactly this sanitized text and
    /// severity. Comparison is case- and whitespace-sensitive.
    pub fn find_existing(&self, holder: HolderId, text: &str, severity: &Severity) -> Option<AlertId> {
        self.alerts
            .values()
            .find(|a| a.holder == holder && a.severity == *severity && a.text == text)
            .map(|a| a.id)
    }

    /// Live alerts carrying `stamp`, in creation order.
    pub fn with_stamp(&self, stamp: &str) -> Vec<AlertId> {
        self.alerts
            .values()
            .filter(|a| a.stamp.as_deref() == Some(stamp))
            .map(|a| a.id)
            .collect()
    }

    /// Live alerts in `holder`, in creation order.
    pub fn in_holder(&self, holder: HolderId) -> Vec<AlertId> {
        self.alerts
            .values()
            .filter(|a| a.holder == holder)
            .map(|a| a.id)
            .collect()
    }

    /// Every live alert id, in creation order.
    pub fn ids(&self) -> Vec<AlertId> {
        self.alerts.keys().copied().collect()
    }
}
