//! Cancellable one-shot timers and one-shot navigation subscriptions.
//!
//! Both are plain data structures driven by the caller: timers are fired by
//! [`TimerQueue::pop_due`] with an explicit `now`, subscriptions by
//! [`NavigationWatch::fire`]. Cancelling a handle that already fired or was
//! already cancelled is a no-op.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use crate::lifecycle::AlertId;

/// Handle to an armed removal timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Deadline-ordered set of one-shot timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    by_deadline: BTreeMap<(Instant, u64), AlertId>,
    deadlines: HashMap<u64, Instant>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, deadline: Instant, alert: AlertId) -> TimerHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.by_deadline.insert((deadline, id), alert);
        self.deadlines.insert(id, deadline);
        tracing::trace!(timer = id, alert_id = %alert, "Timer armed");
        TimerHandle(id)
    }

    /// Cancel a timer. Returns `false` if it was not pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => {
                self.by_deadline.remove(&(deadline, handle.0));
                tracing::trace!(timer = handle.0, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn deadline(&self, handle: TimerHandle) -> Option<Instant> {
        self.deadlines.get(&handle.0).copied()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.by_deadline.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<(TimerHandle, AlertId)> {
        let mut due = Vec::new();
        while let Some(entry) = self.by_deadline.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, id), alert) = entry.remove_entry();
            self.deadlines.remove(&id);
            due.push((TimerHandle(id), alert));
        }
        due
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

/// Handle to a navigation subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// One-shot subscriptions to the host's navigation-changed signal.
#[derive(Debug, Default)]
pub struct NavigationWatch {
    next_id: u64,
    subscribers: BTreeMap<u64, AlertId>,
}

impl NavigationWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_once(&mut self, alert: AlertId) -> Subscription {
        self.next_id += 1;
        self.subscribers.insert(self.next_id, alert);
        Subscription(self.next_id)
    }

    /// Cancel a subscription. Returns `false` if it was not attached.
    pub fn cancel(&mut self, subscription: Subscription) -> bool {
        self.subscribers.remove(&subscription.0).is_some()
    }

    pub fn is_attached(&self, subscription: Subscription) -> bool {
        self.subscribers.contains_key(&subscription.0)
    }

    /// Deliver one navigation change: every attached subscription fires
    /// once and is detached.
    pub fn fire(&mut self) -> Vec<(Subscription, AlertId)> {
        std::mem::take(&mut self.subscribers)
            .into_iter()
            .map(|(id, alert)| (Subscription(id), alert))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
