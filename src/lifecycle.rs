//! Live alerts and their lifecycle states.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::holder::HolderId;
use crate::schedule::{Subscription, TimerHandle};
use crate::severity::Severity;
use crate::surface::ViewHandle;

/// Identifier of an alert, issued in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alert-{}", self.0)
    }
}

/// Lifecycle state of an alert.
///
/// ```text
/// Requested -> Visible -> TimerPending ------> Removed
///                     \-> AwaitingNavigation -> Removed
/// ```
///
/// Reinforcement moves a live alert between `TimerPending` and
/// `AwaitingNavigation` in place. `Removed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Requested,
    Visible,
    TimerPending,
    AwaitingNavigation,
    Removed,
}

/// Why an alert was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Timer,
    Navigation,
    Cleared,
    Stamp,
    Dismissed,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Navigation => "navigation",
            Self::Cleared => "cleared",
            Self::Stamp => "stamp",
            Self::Dismissed => "dismissed",
        }
    }
}

/// A live notification owned by one holder.
#[derive(Debug, Clone)]
pub struct Alert {
    pub(crate) id: AlertId,
    pub(crate) stamp: Option<String>,
    pub(crate) severity: Severity,
    /// Sanitized message text, compared by the dedup matcher.
    pub(crate) text: String,
    pub(crate) holder: HolderId,
    pub(crate) frozen: bool,
    pub(crate) created_at: Instant,
    pub(crate) view: ViewHandle,
    pub(crate) timer: Option<TimerHandle>,
    pub(crate) subscription: Option<Subscription>,
    pub(crate) state: AlertState,
    pub(crate) reinforcements: u32,
}

impl Alert {
    pub fn id(&self) -> AlertId {
        self.id
    }

    pub fn stamp(&self) -> Option<&str> {
        self.stamp.as_deref()
    }

    pub fn severity(&self) -> &Severity {
        &self.severity
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn holder(&self) -> HolderId {
        self.holder
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time since creation, measured on the caller's clock.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    pub fn view(&self) -> ViewHandle {
        self.view
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    /// Number of times a duplicate request reinforced this alert.
    pub fn reinforcements(&self) -> u32 {
        self.reinforcements
    }

    /// Frozen and error alerts never auto-dismiss on a timer.
    pub fn is_timer_exempt(&self) -> bool {
        self.frozen || self.severity.is_error()
    }
}
