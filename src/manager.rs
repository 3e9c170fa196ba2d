//! Alert lifecycle controller.
//!
//! [`AlertManager`] owns the registry, the holder resolver, the timer queue
//! and the navigation watch, and drives every alert through its states:
//!
//! ```text
//! render --> sort --> admit --> dedup?
//!                                 |-- hit  --> reinforce (in place)
//!                                 '-- miss --> markup --> resolve holder --> create --> arm timer | watch navigation
//! ```
//!
//! The manager is synchronous and never reads the clock itself: callers
//! pass `now` to operations that arm timers, and call [`AlertManager::advance`]
//! to fire the ones that are due. [`crate::service::AlertService`] does both
//! on a tokio task.

use std::time::Instant;

use serde::Serialize;

use crate::config::RuntimeConfig;
use crate::delay::compute_delay;
use crate::error::RequestError;
use crate::holder::{
    HolderId, HolderKey, HolderResolver, HolderSnapshot, HolderStats, ResolvedHolder,
};
use crate::lifecycle::{Alert, AlertId, AlertState, RemovalReason};
use crate::markup::{MarkupFields, MarkupTemplate};
use crate::registry::AlertRegistry;
use crate::request::AlertRequest;
use crate::sanitize::{HtmlEscaper, Sanitizer};
use crate::schedule::{NavigationWatch, TimerQueue};
use crate::severity::Severity;
use crate::sort::sort_batch;
use crate::surface::Surface;

/// Result of rendering one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "alert", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// A new alert was created.
    Created(AlertId),
    /// An identical visible alert was reinforced instead.
    Reinforced(AlertId),
}

impl RenderOutcome {
    pub fn alert_id(&self) -> AlertId {
        match self {
            Self::Created(id) | Self::Reinforced(id) => *id,
        }
    }
}

/// Outcome of one batch entry. `index` is its position in the submitted batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub index: usize,
    pub result: Result<RenderOutcome, RequestError>,
}

/// Per-entry outcomes of a batch, in processing (severity) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Alerts created or reinforced, in processing order.
    pub fn alerts(&self) -> Vec<AlertId> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(RenderOutcome::alert_id))
            .collect()
    }

    /// Rejected entries with their original index.
    pub fn rejected(&self) -> Vec<(usize, &RequestError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)))
            .collect()
    }

    /// Outcome of the entry submitted at `index`.
    pub fn get(&self, index: usize) -> Option<&Result<RenderOutcome, RequestError>> {
        self.outcomes.iter().find(|o| o.index == index).map(|o| &o.result)
    }
}

/// The alert lifecycle controller.
pub struct AlertManager<S> {
    config: RuntimeConfig,
    surface: S,
    sanitizer: Box<dyn Sanitizer>,
    markup: MarkupTemplate,
    registry: AlertRegistry,
    resolver: HolderResolver,
    timers: TimerQueue,
    navigation: NavigationWatch,
    next_alert_id: u64,
}

impl<S: Surface> AlertManager<S> {
    pub fn new(config: RuntimeConfig, surface: S) -> Self {
        let markup = MarkupTemplate::new(config.markup_template.clone());
        Self {
            config,
            surface,
            sanitizer: Box::new(HtmlEscaper),
            markup,
            registry: AlertRegistry::new(),
            resolver: HolderResolver::new(),
            timers: TimerQueue::new(),
            navigation: NavigationWatch::new(),
            next_alert_id: 0,
        }
    }

    /// Replace the HTML escaper.
    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn registry(&self) -> &AlertRegistry {
        &self.registry
    }

    pub fn alert(&self, id: AlertId) -> Option<&Alert> {
        self.registry.alert(id)
    }

    /// Current state of an alert. Ids that were issued but are no longer
    /// live report [`AlertState::Removed`].
    pub fn state(&self, id: AlertId) -> Option<AlertState> {
        match self.registry.alert(id) {
            Some(alert) => Some(alert.state),
            None if id.0 >= 1 && id.0 <= self.next_alert_id => Some(AlertState::Removed),
            None => None,
        }
    }

    /// Earliest pending removal timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Render a single request.
    pub fn render(&mut self, request: AlertRequest, now: Instant) -> Result<RenderOutcome, RequestError> {
        let result = self.render_one(&request, now);
        if let Err(e) = &result {
            tracing::debug!(error = %e, severity = %request.severity, "Alert request rejected");
            metrics::counter!("alertbox_requests_rejected_total", "reason" => e.reason())
                .increment(1);
        }
        self.record_visible_gauge();
        result
    }

    /// Render a batch in severity order. Failing entries do not stop the rest.
    pub fn render_batch(&mut self, requests: Vec<AlertRequest>, now: Instant) -> BatchReport {
        let sorted = sort_batch(requests, &self.config.severities);
        tracing::debug!(batch_size = sorted.len(), "Rendering alert batch");

        let outcomes = sorted
            .into_iter()
            .map(|(index, request)| ItemOutcome {
                index,
                result: self.render(request, now),
            })
            .collect();
        BatchReport { outcomes }
    }

    fn render_one(&mut self, request: &AlertRequest, now: Instant) -> Result<RenderOutcome, RequestError> {
        self.config.severities.admit(&request.severity)?;
        if !self.config.intake.allow_empty_message && request.message.trim().is_empty() {
            return Err(RequestError::EmptyMessage);
        }

        let text = self.sanitizer.escape(&request.message);
        let key = HolderKey::from_target(request.target.as_deref());

        // Only an already resolved holder can hold a duplicate.
        if !request.allow_multiple
            && let Some(holder_id) = self.resolver.lookup(&key)
            && let Some(existing) = self
                .registry
                .find_existing(holder_id, &text, &request.severity)
        {
            self.note_request(holder_id, &request.severity);
            self.reinforce(existing, request.freeze, now);
            return Ok(RenderOutcome::Reinforced(existing));
        }

        let markup = self.render_markup(request, &text)?;
        let holder = self
            .resolver
            .resolve(&key, &mut self.surface, &mut self.registry);
        self.note_request(holder.id, &request.severity);

        Ok(RenderOutcome::Created(
            self.create(request, text, &markup, holder, now),
        ))
    }

    fn note_request(&mut self, holder: HolderId, severity: &Severity) {
        if let Some(holder) = self.registry.holder_mut(holder) {
            holder.note_request(severity);
        }
    }

    fn render_markup(&self, request: &AlertRequest, text: &str) -> Result<String, RequestError> {
        let stamp = request.stamp.as_deref().unwrap_or_default();
        let markup = self.markup.render(MarkupFields {
            class: request.severity.css_class(),
            severity: request.severity.as_str(),
            stamp: &self.sanitizer.escape(stamp),
            text,
        })?;
        Ok(markup)
    }

    /// Requested -> Visible, then arm removal.
    fn create(
        &mut self,
        request: &AlertRequest,
        text: String,
        markup: &str,
        holder: ResolvedHolder,
        now: Instant,
    ) -> AlertId {
        self.next_alert_id += 1;
        let id = AlertId(self.next_alert_id);
        let mut alert = Alert {
            id,
            stamp: request.stamp.clone(),
            severity: request.severity.clone(),
            text,
            holder: holder.id,
            frozen: request.freeze,
            created_at: now,
            view: crate::surface::ViewHandle(0),
            timer: None,
            subscription: None,
            state: AlertState::Requested,
            reinforcements: 0,
        };

        alert.view = self
            .surface
            .insert(holder.container, markup, self.config.timings.fade_in);
        alert.state = AlertState::Visible;
        self.registry.register(alert);

        tracing::debug!(
            alert_id = %id,
            severity = %request.severity,
            frozen = request.freeze,
            stamp = ?request.stamp,
            "Alert created"
        );
        metrics::counter!(
            "alertbox_alerts_created_total",
            "severity" => request.severity.as_str().to_string()
        )
        .increment(1);

        self.arm_removal(id, now);
        id
    }

    /// Visible -> TimerPending or AwaitingNavigation, by exemption.
    fn arm_removal(&mut self, id: AlertId, now: Instant) {
        let Some(alert) = self.registry.alert(id) else {
            return;
        };
        let exempt = alert.is_timer_exempt();
        let holder_id = alert.holder;

        if exempt {
            let subscription = self.navigation.subscribe_once(id);
            if let Some(alert) = self.registry.alert_mut(id) {
                alert.subscription = Some(subscription);
                alert.state = AlertState::AwaitingNavigation;
            }
            tracing::debug!(alert_id = %id, "Alert waits for navigation change");
            return;
        }

        let stats = self
            .registry
            .holder(holder_id)
            .map(|h| h.stats())
            .unwrap_or_default();
        let delay = compute_delay(
            stats,
            self.config.timings.init_delay,
            self.config.timings.additional_delay_per_alert,
        );
        let timer = self.timers.arm(now + delay, id);
        if let Some(alert) = self.registry.alert_mut(id) {
            alert.timer = Some(timer);
            alert.state = AlertState::TimerPending;
        }
        tracing::debug!(
            alert_id = %id,
            delay_ms = delay.as_millis() as u64,
            visible = stats.count,
            errors = stats.error_count,
            "Alert removal timer armed"
        );
    }

    /// Reinforce a live alert in place instead of creating a duplicate.
    fn reinforce(&mut self, id: AlertId, freeze: bool, now: Instant) {
        let Some(alert) = self.registry.alert_mut(id) else {
            return;
        };
        let old_timer = alert.timer.take();
        alert.frozen = freeze;
        alert.reinforcements += 1;
        let view = alert.view;
        let exempt = alert.is_timer_exempt();
        let subscription = if exempt { None } else { alert.subscription.take() };
        let watching = alert.subscription.is_some();

        if let Some(timer) = old_timer {
            self.timers.cancel(timer);
        }
        if let Some(subscription) = subscription {
            self.navigation.cancel(subscription);
        }

        self.surface
            .apply_transient_class(view, &self.config.reminder_class);
        metrics::counter!("alertbox_alerts_reinforced_total").increment(1);
        tracing::debug!(alert_id = %id, frozen = freeze, "Alert reinforced");

        if exempt && watching {
            if let Some(alert) = self.registry.alert_mut(id) {
                alert.state = AlertState::AwaitingNavigation;
            }
        } else {
            self.arm_removal(id, now);
        }
    }

    /// Fire every removal timer due at `now`. Returns the number of alerts removed.
    pub fn advance(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        for (timer, id) in self.timers.pop_due(now) {
            let current = self.registry.alert(id).and_then(|a| a.timer);
            if current != Some(timer) {
                tracing::trace!(alert_id = %id, "Stale timer ignored");
                continue;
            }
            if let Some(alert) = self.registry.alert_mut(id) {
                alert.timer = None;
            }
            if self.remove(id, RemovalReason::Timer, Some(now)) {
                removed += 1;
            }
        }
        removed
    }

    /// Deliver a navigation change to every alert waiting for one.
    pub fn navigation_changed(&mut self) -> usize {
        let fired = self.navigation.fire();
        tracing::debug!(subscribers = fired.len(), "Navigation changed");
        let mut removed = 0;
        for (subscription, id) in fired {
            let current = self.registry.alert(id).and_then(|a| a.subscription);
            if current != Some(subscription) {
                continue;
            }
            if let Some(alert) = self.registry.alert_mut(id) {
                alert.subscription = None;
            }
            if self.remove(id, RemovalReason::Navigation, None) {
                removed += 1;
            }
        }
        removed
    }

    /// Remove every alert, or only those in `target`'s holder.
    pub fn clear_all(&mut self, target: Option<&str>) -> usize {
        let ids = match target {
            None => self.registry.ids(),
            Some(t) => match self.resolver.lookup(&HolderKey::target(t)) {
                Some(holder) => self.registry.in_holder(holder),
                None => Vec::new(),
            },
        };
        let removed = ids
            .into_iter()
            .filter(|id| self.remove(*id, RemovalReason::Cleared, None))
            .count();
        tracing::debug!(target = ?target, removed, "Alerts cleared");
        removed
    }

    /// Remove every alert carrying `stamp`.
    pub fn clear_by_stamp(&mut self, stamp: &str) -> usize {
        let removed = self
            .registry
            .with_stamp(stamp)
            .into_iter()
            .filter(|id| self.remove(*id, RemovalReason::Stamp, None))
            .count();
        tracing::debug!(stamp = %stamp, removed, "Alerts cleared by stamp");
        removed
    }

    /// Remove one alert (its close button). `false` if it is not live.
    pub fn dismiss(&mut self, id: AlertId) -> bool {
        self.remove(id, RemovalReason::Dismissed, None)
    }

    /// Counters of `target`'s holder, or of all holders when `None`.
    pub fn stats(&self, target: Option<&str>) -> HolderStats {
        match target {
            None => self.registry.total_stats(),
            Some(t) => self
                .resolver
                .lookup(&HolderKey::target(t))
                .and_then(|id| self.registry.holder(id))
                .map(|h| h.stats())
                .unwrap_or_default(),
        }
    }

    /// Counters of the default holder.
    pub fn default_holder_stats(&self) -> HolderStats {
        self.resolver
            .lookup(&HolderKey::Default)
            .and_then(|id| self.registry.holder(id))
            .map(|h| h.stats())
            .unwrap_or_default()
    }

    pub fn holders(&self) -> Vec<HolderSnapshot> {
        self.registry.holders().into_iter().map(|h| h.snapshot()).collect()
    }

    /// Any live state -> Removed. Removing a removed alert is a no-op.
    ///
    /// `now` is the clock of the operation, when it has one.
    fn remove(&mut self, id: AlertId, reason: RemovalReason, now: Option<Instant>) -> bool {
        let Some(mut alert) = self.registry.unregister(id) else {
            tracing::trace!(alert_id = %id, reason = reason.as_str(), "Alert already removed");
            return false;
        };

        if let Some(timer) = alert.timer.take() {
            self.timers.cancel(timer);
        }
        if let Some(subscription) = alert.subscription.take() {
            self.navigation.cancel(subscription);
        }
        match reason {
            RemovalReason::Timer => self
                .surface
                .fade_out_and_remove(alert.view, self.config.timings.fade_out),
            _ => self.surface.remove(alert.view),
        }
        alert.state = AlertState::Removed;

        let lived_ms = now.map(|now| alert.age(now).as_millis() as u64);
        tracing::debug!(
            alert_id = %id,
            reason = reason.as_str(),
            lived_ms,
            "Alert removed"
        );
        metrics::counter!("alertbox_alerts_removed_total", "reason" => reason.as_str())
            .increment(1);
        self.record_visible_gauge();
        true
    }

    fn record_visible_gauge(&self) {
        metrics::gauge!("alertbox_visible_alerts").set(self.registry.len() as f64);
    }
}

impl<S> std::fmt::Debug for AlertManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertManager")
            .field("alerts", &self.registry.len())
            .field("timers", &self.timers.len())
            .field("navigation_subscribers", &self.navigation.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::severity::Severity;
    use crate::surface::{MemorySurface, SurfaceEvent};
    use std::time::Duration;

    fn manager() -> AlertManager<MemorySurface> {
        AlertManager::new(RuntimeConfig::default(), MemorySurface::new())
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn creates_alert_with_timer() {
        let mut m = manager();
        let now = Instant::now();
        let outcome = m.render(AlertRequest::info("Saved"), now).unwrap();
        let id = outcome.alert_id();

        assert!(matches!(outcome, RenderOutcome::Created(_)));
        assert_eq!(m.state(id), Some(AlertState::TimerPending));
        // one non-error alert visible: 1 * 2000 + 3000
        assert_eq!(m.next_deadline(), Some(now + Duration::from_millis(5000)));
        assert_eq!(m.stats(None), HolderStats { count: 1, error_count: 0 });
    }

    #[test]
    fn timer_removes_with_fade_out() {
        let mut m = manager();
        let now = Instant::now();
        let id = m.render(AlertRequest::info("Saved"), now).unwrap().alert_id();

        assert_eq!(m.advance(now + Duration::from_millis(4999)), 0);
        assert_eq!(m.advance(now + secs(5)), 1);
        assert_eq!(m.state(id), Some(AlertState::Removed));
        assert_eq!(m.stats(None), HolderStats::default());
        assert!(m.surface().events().iter().any(|e| matches!(
            e,
            SurfaceEvent::FadedOut { fade_out_ms: 250, .. }
        )));
    }

    #[test]
    fn error_and_frozen_alerts_get_no_timer() {
        let mut m = manager();
        let now = Instant::now();
        let err = m.render(AlertRequest::error("Boom"), now).unwrap().alert_id();
        let frozen = m
            .render(AlertRequest::info("Pinned").freeze(), now)
            .unwrap()
            .alert_id();

        for id in [err, frozen] {
            let alert = m.alert(id).unwrap();
            assert!(!alert.has_timer());
            assert!(alert.has_subscription());
            assert_eq!(alert.state(), AlertState::AwaitingNavigation);
        }
        assert_eq!(m.next_deadline(), None);
        assert_eq!(m.advance(now + secs(3600)), 0);
        assert_eq!(m.stats(None).count, 2);
    }

    #[test]
    fn duplicate_reinforces_existing_alert() {
        let mut m = manager();
        let now = Instant::now();
        let first = m.render(AlertRequest::info("Saved"), now).unwrap();
        let second = m.render(AlertRequest::info("Saved"), now + secs(2)).unwrap();

        assert_eq!(second, RenderOutcome::Reinforced(first.alert_id()));
        assert_eq!(m.registry().len(), 1);
        assert_eq!(m.alert(first.alert_id()).unwrap().reinforcements(), 1);
        assert!(m.surface().events().contains(&SurfaceEvent::TransientClass {
            view: m.alert(first.alert_id()).unwrap().view(),
            class: "alert-reminder".to_string(),
        }));
        // timer re-armed from the reinforcement time
        assert_eq!(m.next_deadline(), Some(now + secs(2) + secs(5)));
        assert_eq!(m.advance(now + secs(6)), 0);
        assert_eq!(m.advance(now + secs(7)), 1);
    }

    #[test]
    fn allow_multiple_bypasses_dedup() {
        let mut m = manager();
        let now = Instant::now();
        m.render(AlertRequest::info("Saved"), now).unwrap();
        let second = m
            .render(AlertRequest::info("Saved").allow_multiple(), now)
            .unwrap();
        assert!(matches!(second, RenderOutcome::Created(_)));
        assert_eq!(m.stats(None).count, 2);
    }

    #[test]
    fn same_text_different_type_are_distinct() {
        let mut m = manager();
        let now = Instant::now();
        let e = m.render(AlertRequest::error("X"), now).unwrap();
        let i = m.render(AlertRequest::info("X"), now).unwrap();
        assert!(matches!(e, RenderOutcome::Created(_)));
        assert!(matches!(i, RenderOutcome::Created(_)));
        assert_eq!(m.stats(None), HolderStats { count: 2, error_count: 1 });

        assert_eq!(m.clear_by_stamp("neither"), 0);
        assert_eq!(m.stats(None).count, 2);
    }

    #[test]
    fn dedup_is_scoped_to_holder() {
        let mut m = manager();
        let now = Instant::now();
        m.render(AlertRequest::info("Saved"), now).unwrap();
        let other = m.render(AlertRequest::info("Saved").target("#panel"), now).unwrap();
        assert!(matches!(other, RenderOutcome::Created(_)));
        assert_eq!(m.stats(Some("#panel")).count, 1);
        assert_eq!(m.default_holder_stats().count, 1);
    }

    #[test]
    fn dedup_compares_sanitized_text() {
        let mut m = manager();
        let now = Instant::now();
        let a = m.render(AlertRequest::info("a < b"), now).unwrap();
        assert_eq!(m.alert(a.alert_id()).unwrap().text(), "a &lt; b");
        let b = m.render(AlertRequest::info("a < b"), now).unwrap();
        assert_eq!(b, RenderOutcome::Reinforced(a.alert_id()));
    }

    #[test]
    fn delay_counts_visible_non_error_alerts() {
        let mut m = manager();
        let now = Instant::now();
        m.render(AlertRequest::error("e1"), now).unwrap();
        m.render(AlertRequest::error("e2"), now).unwrap();
        m.render(AlertRequest::info("i1"), now).unwrap();
        m.render(AlertRequest::info("i2"), now).unwrap();
        let last = m.render(AlertRequest::info("i3"), now).unwrap().alert_id();

        // 5 visible, 2 errors: (5 - 2) * 2000 + 3000
        let alert = m.alert(last).unwrap();
        let deadline = m.timers.deadline(alert.timer.unwrap()).unwrap();
        assert_eq!(deadline, now + Duration::from_millis(9000));
    }

    #[test]
    fn navigation_removes_exempt_alerts_once() {
        let mut m = manager();
        let now = Instant::now();
        let frozen = m
            .render(AlertRequest::success("Pinned").freeze(), now)
            .unwrap()
            .alert_id();
        let timed = m.render(AlertRequest::info("Timed"), now).unwrap().alert_id();

        assert_eq!(m.navigation_changed(), 1);
        assert_eq!(m.state(frozen), Some(AlertState::Removed));
        assert_eq!(m.state(timed), Some(AlertState::TimerPending));
        assert!(m.surface().events().iter().any(|e| matches!(e, SurfaceEvent::Removed { .. })));

        assert_eq!(m.navigation_changed(), 0);
        assert_eq!(m.stats(None).count, 1);
    }

    #[test]
    fn alerts_created_after_navigation_wait_for_the_next_one() {
        let mut m = manager();
        let now = Instant::now();
        assert_eq!(m.navigation_changed(), 0);
        let id = m.render(AlertRequest::error("Late"), now).unwrap().alert_id();
        assert_eq!(m.state(id), Some(AlertState::AwaitingNavigation));
        assert_eq!(m.navigation_changed(), 1);
    }

    #[test]
    fn reinforcing_without_freeze_moves_to_timer() {
        let mut m = manager();
        let now = Instant::now();
        let id = m
            .render(AlertRequest::info("Note").freeze(), now)
            .unwrap()
            .alert_id();
        m.render(AlertRequest::info("Note"), now).unwrap();

        let alert = m.alert(id).unwrap();
        assert_eq!(alert.state(), AlertState::TimerPending);
        assert!(!alert.has_subscription());
        assert!(!alert.is_frozen());
        // the cancelled subscription must not remove it
        assert_eq!(m.navigation_changed(), 0);
        assert_eq!(m.advance(now + secs(5)), 1);
    }

    #[test]
    fn reinforcing_with_freeze_cancels_timer() {
        let mut m = manager();
        let now = Instant::now();
        let id = m.render(AlertRequest::info("Note"), now).unwrap().alert_id();
        m.render(AlertRequest::info("Note").freeze(), now).unwrap();

        let alert = m.alert(id).unwrap();
        assert_eq!(alert.state(), AlertState::AwaitingNavigation);
        assert!(!alert.has_timer());
        assert_eq!(m.advance(now + secs(3600)), 0);
        assert_eq!(m.navigation_changed(), 1);
    }

    #[test]
    fn reinforcing_error_keeps_single_subscription() {
        let mut m = manager();
        let now = Instant::now();
        let id = m.render(AlertRequest::error("Boom"), now).unwrap().alert_id();
        m.render(AlertRequest::error("Boom"), now).unwrap();
        m.render(AlertRequest::error("Boom"), now).unwrap();

        assert_eq!(m.navigation.len(), 1);
        assert_eq!(m.alert(id).unwrap().reinforcements(), 2);
        assert_eq!(m.navigation_changed(), 1);
    }

    #[test]
    fn clear_all_is_idempotent() {
        let mut m = manager();
        let now = Instant::now();
        m.render(AlertRequest::error("a"), now).unwrap();
        m.render(AlertRequest::info("b"), now).unwrap();
        m.render(AlertRequest::info("c").target("#panel"), now).unwrap();

        assert_eq!(m.clear_all(None), 3);
        assert_eq!(m.stats(None), HolderStats::default());
        assert_eq!(m.clear_all(None), 0);
        assert_eq!(m.stats(None), HolderStats::default());
        assert_eq!(m.next_deadline(), None);
        assert_eq!(m.navigation_changed(), 0);
    }

    #[test]
    fn clear_all_scoped_to_target() {
        let mut m = manager();
        let now = Instant::now();
        m.render(AlertRequest::info("a"), now).unwrap();
        m.render(AlertRequest::info("b").target("#panel"), now).unwrap();

        assert_eq!(m.clear_all(Some("#panel")), 1);
        assert_eq!(m.clear_all(Some("#unknown")), 0);
        assert_eq!(m.stats(None).count, 1);
        assert_eq!(m.stats(Some("#panel")).count, 0);
    }

    #[test]
    fn clear_by_stamp_removes_group() {
        let mut m = manager();
        let now = Instant::now();
        m.render(AlertRequest::info("a").stamp("form"), now).unwrap();
        m.render(AlertRequest::error("b").stamp("form").target("#x"), now).unwrap();
        m.render(AlertRequest::info("c").stamp("other"), now).unwrap();

        assert_eq!(m.clear_by_stamp("form"), 2);
        assert_eq!(m.stats(None), HolderStats { count: 1, error_count: 0 });
        assert_eq!(m.clear_by_stamp("form"), 0);
    }

    #[test]
    fn timer_after_explicit_removal_is_a_no_op() {
        let mut m = manager();
        let now = Instant::now();
        let id = m.render(AlertRequest::info("a"), now).unwrap().alert_id();
        assert!(m.dismiss(id));
        assert!(!m.dismiss(id));
        assert_eq!(m.advance(now + secs(60)), 0);
        assert_eq!(m.state(id), Some(AlertState::Removed));
    }

    #[test]
    fn unknown_ids_have_no_state() {
        let m = manager();
        assert_eq!(m.state(AlertId(1)), None);
    }

    #[test]
    fn empty_message_rejected_by_default() {
        let mut m = manager();
        let now = Instant::now();
        assert_eq!(
            m.render(AlertRequest::info("   "), now),
            Err(RequestError::EmptyMessage)
        );
        assert_eq!(m.stats(None).count, 0);
        // rejected before the holder is resolved
        assert!(m.holders().is_empty());
    }

    #[test]
    fn empty_message_allowed_by_config() {
        let config = Config::from_yaml_str("intake:\n  allow_empty_message: true\n")
            .unwrap()
            .compile();
        let mut m = AlertManager::new(config, MemorySurface::new());
        assert!(m.render(AlertRequest::info(""), Instant::now()).is_ok());
    }

    #[test]
    fn batch_is_sorted_and_isolates_failures() {
        let mut m = manager();
        let now = Instant::now();
        let report = m.render_batch(
            vec![
                AlertRequest::success("s"),
                AlertRequest::new(Severity::Custom("fatal".into()), "f"),
                AlertRequest::info(""),
                AlertRequest::error("e"),
                AlertRequest::new(Severity::Custom("warning".into()), "w"),
            ],
            now,
        );

        let order: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(order, vec![3, 2, 0, 1, 4]);
        assert_eq!(
            report.get(1),
            Some(&Err(RequestError::UnknownSeverity("fatal".to_string())))
        );
        assert_eq!(report.get(2), Some(&Err(RequestError::EmptyMessage)));
        assert_eq!(report.rejected().len(), 2);
        assert_eq!(report.alerts().len(), 3);
        assert_eq!(m.stats(None), HolderStats { count: 3, error_count: 1 });

        let texts: Vec<&str> = m.registry().alerts().map(|a| a.text()).collect();
        assert_eq!(texts, vec!["e", "s", "w"]);
    }

    #[test]
    fn batch_dedups_within_itself() {
        let mut m = manager();
        let report = m.render_batch(
            vec![AlertRequest::info("same"), AlertRequest::info("same")],
            Instant::now(),
        );
        assert!(matches!(report.outcomes[0].result, Ok(RenderOutcome::Created(_))));
        assert!(matches!(report.outcomes[1].result, Ok(RenderOutcome::Reinforced(_))));
        assert_eq!(m.stats(None).count, 1);
    }

    #[test]
    fn markup_failure_is_per_item() {
        let config = Config::from_yaml_str("markup:\n  template: '{{ text | shout }}'\n")
            .unwrap()
            .compile();
        let mut m = AlertManager::new(config, MemorySurface::new());
        let result = m.render(AlertRequest::info("x"), Instant::now());
        assert!(matches!(result, Err(RequestError::Markup(_))));
        assert_eq!(m.stats(None).count, 0);
        assert_eq!(m.surface().view_count(), 0);
        // rejected before the holder is resolved
        assert!(m.holders().is_empty());
        assert!(!m.surface().events().iter().any(|e| matches!(
            e,
            SurfaceEvent::ContainerCreated { .. }
        )));
    }

    #[test]
    fn markup_failure_leaves_last_type_unchanged() {
        let template = "markup:\n  template: '{% if severity == \"success\" %}{{ text | shout }}{% endif %}{{ text }}'\n";
        let config = Config::from_yaml_str(template).unwrap().compile();
        let mut m = AlertManager::new(config, MemorySurface::new());
        let now = Instant::now();

        m.render(AlertRequest::info("a"), now).unwrap();
        let result = m.render(AlertRequest::success("b"), now);
        assert!(matches!(result, Err(RequestError::Markup(_))));

        let holders = m.holders();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].last_type.as_deref(), Some("info"));
        assert_eq!(m.stats(None).count, 1);
    }

    #[test]
    fn timer_removal_uses_operation_clock() {
        let mut m = manager();
        // far from the real clock; only the passed instants matter
        let now = Instant::now() + secs(7200);
        let id = m.render(AlertRequest::info("Saved"), now).unwrap().alert_id();
        assert_eq!(m.alert(id).unwrap().age(now + secs(5)), secs(5));
        assert_eq!(m.advance(now + secs(5)), 1);
    }

    #[test]
    fn markup_uses_sanitized_stamp_and_danger_class() {
        let mut m = manager();
        m.render(AlertRequest::error("Disk <full>").stamp("a\"b"), Instant::now())
            .unwrap();
        let snapshot = m.surface().snapshot();
        let markup = &snapshot[0].1[0];
        assert!(markup.contains("alert-danger"));
        assert!(markup.contains("data-alert-stamp=\"a&quot;b\""));
        assert!(markup.contains("Disk &lt;full&gt;"));
    }

    #[test]
    fn holders_report_last_type() {
        let mut m = manager();
        let now = Instant::now();
        m.render(AlertRequest::info("a"), now).unwrap();
        m.render(AlertRequest::success("b"), now).unwrap();
        let holders = m.holders();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].key, "default");
        assert_eq!(holders[0].last_type.as_deref(), Some("success"));
    }

    #[test]
    fn counters_match_live_set_after_every_transition() {
        let mut m = manager();
        let now = Instant::now();
        m.render(AlertRequest::error("e"), now).unwrap();
        let i = m.render(AlertRequest::info("i"), now).unwrap().alert_id();
        m.render(AlertRequest::success("s").freeze(), now).unwrap();

        let check = |m: &AlertManager<MemorySurface>| {
            for holder in m.registry().holders() {
                assert_eq!(holder.stats(), m.registry().live_stats(holder.id()));
            }
        };
        check(&m);
        m.dismiss(i);
        check(&m);
        m.navigation_changed();
        check(&m);
        assert_eq!(m.stats(None), HolderStats::default());
    }
}
