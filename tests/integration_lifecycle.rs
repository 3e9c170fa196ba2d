//! End-to-end lifecycle tests through the async service with paused time.

use std::path::PathBuf;
use std::time::Duration;

use alertbox::scenario::{self, Scenario, StepReport};
use alertbox::{
    AlertHandle, AlertManager, AlertRequest, AlertService, AlertState, Config, HolderStats,
    MemorySurface, NavigationEvent, NavigationSignal, RenderOutcome, RuntimeConfig, Severity,
    SurfaceEvent,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

struct Running {
    handle: AlertHandle,
    signal: NavigationSignal,
    cancel: CancellationToken,
    task: JoinHandle<AlertManager<MemorySurface>>,
}

impl Running {
    fn start(config: RuntimeConfig) -> Self {
        let signal = NavigationSignal::default();
        let manager = AlertManager::new(config, MemorySurface::new());
        let (service, handle) = AlertService::new(manager, &signal);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(service.run(cancel.clone()));
        Self {
            handle,
            signal,
            cancel,
            task,
        }
    }

    async fn stop(self) -> AlertManager<MemorySurface> {
        self.cancel.cancel();
        self.task.await.expect("service task panicked")
    }
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn delays_grow_with_visible_non_error_alerts() {
    let svc = Running::start(RuntimeConfig::default());
    let h = &svc.handle;

    let first = h.render(AlertRequest::info("one")).await.unwrap().alert_id();
    let second = h.render(AlertRequest::info("two")).await.unwrap().alert_id();
    h.render(AlertRequest::error("stays")).await.unwrap();

    // first: 1 visible -> 5s; second: 2 visible -> 7s
    sleep_ms(5_001).await;
    assert_eq!(h.state(first).await.unwrap(), Some(AlertState::Removed));
    assert_eq!(h.state(second).await.unwrap(), Some(AlertState::TimerPending));

    sleep_ms(2_000).await;
    assert_eq!(h.state(second).await.unwrap(), Some(AlertState::Removed));
    assert_eq!(
        h.stats(None).await.unwrap(),
        HolderStats {
            count: 1,
            error_count: 1
        }
    );

    let manager = svc.stop().await;
    let fades = manager
        .surface()
        .events()
        .iter()
        .filter(|e| matches!(e, SurfaceEvent::FadedOut { .. }))
        .count();
    assert_eq!(fades, 2);
}

#[tokio::test(start_paused = true)]
async fn reinforcement_restarts_the_timer() {
    let svc = Running::start(RuntimeConfig::default());
    let h = &svc.handle;

    let id = h.render(AlertRequest::success("Saved")).await.unwrap().alert_id();
    sleep_ms(4_000).await;
    assert_eq!(
        h.render(AlertRequest::success("Saved")).await.unwrap(),
        RenderOutcome::Reinforced(id)
    );

    // Original deadline (5s) passes without removal.
    sleep_ms(2_000).await;
    assert_eq!(h.state(id).await.unwrap(), Some(AlertState::TimerPending));

    sleep_ms(3_100).await;
    assert_eq!(h.state(id).await.unwrap(), Some(AlertState::Removed));

    let manager = svc.stop().await;
    assert!(manager.surface().events().iter().any(|e| matches!(
        e,
        SurfaceEvent::TransientClass { class, .. } if class == "alert-reminder"
    )));
}

#[tokio::test(start_paused = true)]
async fn frozen_alert_survives_until_navigation() {
    let svc = Running::start(RuntimeConfig::default());
    let h = &svc.handle;

    let pinned = h
        .render(AlertRequest::info("Read me").freeze())
        .await
        .unwrap()
        .alert_id();
    sleep_ms(3_600_000).await;
    assert_eq!(h.state(pinned).await.unwrap(), Some(AlertState::AwaitingNavigation));

    assert_eq!(svc.signal.navigate(NavigationEvent::to("/next")), 1);
    assert_eq!(h.state(pinned).await.unwrap(), Some(AlertState::Removed));

    // A second navigation has nothing left to remove.
    svc.signal.navigate(NavigationEvent::to("/again"));
    assert_eq!(h.stats(None).await.unwrap(), HolderStats::default());

    svc.stop().await;
}

#[tokio::test(start_paused = true)]
async fn clear_cancels_pending_timers_and_subscriptions() {
    let svc = Running::start(RuntimeConfig::default());
    let h = &svc.handle;

    let timed = h.render(AlertRequest::info("timed")).await.unwrap().alert_id();
    let err = h.render(AlertRequest::error("err")).await.unwrap().alert_id();
    assert_eq!(h.clear_all(None).await.unwrap(), 2);
    assert_eq!(h.clear_all(None).await.unwrap(), 0);

    sleep_ms(60_000).await;
    svc.signal.navigate(NavigationEvent::default());
    assert_eq!(h.state(timed).await.unwrap(), Some(AlertState::Removed));
    assert_eq!(h.state(err).await.unwrap(), Some(AlertState::Removed));

    let manager = svc.stop().await;
    // Explicit clears never fade; nothing fired afterwards.
    let events = manager.surface().events();
    assert!(!events.iter().any(|e| matches!(e, SurfaceEvent::FadedOut { .. })));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::Removed { .. }))
            .count(),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn targets_get_independent_holders() {
    let svc = Running::start(RuntimeConfig::default());
    let h = &svc.handle;

    h.render(AlertRequest::info("main")).await.unwrap();
    h.render(AlertRequest::info("side").target("#sidebar")).await.unwrap();
    h.render(AlertRequest::error("side err").target("#sidebar"))
        .await
        .unwrap();

    assert_eq!(h.stats(Some("#sidebar")).await.unwrap().count, 2);
    assert_eq!(h.stats(None).await.unwrap().count, 3);

    let holders = h.holders().await.unwrap();
    let keys: Vec<&str> = holders.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["default", "#sidebar"]);
    assert_eq!(holders[1].last_type.as_deref(), Some("error"));

    assert_eq!(h.clear_all(Some("#sidebar")).await.unwrap(), 2);
    assert_eq!(h.stats(None).await.unwrap().count, 1);

    svc.stop().await;
}

#[tokio::test(start_paused = true)]
async fn custom_severities_follow_configuration() {
    let config = Config::from_yaml_str(
        "severities:\n  custom:\n    warning: 0\n    notice: ~\n",
    );
    // rank 0 is invalid; validation reports it
    assert!(config.unwrap().validate().is_err());

    let config = Config::from_yaml_str("severities:\n  custom:\n    warning: 2\n    notice: ~\n")
        .unwrap();
    assert!(config.validate().is_ok());
    let svc = Running::start(config.compile());
    let h = &svc.handle;

    let report = h
        .render_batch(vec![
            AlertRequest::new(Severity::Custom("notice".into()), "n"),
            AlertRequest::info("i"),
            AlertRequest::new(Severity::Custom("warning".into()), "w"),
            AlertRequest::new(Severity::Custom("fatal".into()), "f"),
        ])
        .await
        .unwrap();

    let order: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
    // info and warning share rank 2 and keep their submission order
    assert_eq!(order, vec![1, 2, 0, 3]);
    assert_eq!(report.rejected().len(), 1);
    assert_eq!(report.rejected()[0].0, 3);

    svc.stop().await;
}

#[tokio::test(start_paused = true)]
async fn demo_scenario_replays_deterministically() {
    let scenario = Scenario::load(&fixture_path("scenario_demo.yaml")).unwrap();
    let report = scenario::execute(RuntimeConfig::default(), &scenario, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.completed);
    assert_eq!(report.steps.len(), 9);

    match &report.steps[0] {
        StepReport::Render { items } => {
            let order: Vec<usize> = items.iter().map(|i| i.index).collect();
            assert_eq!(order, vec![1, 2, 0]);
            assert!(items.iter().all(|i| i.error.is_none()));
        }
        other => panic!("Expected render report, got {:?}", other),
    }
    match &report.steps[1] {
        StepReport::Render { items } => {
            assert!(matches!(items[0].outcome, Some(RenderOutcome::Reinforced(_))));
        }
        other => panic!("Expected render report, got {:?}", other),
    }

    let stats: Vec<(usize, usize)> = report
        .steps
        .iter()
        .filter_map(|s| match s {
            StepReport::Stats {
                count, error_count, ..
            } => Some((*count, *error_count)),
            _ => None,
        })
        .collect();
    assert_eq!(stats, vec![(3, 1), (1, 0), (0, 0)]);

    assert!(report.steps.contains(&StepReport::ClearStamp {
        stamp: "profile".to_string(),
        removed: 1,
    }));
    assert_eq!(report.holders.len(), 1);
    assert_eq!(report.holders[0].count, 0);
    assert!(report.surface[0].1.is_empty());
}
