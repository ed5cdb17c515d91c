//! End-to-end toggle tests against an in-memory display configuration service

mod common;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use common::{logical, mode, monitor, snapshot, FakeDisplayConfig};
use monitor_toggle::config::Config;
use monitor_toggle::multimon::{
    DisplayMode, MonitorToggle, MultiMonitorError, PersistenceMode, ToggleObserver,
    ToggleOutcome, ToggleView, DELETED_MODE_ID,
};

fn config(monitor: &str, mode: PersistenceMode) -> Config {
    let mut config = Config::default_config();
    config.toggle.monitor = Some(monitor.to_string());
    config.toggle.persistence_mode = mode;
    config.toggle.settle_delay_ms = 1200;
    config.saved_layout.enabled = false;
    config
}

fn recorder() -> (Arc<dyn ToggleObserver>, Arc<Mutex<Vec<ToggleView>>>) {
    let views = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&views);
    let observer: Arc<dyn ToggleObserver> = Arc::new(move |view: &ToggleView| {
        sink.lock().push(view.clone());
    });
    (observer, views)
}

/// Laptop panel (primary) with an external monitor to its right
fn dual_head() -> FakeDisplayConfig {
    FakeDisplayConfig::new(snapshot(
        7,
        vec![
            monitor("eDP-1", "Panel", vec![mode(1920, 1200, true)]),
            monitor(
                "HDMI-1",
                "Big Screen",
                vec![mode(2560, 1440, true), mode(1920, 1080, false)],
            ),
        ],
        vec![
            logical(0, 1.0, true, "eDP-1", "1920x1200@60.000"),
            logical(1920, 1.0, false, "HDMI-1", "2560x1440@60.000"),
        ],
    ))
}

fn connector_sets(layout: &[monitor_toggle::multimon::LogicalMonitor]) -> Vec<Vec<String>> {
    let mut sets: Vec<Vec<String>> = layout
        .iter()
        .map(|lm| {
            let mut set: Vec<String> = lm.monitors.iter().map(|m| m.connector.clone()).collect();
            set.sort();
            set
        })
        .collect();
    sets.sort();
    sets
}

#[tokio::test(start_paused = true)]
async fn test_toggle_off_then_on_restores_layout() {
    let service = Arc::new(dual_head());
    let before = service.snapshot();
    let (observer, views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("HDMI-1", PersistenceMode::Temporary),
    );

    toggle.refresh().await.unwrap();
    assert_eq!(toggle.selected().as_deref(), Some("HDMI-1"));
    assert!(toggle.view().checked);

    let outcome = toggle.toggle().await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Disabled("HDMI-1".to_string()));
    assert!(toggle.refresh_pending());

    toggle.settled().await;
    assert!(!toggle.refresh_pending());
    let off = service.snapshot();
    assert_eq!(off.serial, 8);
    assert_eq!(connector_sets(&off.logical_monitors), vec![vec!["eDP-1".to_string()]]);
    assert!(!views.lock().last().unwrap().checked);

    let outcome = toggle.toggle().await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Enabled("HDMI-1".to_string()));
    toggle.settled().await;

    let on = service.snapshot();
    assert_eq!(on.serial, 9);
    assert_eq!(
        connector_sets(&on.logical_monitors),
        connector_sets(&before.logical_monitors)
    );
    assert_eq!(on.primary_connector(), Some("eDP-1"));
    assert_eq!(
        on.active_mode("HDMI-1").map(|m| m.id.as_str()),
        Some("2560x1440@60.000")
    );

    let last = views.lock().last().cloned().unwrap();
    assert!(last.checked);
    assert!(last.sensitive);
    assert_eq!(last.subtitle, "Big Screen");
}

#[tokio::test(start_paused = true)]
async fn test_enable_places_monitor_right_of_primary() {
    let panel = DisplayMode {
        id: "2880x1800@60.000".to_string(),
        width: 2880,
        height: 1800,
        refresh_rate: 60.0,
        is_current: false,
        is_preferred: true,
    };
    let external = DisplayMode {
        id: "1920x1080@60.0".to_string(),
        width: 1920,
        height: 1080,
        refresh_rate: 60.0,
        is_current: false,
        is_preferred: true,
    };
    let service = Arc::new(FakeDisplayConfig::new(snapshot(
        3,
        vec![
            monitor("eDP-1", "Panel", vec![panel]),
            monitor("HDMI-1", "Projector", vec![external]),
        ],
        vec![logical(0, 2.0, true, "eDP-1", "2880x1800@60.000")],
    )));
    let (observer, _views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("HDMI-1", PersistenceMode::Persistent),
    );

    let outcome = toggle.toggle().await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Enabled("HDMI-1".to_string()));

    let (method, layout) = service.last_applied().unwrap();
    assert_eq!(method, PersistenceMode::Persistent);
    assert_eq!(layout.len(), 2);

    assert!(layout[0].primary);
    assert!(layout[0].contains("eDP-1"));
    assert_eq!((layout[0].x, layout[0].y), (0, 0));

    // Logical layout: 2880 / 2.0
    assert!(!layout[1].primary);
    assert!(layout[1].contains("HDMI-1"));
    assert_eq!((layout[1].x, layout[1].y), (1440, 0));
    assert_eq!(
        layout[1].monitors[0].mode_id.as_deref(),
        Some("1920x1080@60.0")
    );
}

#[tokio::test(start_paused = true)]
async fn test_primary_monitor_is_protected() {
    let service = Arc::new(dual_head());
    let (observer, views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("eDP-1", PersistenceMode::Temporary),
    );

    toggle.refresh().await.unwrap();
    let outcome = toggle.toggle().await.unwrap();

    assert_eq!(outcome, ToggleOutcome::PrimaryProtected("eDP-1".to_string()));
    assert_eq!(service.apply_count(), 0);
    assert_eq!(service.serial(), 7);
    assert!(!toggle.refresh_pending());

    let last = views.lock().last().cloned().unwrap();
    assert!(last.checked);
    assert!(last.sensitive);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_apply_disables_until_refresh() {
    let service = Arc::new(dual_head());
    let (observer, views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("HDMI-1", PersistenceMode::Temporary),
    );

    service.reject_next_apply("configuration changed meanwhile");
    let err = toggle.toggle().await.unwrap_err();
    assert!(matches!(err, MultiMonitorError::RemoteRejected(_)));

    assert!(!toggle.view().sensitive);
    assert!(toggle.refresh_pending());
    assert_eq!(service.serial(), 7);

    let fetches = service.fetch_count();
    toggle.settled().await;
    assert_eq!(service.fetch_count(), fetches + 1);

    let last = views.lock().last().cloned().unwrap();
    assert!(last.sensitive);
    assert!(last.checked);
}

#[tokio::test(start_paused = true)]
async fn test_verify_mode_leaves_layout_alone() {
    let service = Arc::new(dual_head());
    let (observer, _views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("HDMI-1", PersistenceMode::Verify),
    );

    let outcome = toggle.toggle().await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Verified("HDMI-1".to_string()));

    let (method, layout) = service.last_applied().unwrap();
    assert_eq!(method, PersistenceMode::Verify);
    assert_eq!(layout.len(), 1);

    toggle.settled().await;
    assert!(toggle.snapshot().unwrap().is_active("HDMI-1"));
    assert!(toggle.view().checked);
}

#[tokio::test(start_paused = true)]
async fn test_second_toggle_while_in_flight_is_busy() {
    let service = Arc::new(FakeDisplayConfig::with_apply_delay(
        dual_head().snapshot(),
        Duration::from_millis(500),
    ));
    let (observer, _views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("HDMI-1", PersistenceMode::Temporary),
    );

    let (first, second) = tokio::join!(toggle.toggle(), toggle.toggle());

    assert_eq!(first.unwrap(), ToggleOutcome::Disabled("HDMI-1".to_string()));
    assert_eq!(second.unwrap(), ToggleOutcome::Busy);
    assert_eq!(service.apply_count(), 1);

    // Guard released once the first toggle finished
    toggle.settled().await;
    let again = toggle.toggle().await.unwrap();
    assert_eq!(again, ToggleOutcome::Enabled("HDMI-1".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_deleted_mode_replaced_before_submission() {
    let mut state = dual_head().snapshot();
    state.logical_monitors[1].monitors[0].mode_id = Some(DELETED_MODE_ID.to_string());
    let service = Arc::new(FakeDisplayConfig::new(state));
    let (observer, _views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("HDMI-1", PersistenceMode::Temporary),
    );

    // The original layout captured here still carries the sentinel
    toggle.refresh().await.unwrap();
    assert_eq!(
        toggle.toggle().await.unwrap(),
        ToggleOutcome::Disabled("HDMI-1".to_string())
    );
    toggle.settled().await;

    assert_eq!(
        toggle.toggle().await.unwrap(),
        ToggleOutcome::Enabled("HDMI-1".to_string())
    );
    let (_, layout) = service.last_applied().unwrap();
    let hdmi = layout.iter().find(|lm| lm.contains("HDMI-1")).unwrap();
    assert_eq!(hdmi.monitors[0].mode_id.as_deref(), Some("2560x1440@60.000"));
}

#[tokio::test(start_paused = true)]
async fn test_select_unknown_monitor() {
    let service = Arc::new(dual_head());
    let (observer, _views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("HDMI-1", PersistenceMode::Temporary),
    );

    let err = toggle.select_monitor("DP-3").await.unwrap_err();
    assert!(matches!(err, MultiMonitorError::NotLoaded));

    toggle.refresh().await.unwrap();
    let err = toggle.select_monitor("DP-3").await.unwrap_err();
    assert!(matches!(err, MultiMonitorError::MonitorNotFound(ref c) if c == "DP-3"));

    toggle.select_monitor("eDP-1").await.unwrap();
    assert_eq!(toggle.selected().as_deref(), Some("eDP-1"));
    assert!(toggle.view().selected().unwrap().primary);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_settle_refresh() {
    let service = Arc::new(dual_head());
    let (observer, _views) = recorder();
    let toggle = MonitorToggle::new(
        service.clone(),
        observer,
        &config("HDMI-1", PersistenceMode::Temporary),
    );

    toggle.toggle().await.unwrap();
    let fetches = service.fetch_count();
    assert!(toggle.refresh_pending());

    toggle.shutdown();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(!toggle.refresh_pending());
    assert_eq!(service.fetch_count(), fetches);
}
