//! Presentation State
//!
//! Everything a shell integration needs to render the toggle: the switch
//! state, its subtitle, the selectable monitor list and the persistence mode.
//! The controller pushes a fresh [`ToggleView`] to its [`ToggleObserver`]
//! after every state change; rendering is entirely up to the observer.

use serde::Serialize;
use tracing::info;

use super::types::{DisplaySnapshot, PersistenceMode};

/// Subtitle while no monitor is selected
pub const SUBTITLE_NO_SELECTION: &str = "No monitor selected";

/// Subtitle before any state has been read
pub const SUBTITLE_UNAVAILABLE: &str = "Unavailable";

/// Subtitle after the last refresh failed
pub const SUBTITLE_ERROR: &str = "Error";

/// One selectable monitor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorEntry {
    /// Connector name
    pub connector: String,
    /// Long display name, e.g. "DELL U2720Q (HDMI-1)"
    pub name: String,
    /// Shown by a logical monitor
    pub active: bool,
    /// Part of the primary logical monitor
    pub primary: bool,
    /// Currently selected for toggling
    pub selected: bool,
    /// Built-in panel
    pub builtin: bool,
    /// Current mode for active monitors, first mode size otherwise
    pub resolution: Option<String>,
}

/// Rendered state of the toggle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleView {
    /// Selected monitor is active
    pub checked: bool,
    /// Toggle accepts input
    pub sensitive: bool,
    /// Selected monitor's short name, or a status text
    pub subtitle: String,
    /// Panel indicator shown
    pub indicator_visible: bool,
    /// Persistence mode used for the next apply
    pub persistence_mode: PersistenceMode,
    /// Explanation of the persistence mode
    pub persistence_description: String,
    /// Connected monitors in service order
    pub monitors: Vec<MonitorEntry>,
}

impl ToggleView {
    /// Derive the view from the controller's state
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Last snapshot read, `None` before the first refresh
    /// * `selected` - Selected connector
    /// * `persistence_mode` - Configured persistence mode
    /// * `sensitive` - Whether the last operation left the toggle usable
    /// * `failed` - Whether the last refresh failed
    pub fn build(
        snapshot: Option<&DisplaySnapshot>,
        selected: Option<&str>,
        persistence_mode: PersistenceMode,
        sensitive: bool,
        failed: bool,
    ) -> Self {
        let monitors: Vec<MonitorEntry> = snapshot
            .map(|snapshot| {
                snapshot
                    .monitors
                    .iter()
                    .map(|monitor| {
                        let active = snapshot.is_active(&monitor.connector);
                        let resolution = if active {
                            snapshot.active_mode(&monitor.connector).map(|m| m.describe())
                        } else {
                            monitor.valid_modes().next().map(|m| m.describe_size())
                        };

                        MonitorEntry {
                            connector: monitor.connector.clone(),
                            name: monitor.long_name(),
                            active,
                            primary: snapshot.is_primary(&monitor.connector),
                            selected: selected == Some(monitor.connector.as_str()),
                            builtin: monitor.is_builtin,
                            resolution,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let selected_monitor = snapshot
            .zip(selected)
            .and_then(|(snapshot, connector)| snapshot.monitor(connector));

        let subtitle = if failed {
            SUBTITLE_ERROR.to_string()
        } else if snapshot.is_none() {
            SUBTITLE_UNAVAILABLE.to_string()
        } else {
            match selected_monitor {
                Some(monitor) => monitor.short_name(),
                None => SUBTITLE_NO_SELECTION.to_string(),
            }
        };

        let checked = selected_monitor
            .zip(snapshot)
            .is_some_and(|(monitor, snapshot)| snapshot.is_active(&monitor.connector));

        Self {
            checked,
            sensitive: sensitive && !failed && selected_monitor.is_some(),
            subtitle,
            indicator_visible: checked,
            persistence_mode,
            persistence_description: persistence_mode.description().to_string(),
            monitors,
        }
    }

    /// Entry of the selected monitor
    pub fn selected(&self) -> Option<&MonitorEntry> {
        self.monitors.iter().find(|m| m.selected)
    }
}

/// Receives presentation state changes
pub trait ToggleObserver: Send + Sync {
    /// Called after every state change
    fn on_state_changed(&self, view: &ToggleView);
}

impl<F> ToggleObserver for F
where
    F: Fn(&ToggleView) + Send + Sync,
{
    fn on_state_changed(&self, view: &ToggleView) {
        self(view)
    }
}

/// Observer that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl ToggleObserver for LoggingObserver {
    fn on_state_changed(&self, view: &ToggleView) {
        info!(
            "Toggle: {} [{}]{}",
            view.subtitle,
            if view.checked { "on" } else { "off" },
            if view.sensitive { "" } else { " (insensitive)" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multimon::types::{
        DisplayMode, LogicalMonitor, MonitorAssignment, PhysicalMonitor, Properties, Transform,
    };

    fn monitor(connector: &str, product: &str, current: bool) -> PhysicalMonitor {
        PhysicalMonitor {
            connector: connector.to_string(),
            vendor: "GSM".to_string(),
            product: product.to_string(),
            serial: String::new(),
            modes: vec![
                DisplayMode {
                    id: "2560x1440@59.951".to_string(),
                    width: 2560,
                    height: 1440,
                    refresh_rate: 59.951,
                    is_current: current,
                    is_preferred: true,
                },
                DisplayMode {
                    id: "1920x1080@60.000".to_string(),
                    width: 1920,
                    height: 1080,
                    refresh_rate: 60.0,
                    is_current: false,
                    is_preferred: false,
                },
            ],
            is_builtin: false,
            display_name: None,
        }
    }

    fn snapshot() -> DisplaySnapshot {
        DisplaySnapshot {
            serial: 1,
            monitors: vec![monitor("eDP-1", "", true), monitor("HDMI-1", "LG ULTRAGEAR", false)],
            logical_monitors: vec![LogicalMonitor {
                x: 0,
                y: 0,
                scale: 1.0,
                transform: Transform::Normal,
                primary: true,
                monitors: vec![MonitorAssignment::new("eDP-1", Some("2560x1440@59.951".to_string()))],
                properties: Properties::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_inactive_selection() {
        let snapshot = snapshot();
        let view = ToggleView::build(Some(&snapshot), Some("HDMI-1"), PersistenceMode::Persistent, true, false);

        assert!(!view.checked);
        assert!(!view.indicator_visible);
        assert!(view.sensitive);
        assert_eq!(view.subtitle, "LG ULTRAGEAR");

        let hdmi = view.selected().unwrap();
        assert_eq!(hdmi.name, "GSM LG ULTRAGEAR (HDMI-1)");
        assert_eq!(hdmi.resolution.as_deref(), Some("2560×1440"));
    }

    #[test]
    fn test_active_entry_shows_refresh_rate() {
        let snapshot = snapshot();
        let view = ToggleView::build(Some(&snapshot), Some("eDP-1"), PersistenceMode::Temporary, true, false);

        assert!(view.checked);
        assert!(view.indicator_visible);
        assert_eq!(view.subtitle, "eDP-1");
        assert_eq!(view.monitors[0].resolution.as_deref(), Some("2560×1440 @ 60.0Hz"));
        assert!(view.monitors[0].primary);
        assert_eq!(
            view.persistence_description,
            PersistenceMode::Temporary.description()
        );
    }

    #[test]
    fn test_status_subtitles() {
        let snapshot = snapshot();

        let view = ToggleView::build(None, None, PersistenceMode::Persistent, true, false);
        assert_eq!(view.subtitle, SUBTITLE_UNAVAILABLE);
        assert!(!view.sensitive);
        assert!(view.monitors.is_empty());

        let view = ToggleView::build(Some(&snapshot), None, PersistenceMode::Persistent, true, false);
        assert_eq!(view.subtitle, SUBTITLE_NO_SELECTION);
        assert!(!view.sensitive);

        let view = ToggleView::build(Some(&snapshot), Some("HDMI-1"), PersistenceMode::Persistent, true, true);
        assert_eq!(view.subtitle, SUBTITLE_ERROR);
        assert!(!view.sensitive);
    }

    #[test]
    fn test_view_serializes_to_json() {
        let snapshot = snapshot();
        let view = ToggleView::build(Some(&snapshot), Some("HDMI-1"), PersistenceMode::Persistent, true, false);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["persistence_mode"], "persistent");
        assert_eq!(json["monitors"][1]["connector"], "HDMI-1");
        assert_eq!(json["monitors"][1]["selected"], true);
    }

    #[test]
    fn test_closure_observer() {
        let seen = std::sync::Mutex::new(Vec::new());
        let observer = |view: &ToggleView| seen.lock().unwrap().push(view.subtitle.clone());

        let snapshot = snapshot();
        observer.on_state_changed(&ToggleView::build(Some(&snapshot), Some("eDP-1"), PersistenceMode::Persistent, true, false));
        assert_eq!(seen.lock().unwrap().as_slice(), ["eDP-1".to_string()]);
    }
}
