//! In-memory display configuration service for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use monitor_toggle::multimon::{
    DisplayConfigService, DisplayMode, DisplaySnapshot, LogicalMonitor, MonitorAssignment,
    MultiMonitorError, PersistenceMode, PhysicalMonitor, Properties, Result, Transform,
};

/// Behaves like the compositor: checks the serial, validates the layout,
/// stores it and advances the serial.
pub struct FakeDisplayConfig {
    state: Mutex<DisplaySnapshot>,
    applied: Mutex<Vec<(PersistenceMode, Vec<LogicalMonitor>)>>,
    fetches: Mutex<usize>,
    reject_next: Mutex<Option<String>>,
    apply_delay: Duration,
}

impl FakeDisplayConfig {
    pub fn new(snapshot: DisplaySnapshot) -> Self {
        Self::with_apply_delay(snapshot, Duration::ZERO)
    }

    pub fn with_apply_delay(snapshot: DisplaySnapshot, apply_delay: Duration) -> Self {
        Self {
            state: Mutex::new(snapshot),
            applied: Mutex::new(Vec::new()),
            fetches: Mutex::new(0),
            reject_next: Mutex::new(None),
            apply_delay,
        }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.state.lock().clone()
    }

    pub fn serial(&self) -> u32 {
        self.state.lock().serial
    }

    pub fn apply_count(&self) -> usize {
        self.applied.lock().len()
    }

    pub fn last_applied(&self) -> Option<(PersistenceMode, Vec<LogicalMonitor>)> {
        self.applied.lock().last().cloned()
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock()
    }

    pub fn reject_next_apply(&self, reason: &str) {
        *self.reject_next.lock() = Some(reason.to_string());
    }

    fn validate(state: &DisplaySnapshot, layout: &[LogicalMonitor]) -> std::result::Result<(), String> {
        if layout.is_empty() {
            return Err("empty layout".to_string());
        }
        if layout.iter().filter(|lm| lm.primary).count() != 1 {
            return Err("layout needs exactly one primary".to_string());
        }
        for lm in layout {
            if lm.monitors.is_empty() {
                return Err("logical monitor without monitors".to_string());
            }
            for assignment in &lm.monitors {
                let monitor = state
                    .monitor(&assignment.connector)
                    .ok_or_else(|| format!("unknown connector {}", assignment.connector))?;
                let mode_id = assignment.mode_id.as_deref().unwrap_or_default();
                if monitor.mode(mode_id).is_none() {
                    return Err(format!(
                        "invalid mode {:?} for {}",
                        mode_id, assignment.connector
                    ));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DisplayConfigService for FakeDisplayConfig {
    async fn get_current_state(&self) -> Result<DisplaySnapshot> {
        *self.fetches.lock() += 1;
        Ok(self.state.lock().clone())
    }

    async fn apply_monitors_config(
        &self,
        serial: u32,
        method: PersistenceMode,
        logical_monitors: &[LogicalMonitor],
        _properties: &Properties,
    ) -> Result<()> {
        if !self.apply_delay.is_zero() {
            tokio::time::sleep(self.apply_delay).await;
        }

        if let Some(reason) = self.reject_next.lock().take() {
            return Err(MultiMonitorError::RemoteRejected(reason));
        }

        let mut state = self.state.lock();
        if serial != state.serial {
            return Err(MultiMonitorError::RemoteRejected(format!(
                "stale serial {} (current {})",
                serial, state.serial
            )));
        }
        Self::validate(&state, logical_monitors).map_err(MultiMonitorError::RemoteRejected)?;

        self.applied
            .lock()
            .push((method, logical_monitors.to_vec()));

        if method == PersistenceMode::Verify {
            return Ok(());
        }

        state.logical_monitors = logical_monitors.to_vec();
        let assigned: Vec<MonitorAssignment> = logical_monitors
            .iter()
            .flat_map(|lm| lm.monitors.iter().cloned())
            .collect();
        for monitor in &mut state.monitors {
            let current = assigned
                .iter()
                .find(|a| a.connector == monitor.connector)
                .and_then(|a| a.mode_id.clone());
            for mode in &mut monitor.modes {
                mode.is_current = current.as_deref() == Some(mode.id.as_str());
            }
        }
        state.serial += 1;
        Ok(())
    }
}

pub fn mode(width: i32, height: i32, preferred: bool) -> DisplayMode {
    DisplayMode {
        id: format!("{}x{}@60.000", width, height),
        width,
        height,
        refresh_rate: 60.0,
        is_current: false,
        is_preferred: preferred,
    }
}

pub fn monitor(connector: &str, product: &str, modes: Vec<DisplayMode>) -> PhysicalMonitor {
    PhysicalMonitor {
        connector: connector.to_string(),
        vendor: "ACME".to_string(),
        product: product.to_string(),
        serial: "0001".to_string(),
        modes,
        is_builtin: connector.starts_with("eDP"),
        display_name: None,
    }
}

pub fn logical(x: i32, scale: f64, primary: bool, connector: &str, mode_id: &str) -> LogicalMonitor {
    LogicalMonitor {
        x,
        y: 0,
        scale,
        transform: Transform::Normal,
        primary,
        monitors: vec![MonitorAssignment::new(connector, Some(mode_id.to_string()))],
        properties: Properties::new(),
    }
}

/// Marks the modes named by the layout as current
pub fn snapshot(
    serial: u32,
    mut monitors: Vec<PhysicalMonitor>,
    logical_monitors: Vec<LogicalMonitor>,
) -> DisplaySnapshot {
    for monitor in &mut monitors {
        let current = logical_monitors
            .iter()
            .flat_map(|lm| lm.monitors.iter())
            .find(|a| a.connector == monitor.connector)
            .and_then(|a| a.mode_id.clone());
        for mode in &mut monitor.modes {
            mode.is_current = current.as_deref() == Some(mode.id.as_str());
        }
    }

    DisplaySnapshot {
        serial,
        monitors,
        logical_monitors,
        properties: Default::default(),
    }
}
