//! Monitor Toggle Controller
//!
//! Owns the last snapshot, the original layout cache and the selection, and
//! drives the fetch → plan → resolve → position → apply pipeline for one
//! toggle at a time.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::applier::ConfigApplier;
use super::layout::LayoutPositioner;
use super::modes::resolve_modes;
use super::planner::{LayoutPlanner, PlannedLayout, ToggleDirection};
use super::saved_layout::SavedLayoutStore;
use super::service::DisplayConfigService;
use super::types::{DisplaySnapshot, OriginalLayoutCache, PersistenceMode};
use super::view::{ToggleObserver, ToggleView};
use super::{MultiMonitorError, Rejection, Result};
use crate::config::Config;

/// Result of a toggle request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Monitor was turned on
    Enabled(String),
    /// Monitor was turned off
    Disabled(String),
    /// Layout was validated by the service but not applied
    Verified(String),
    /// Monitor is primary; nothing was changed
    PrimaryProtected(String),
    /// Another toggle is still in flight; nothing was changed
    Busy,
}

impl fmt::Display for ToggleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled(c) => write!(f, "{} enabled", c),
            Self::Disabled(c) => write!(f, "{} disabled", c),
            Self::Verified(c) => write!(f, "{} layout verified (not applied)", c),
            Self::PrimaryProtected(c) => write!(f, "{} is the primary monitor and stays on", c),
            Self::Busy => f.write_str("toggle already in progress"),
        }
    }
}

/// Compute the final layout for toggling `target`
///
/// Chains [`LayoutPlanner::plan`], [`resolve_modes`] and
/// [`LayoutPositioner::position`] over one snapshot. Pure: the same inputs
/// always give the same layout.
///
/// # Errors
///
/// Any [`Rejection`] raised by planning or mode resolution.
pub fn reconcile(
    snapshot: &DisplaySnapshot,
    target: &str,
    original: &OriginalLayoutCache,
    saved_layouts: &SavedLayoutStore,
) -> std::result::Result<PlannedLayout, Rejection> {
    let plan = LayoutPlanner::new(snapshot, original, saved_layouts).plan(target)?;
    let resolved = resolve_modes(plan.logical_monitors, &snapshot.monitors)?;

    let positioner = LayoutPositioner::new(&snapshot.monitors, snapshot.properties.layout_mode);
    let mut logical_monitors = positioner.position(resolved, snapshot.primary_connector());

    if snapshot.properties.global_scale_required {
        let scale = logical_monitors.first().map(|lm| lm.scale).unwrap_or(1.0);
        if logical_monitors.iter().any(|lm| lm.scale != scale) {
            debug!("Global scale required, using {} everywhere", scale);
            for lm in &mut logical_monitors {
                lm.scale = scale;
            }
            logical_monitors = positioner.position(logical_monitors, None);
        }
    }

    Ok(PlannedLayout {
        direction: plan.direction,
        logical_monitors,
    })
}

/// Mutable controller state; never held across an await
#[derive(Debug)]
struct ToggleState {
    snapshot: Option<DisplaySnapshot>,
    original: OriginalLayoutCache,
    preferred: Option<String>,
    selected: Option<String>,
    persistence_mode: PersistenceMode,
    sensitive: bool,
    failed: bool,
}

impl ToggleState {
    fn view(&self) -> ToggleView {
        ToggleView::build(
            self.snapshot.as_ref(),
            self.selected.as_deref(),
            self.persistence_mode,
            self.sensitive,
            self.failed,
        )
    }

    /// Keep the selection pointing at a connected monitor
    fn reselect(&mut self) {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };

        if let Some(selected) = self.selected.as_deref() {
            if snapshot.monitor(selected).is_some() {
                return;
            }
            info!("Selected monitor {} disconnected", selected);
        }

        let connected = |c: &String| snapshot.monitor(c).is_some();
        self.selected = self
            .preferred
            .clone()
            .filter(connected)
            .or_else(|| match snapshot.monitors.as_slice() {
                [only] => Some(only.connector.clone()),
                [_, second, ..] => Some(second.connector.clone()),
                [] => None,
            });

        if let Some(selected) = &self.selected {
            debug!("Selected monitor {}", selected);
        }
    }
}

/// State shared with the refresh task
struct ToggleInner {
    service: Arc<dyn DisplayConfigService>,
    observer: Arc<dyn ToggleObserver>,
    saved_layouts: SavedLayoutStore,
    state: Mutex<ToggleState>,
    in_flight: AtomicBool,
}

impl ToggleInner {
    /// Fetch, store and publish the current state
    async fn refresh(&self) -> Result<DisplaySnapshot> {
        let fetched = self.service.get_current_state().await;

        let view = {
            let mut state = self.state.lock();
            match &fetched {
                Ok(snapshot) => {
                    debug!(
                        "State serial {}: {} monitor(s), {} logical monitor(s)",
                        snapshot.serial,
                        snapshot.monitors.len(),
                        snapshot.logical_monitors.len()
                    );
                    if state.original.capture(&snapshot.logical_monitors) {
                        info!(
                            "Captured original layout ({} logical monitor(s))",
                            snapshot.logical_monitors.len()
                        );
                    }
                    state.snapshot = Some(snapshot.clone());
                    state.reselect();
                    state.sensitive = true;
                    state.failed = false;
                }
                Err(e) => {
                    error!("Failed to read display state: {}", e);
                    state.sensitive = false;
                    state.failed = true;
                }
            }
            state.view()
        };

        self.observer.on_state_changed(&view);
        fetched
    }

    fn set_insensitive(&self) {
        let view = {
            let mut state = self.state.lock();
            state.sensitive = false;
            state.view()
        };
        self.observer.on_state_changed(&view);
    }

    fn publish(&self) {
        let view = self.state.lock().view();
        self.observer.on_state_changed(&view);
    }
}

/// Clears the in-flight flag when the toggle finishes
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Toggles one selected monitor on and off
///
/// Dropping the controller cancels a pending refresh.
pub struct MonitorToggle {
    inner: Arc<ToggleInner>,
    applier: ConfigApplier,
}

impl MonitorToggle {
    /// Create a controller
    ///
    /// # Arguments
    ///
    /// * `service` - Display configuration service
    /// * `observer` - Receives a [`ToggleView`] after every state change
    /// * `config` - Preferred monitor, persistence mode, settle delay and
    ///   saved layout location
    pub fn new(
        service: Arc<dyn DisplayConfigService>,
        observer: Arc<dyn ToggleObserver>,
        config: &Config,
    ) -> Self {
        let state = ToggleState {
            snapshot: None,
            original: OriginalLayoutCache::new(),
            preferred: config.toggle.monitor.clone(),
            selected: None,
            persistence_mode: config.toggle.persistence_mode,
            sensitive: true,
            failed: false,
        };

        Self {
            applier: ConfigApplier::new(Arc::clone(&service), config.settle_delay()),
            inner: Arc::new(ToggleInner {
                service,
                observer,
                saved_layouts: config.saved_layout_store(),
                state: Mutex::new(state),
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Re-read the current state and publish it
    ///
    /// # Errors
    ///
    /// `RemoteUnavailable` if the state cannot be read; the toggle is then
    /// shown as insensitive with an error subtitle.
    pub async fn refresh(&self) -> Result<()> {
        self.inner.refresh().await.map(|_| ())
    }

    /// Toggle the selected monitor
    ///
    /// Reads fresh state, computes the new layout and submits it. The settle
    /// refresh is scheduled whether or not the service accepts the layout.
    ///
    /// # Returns
    ///
    /// What happened; [`ToggleOutcome::PrimaryProtected`] and
    /// [`ToggleOutcome::Busy`] leave every state untouched.
    ///
    /// # Errors
    ///
    /// - `NoMonitorSelected` if nothing is selected
    /// - `Rejected` if planning produced no usable layout
    /// - `RemoteUnavailable` / `RemoteRejected` from the service
    pub async fn toggle(&self) -> Result<ToggleOutcome> {
        let Some(_guard) = InFlightGuard::acquire(&self.inner.in_flight) else {
            warn!("Toggle requested while another is in flight, ignoring");
            return Ok(ToggleOutcome::Busy);
        };

        let snapshot = self.inner.refresh().await?;

        let (target, original, method) = {
            let state = self.inner.state.lock();
            (
                state.selected.clone(),
                state.original.clone(),
                state.persistence_mode,
            )
        };
        let target = target.ok_or(MultiMonitorError::NoMonitorSelected)?;

        let planned = match reconcile(&snapshot, &target, &original, &self.inner.saved_layouts) {
            Ok(planned) => planned,
            Err(Rejection::PrimaryProtected(connector)) => {
                warn!("Refusing to turn off primary monitor {}", connector);
                self.inner.publish();
                return Ok(ToggleOutcome::PrimaryProtected(connector));
            }
            Err(rejection) => {
                error!("Cannot toggle {}: {}", target, rejection);
                self.inner.set_insensitive();
                return Err(rejection.into());
            }
        };

        info!(
            "Toggling {} {}",
            target,
            match planned.direction {
                ToggleDirection::Enable => "on",
                ToggleDirection::Disable => "off",
            }
        );

        let applied = self
            .applier
            .apply(&snapshot, &planned.logical_monitors, method)
            .await;

        // Insensitive before the refresh exists, so the refresh always wins
        if let Err(e) = applied {
            self.inner.set_insensitive();
            self.schedule_refresh();
            return Err(e);
        }
        self.schedule_refresh();

        Ok(match (method, planned.direction) {
            (PersistenceMode::Verify, _) => ToggleOutcome::Verified(target),
            (_, ToggleDirection::Enable) => ToggleOutcome::Enabled(target),
            (_, ToggleDirection::Disable) => ToggleOutcome::Disabled(target),
        })
    }

    fn schedule_refresh(&self) {
        let inner = Arc::clone(&self.inner);
        self.applier.schedule_refresh(async move {
            if let Err(e) = inner.refresh().await {
                warn!("Settle refresh failed: {}", e);
            }
        });
    }

    /// Select the monitor to toggle and refresh
    ///
    /// # Errors
    ///
    /// `MonitorNotFound` if `connector` is not connected, `NotLoaded` before
    /// the first successful refresh.
    pub async fn select_monitor(&self, connector: &str) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            let snapshot = state.snapshot.as_ref().ok_or(MultiMonitorError::NotLoaded)?;
            if snapshot.monitor(connector).is_none() {
                return Err(MultiMonitorError::MonitorNotFound(connector.to_string()));
            }
            info!("Selecting monitor {}", connector);
            state.selected = Some(connector.to_string());
            state.preferred = Some(connector.to_string());
        }
        self.refresh().await
    }

    /// Change the persistence mode used by later toggles
    pub fn set_persistence_mode(&self, mode: PersistenceMode) {
        info!("Persistence mode: {}", mode);
        self.inner.state.lock().persistence_mode = mode;
        self.inner.publish();
    }

    /// Currently selected connector
    pub fn selected(&self) -> Option<String> {
        self.inner.state.lock().selected.clone()
    }

    /// Last snapshot read
    pub fn snapshot(&self) -> Option<DisplaySnapshot> {
        self.inner.state.lock().snapshot.clone()
    }

    /// Current presentation state
    pub fn view(&self) -> ToggleView {
        self.inner.state.lock().view()
    }

    /// True while the settle refresh is pending
    pub fn refresh_pending(&self) -> bool {
        self.applier.refresh_pending()
    }

    /// Wait for the pending settle refresh, if any
    pub async fn settled(&self) {
        self.applier.settled().await;
    }

    /// Cancel the pending settle refresh
    pub fn shutdown(&self) {
        if self.applier.cancel_refresh() {
            debug!("Cancelled pending refresh");
        }
    }
}
