//! Monitor Configuration Reconciliation
//!
//! Turns a one-click "toggle this monitor" request into a complete, valid
//! layout for the desktop's display configuration service.
//!
//! # Pipeline
//!
//! ```text
//! get_current_state ──► LayoutPlanner ──► resolve_modes ──► LayoutPositioner ──► ConfigApplier
//!        ▲                   │                                                        │
//!        │             SavedLayoutStore                                               │
//!        └──────────────────────── refresh after settle delay ◄───────────────────────┘
//! ```
//!
//! - **LayoutPlanner:** decides which logical monitors should exist after the
//!   toggle, restoring the original layout or saved geometry when enabling
//! - **resolve_modes:** re-validates every mode id against the latest snapshot
//! - **LayoutPositioner:** elects a single primary at the origin and tiles the
//!   rest left to right
//! - **ConfigApplier:** submits with the configured persistence mode and
//!   schedules the settle refresh
//!
//! [`MonitorToggle`] owns the snapshot and the original layout cache and
//! drives the pipeline; presentation is reported through a
//! [`ToggleObserver`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use monitor_toggle::config::Config;
//! use monitor_toggle::multimon::{LoggingObserver, MonitorToggle};
//! use monitor_toggle::mutter::MutterDisplayConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let connection = zbus::Connection::session().await?;
//! let service = Arc::new(MutterDisplayConfig::new(&connection).await?);
//!
//! let toggle = MonitorToggle::new(service, Arc::new(LoggingObserver), &Config::default_config());
//! toggle.refresh().await?;
//! let outcome = toggle.toggle().await?;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```

mod applier;
mod layout;
mod manager;
mod modes;
mod planner;
mod saved_layout;
mod service;
mod types;
mod view;

pub use applier::{apply_properties, ConfigApplier, RefreshTimer};
pub use layout::{LayoutPositioner, VirtualDesktop, DEFAULT_MONITOR_HEIGHT, DEFAULT_MONITOR_WIDTH};
pub use manager::{reconcile, MonitorToggle, ToggleOutcome};
pub use modes::resolve_modes;
pub use planner::{LayoutPlanner, PlannedLayout, ToggleDirection, ORIGIN_COLLISION_STEP};
pub use saved_layout::{parse_saved_layout, SavedLayoutStore};
pub use service::DisplayConfigService;
pub use types::{
    is_valid_mode_id, DisplayMode, DisplaySnapshot, GlobalProperties, LayoutMode,
    LogicalMonitor, MonitorAssignment, OriginalLayoutCache, PersistenceMode, PhysicalMonitor,
    Properties, PropertyValue, SavedConnectorConfig, Transform, DELETED_MODE_ID,
};
pub use view::{
    LoggingObserver, MonitorEntry, ToggleObserver, ToggleView, SUBTITLE_ERROR,
    SUBTITLE_NO_SELECTION, SUBTITLE_UNAVAILABLE,
};

use thiserror::Error;

/// Multi-monitor result type
pub type Result<T> = std::result::Result<T, MultiMonitorError>;

/// Reasons a toggle cannot be planned
///
/// None of these touch the desktop's configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The target is the primary monitor and may not be turned off
    #[error("{0} is the primary monitor and cannot be turned off")]
    PrimaryProtected(String),

    /// Turning the target off would leave no logical monitor
    #[error("Layout would contain no monitors")]
    EmptyResult,

    /// No monitor in the layout has a usable mode
    #[error("No valid display mode available")]
    NoValidMode,

    /// The target is not connected
    #[error("Connector not connected: {0}")]
    UnknownConnector(String),
}

/// Multi-monitor error types
#[derive(Error, Debug)]
pub enum MultiMonitorError {
    /// Display configuration service could not be reached or failed to answer
    #[error("Display configuration service unavailable: {0}")]
    RemoteUnavailable(String),

    /// Display configuration service refused the submitted layout
    #[error("Display configuration rejected: {0}")]
    RemoteRejected(String),

    /// Planning produced no usable layout
    #[error("Layout rejected: {0}")]
    Rejected(#[from] Rejection),

    /// No monitor is selected for toggling
    #[error("No monitor selected")]
    NoMonitorSelected,

    /// Monitor not found
    #[error("Monitor not found: {0}")]
    MonitorNotFound(String),

    /// State has not been fetched yet
    #[error("Display state not loaded")]
    NotLoaded,
}
