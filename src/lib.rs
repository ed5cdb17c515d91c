//! # monitor-toggle
//!
//! One-click toggle for a secondary monitor on GNOME/Mutter desktops.
//!
//! Reads the display configuration over Mutter's
//! `org.gnome.Mutter.DisplayConfig` D-Bus interface, computes a layout with
//! the selected monitor turned off (or back on) and submits it, keeping the
//! remaining monitors where they were.
//!
//! # Architecture
//!
//! ```text
//! monitor-toggle
//!   ├─> Config (TOML: preferred monitor, persistence mode, settle delay)
//!   ├─> MonitorToggle (selection, in-flight guard, observer updates)
//!   │     ├─> LayoutPlanner (remove or restore the target)
//!   │     ├─> resolve_modes (valid mode per connector)
//!   │     ├─> LayoutPositioner (primary and origins)
//!   │     └─> ConfigApplier (ApplyMonitorsConfig + settle refresh)
//!   └─> MutterDisplayConfig (zbus proxy)
//! ```
//!
//! # Data Flow
//!
//! **Toggle Path:** GetCurrentState → plan → modes → positions → ApplyMonitorsConfig
//!
//! **Refresh Path:** MonitorsChanged / settle timer → GetCurrentState → ToggleView

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration
pub mod config;

/// Monitor toggle logic
pub mod multimon;

/// Mutter D-Bus API integration
pub mod mutter;

/// Utility functions
pub mod utils;
