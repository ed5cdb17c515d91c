//! Mutter D-Bus API Integration (GNOME Only)
//!
//! Provides access to GNOME Mutter's org.gnome.Mutter.DisplayConfig D-Bus
//! interface, the same interface GNOME Settings uses to arrange monitors.
//!
//! # Compatibility
//!
//! - GNOME 3.26+: `GetCurrentState` / `ApplyMonitorsConfig` available
//! - GNOME 3.36+: `layout-mode` global property
//!
//! # Usage
//!
//! ```rust,no_run
//! use monitor_toggle::mutter::MutterDisplayConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let connection = zbus::Connection::session().await?;
//! let display_config = MutterDisplayConfig::new(&connection).await?;
//! let state = display_config.current_state().await?;
//! println!("{} monitor(s)", state.monitors.len());
//! # Ok(())
//! # }
//! ```

pub mod display_config;

// Re-exports
pub use display_config::{MutterDisplayConfig, DISPLAY_CONFIG_PATH, DISPLAY_CONFIG_SERVICE};

/// Check if Mutter DisplayConfig API is available
///
/// Returns true if org.gnome.Mutter.DisplayConfig has an owner on the
/// session bus
pub async fn is_display_config_available() -> bool {
    let Ok(conn) = zbus::Connection::session().await else {
        return false;
    };
    let Ok(dbus) = zbus::fdo::DBusProxy::new(&conn).await else {
        return false;
    };
    let Ok(name) = zbus::names::BusName::try_from(DISPLAY_CONFIG_SERVICE) else {
        return false;
    };

    dbus.name_has_owner(name).await.unwrap_or(false)
}
