//! Session Diagnostics
//!
//! Describes the desktop session the tool runs in, for startup logging and
//! for the troubleshooting hints printed on errors.

use tracing::{info, warn};

/// Desktop session environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// `XDG_CURRENT_DESKTOP`, e.g. "ubuntu:GNOME"
    pub desktop: Option<String>,
    /// `XDG_SESSION_TYPE`, e.g. "wayland" or "x11"
    pub session_type: Option<String>,
    /// `WAYLAND_DISPLAY`
    pub wayland_display: Option<String>,
    /// `DBUS_SESSION_BUS_ADDRESS` is set
    pub has_session_bus: bool,
}

impl SessionInfo {
    /// Read the session environment
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            desktop: non_empty("XDG_CURRENT_DESKTOP"),
            session_type: non_empty("XDG_SESSION_TYPE"),
            wayland_display: non_empty("WAYLAND_DISPLAY"),
            has_session_bus: non_empty("DBUS_SESSION_BUS_ADDRESS").is_some(),
        }
    }

    /// True if the desktop identifies itself as GNOME (or a GNOME derivative)
    pub fn is_gnome(&self) -> bool {
        self.desktop.as_deref().is_some_and(|desktop| {
            desktop
                .split(':')
                .any(|part| matches!(part.to_ascii_lowercase().as_str(), "gnome" | "gnome-classic" | "unity"))
        })
    }
}

/// Detect the desktop environment
pub fn detect_desktop() -> Option<String> {
    SessionInfo::gather().desktop
}

/// Log complete diagnostics on startup
pub fn log_startup_diagnostics() {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║          Startup Diagnostics                              ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    let session = SessionInfo::gather();

    info!("=== Environment ===");
    info!(
        "  Desktop: {}",
        session.desktop.as_deref().unwrap_or("Unknown")
    );
    info!(
        "  Session type: {}",
        session.session_type.as_deref().unwrap_or("Unknown")
    );
    if let Some(wayland) = &session.wayland_display {
        info!("  Wayland display: {}", wayland);
    }
    info!(
        "  Session bus: {}",
        if session.has_session_bus { "available" } else { "not set" }
    );

    if !session.is_gnome() {
        warn!("Desktop is not GNOME; org.gnome.Mutter.DisplayConfig is probably unavailable");
    }

    info!("=== Build ===");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    #[cfg(debug_assertions)]
    info!("  Build: debug");
    #[cfg(not(debug_assertions))]
    info!("  Build: release");

    info!("╚════════════════════════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn session(vars: &[(&str, &str)]) -> SessionInfo {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SessionInfo::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_gnome_session() {
        let info = session(&[
            ("XDG_CURRENT_DESKTOP", "ubuntu:GNOME"),
            ("XDG_SESSION_TYPE", "wayland"),
            ("WAYLAND_DISPLAY", "wayland-0"),
            ("DBUS_SESSION_BUS_ADDRESS", "unix:path=/run/user/1000/bus"),
        ]);

        assert!(info.is_gnome());
        assert_eq!(info.session_type.as_deref(), Some("wayland"));
        assert!(info.has_session_bus);
    }

    #[test]
    fn test_non_gnome_session() {
        let info = session(&[("XDG_CURRENT_DESKTOP", "KDE"), ("XDG_SESSION_TYPE", "")]);
        assert!(!info.is_gnome());
        assert!(info.session_type.is_none());
        assert!(!info.has_session_bus);
    }

    #[test]
    fn test_empty_environment() {
        let info = session(&[]);
        assert_eq!(info, SessionInfo::default());
        assert!(!info.is_gnome());
    }

    #[test]
    fn test_log_startup_diagnostics_runs_without_subscriber() {
        log_startup_diagnostics();
    }
}
