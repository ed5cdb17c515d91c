//! User-Friendly Error Formatting
//!
//! Provides user-friendly error messages with troubleshooting hints
//! for common error scenarios.

use std::fmt::Write;

use crate::multimon::{MultiMonitorError, Rejection};

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Header
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let error_msg = format!("{:#}", error);

    match error.downcast_ref::<MultiMonitorError>() {
        Some(MultiMonitorError::RemoteRejected(_)) => format_rejected_error(&mut output),
        Some(MultiMonitorError::RemoteUnavailable(_)) => format_dbus_error(&mut output),
        Some(MultiMonitorError::Rejected(rejection)) => format_layout_error(&mut output, rejection),
        Some(MultiMonitorError::MonitorNotFound(connector)) => {
            format_monitor_error(&mut output, Some(connector))
        }
        Some(MultiMonitorError::NoMonitorSelected) => format_monitor_error(&mut output, None),
        _ if error_msg.contains("D-Bus") || error_msg.contains("DBus") || error_msg.contains("Mutter") => {
            format_dbus_error(&mut output)
        }
        _ if error_msg.contains("config") => format_config_error(&mut output),
        _ => format_generic_error(&mut output, &error_msg),
    }

    // Technical details
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{}", error_msg).ok();
    writeln!(&mut output).ok();

    // Footer with help
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: monitor-toggle -vv status"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Inspect the raw state: gdbus call --session --dest org.gnome.Mutter.DisplayConfig \\"
    )
    .ok();
    writeln!(
        &mut output,
        "      --object-path /org/gnome/Mutter/DisplayConfig \\"
    )
    .ok();
    writeln!(
        &mut output,
        "      --method org.gnome.Mutter.DisplayConfig.GetCurrentState"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_dbus_error(output: &mut String) {
    writeln!(output, "Display Configuration Service Unavailable").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Could not talk to GNOME's display configuration service (org.gnome.Mutter.DisplayConfig)."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Not running inside a GNOME session").ok();
    writeln!(output, "     → Check: echo $XDG_CURRENT_DESKTOP (should contain GNOME)").ok();
    writeln!(output).ok();
    writeln!(output, "  2. No session bus").ok();
    writeln!(output, "     → Check: echo $DBUS_SESSION_BUS_ADDRESS").ok();
    writeln!(output, "     → Over SSH, export the address of the desktop session").ok();
    writeln!(output).ok();
    writeln!(output, "  3. The compositor restarted while the command ran").ok();
    writeln!(output, "     → Run the command again").ok();
}

fn format_rejected_error(output: &mut String) {
    writeln!(output, "Display Configuration Rejected").ok();
    writeln!(output).ok();
    writeln!(output, "The desktop refused the new monitor layout.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. The monitor setup changed while the layout was computed").ok();
    writeln!(output, "     → Run the command again").ok();
    writeln!(output).ok();
    writeln!(output, "  2. The monitor does not support the chosen mode or scale").ok();
    writeln!(output, "     → Turn the monitor on once in GNOME Settings → Displays").ok();
    writeln!(output, "     → Check saved geometry in ~/.config/monitors.xml").ok();
}

fn format_layout_error(output: &mut String, rejection: &Rejection) {
    writeln!(output, "No Usable Monitor Layout").ok();
    writeln!(output).ok();
    writeln!(output, "{}.", rejection).ok();
    writeln!(output).ok();
    writeln!(output, "Nothing was changed.").ok();
    writeln!(output).ok();
    match rejection {
        Rejection::EmptyResult => {
            writeln!(output, "  → At least one monitor must stay on").ok();
        }
        Rejection::NoValidMode => {
            writeln!(output, "  → The monitor reports no usable display modes").ok();
            writeln!(output, "  → Check the cable and the monitor's input source").ok();
        }
        Rejection::UnknownConnector(_) => {
            writeln!(output, "  → Run: monitor-toggle status").ok();
        }
        Rejection::PrimaryProtected(_) => {
            writeln!(output, "  → Make another monitor primary in GNOME Settings first").ok();
        }
    }
}

fn format_monitor_error(output: &mut String, connector: Option<&String>) {
    writeln!(output, "Monitor Selection Error").ok();
    writeln!(output).ok();
    match connector {
        Some(connector) => writeln!(output, "Monitor {} is not connected.", connector).ok(),
        None => writeln!(output, "No monitor is selected.").ok(),
    };
    writeln!(output).ok();
    writeln!(output, "  → List connectors with: monitor-toggle status").ok();
    writeln!(output, "  → Set [toggle] monitor in the config file or pass --monitor").ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "There is a problem with the configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid values").ok();
    writeln!(output, "     → persistence_mode: verify, temporary or persistent").ok();
    writeln!(output, "     → settle_delay_ms: 1 to 60000").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Monitor Toggle Error").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Verify you're in a GNOME session:").ok();
    writeln!(output, "     → echo $XDG_CURRENT_DESKTOP").ok();
    writeln!(output, "     → echo $XDG_SESSION_TYPE").ok();
}
