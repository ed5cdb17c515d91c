//! Mode Resolution
//!
//! Mode ids are only meaningful within the snapshot they came from: drivers
//! re-enumerate modes and ids move. Before anything is submitted every
//! assignment is re-validated against the latest physical monitor list and
//! repaired with a deterministic fallback.

use tracing::{debug, warn};

use super::types::{LogicalMonitor, MonitorAssignment, PhysicalMonitor};
use super::Rejection;

/// Validate and repair the mode of every assignment in `candidate`
///
/// - a valid mode id of the monitor is kept
/// - a missing, stale or sentinel id is replaced by the monitor's preferred
///   mode, or its first valid mode if none is flagged preferred
/// - assignments for unknown connectors or monitors without valid modes are
///   dropped, and so are logical monitors left without assignments
///
/// # Errors
///
/// [`Rejection::NoValidMode`] if nothing survives.
pub fn resolve_modes(
    candidate: Vec<LogicalMonitor>,
    monitors: &[PhysicalMonitor],
) -> Result<Vec<LogicalMonitor>, Rejection> {
    let resolved: Vec<LogicalMonitor> = candidate
        .into_iter()
        .filter_map(|mut lm| {
            lm.monitors = lm
                .monitors
                .into_iter()
                .filter_map(|assignment| resolve_assignment(assignment, monitors))
                .collect();

            if lm.monitors.is_empty() {
                debug!("Dropping logical monitor at ({}, {}): no usable monitors", lm.x, lm.y);
                None
            } else {
                Some(lm)
            }
        })
        .collect();

    if resolved.is_empty() {
        return Err(Rejection::NoValidMode);
    }

    Ok(resolved)
}

fn resolve_assignment(
    mut assignment: MonitorAssignment,
    monitors: &[PhysicalMonitor],
) -> Option<MonitorAssignment> {
    let Some(monitor) = monitors.iter().find(|m| m.connector == assignment.connector) else {
        warn!("Dropping {}: not connected", assignment.connector);
        return None;
    };

    let valid = assignment
        .mode_id
        .as_deref()
        .is_some_and(|id| monitor.mode(id).is_some());

    if !valid {
        let Some(fallback) = monitor.fallback_mode() else {
            warn!("Dropping {}: no valid modes", assignment.connector);
            return None;
        };
        debug!(
            "{}: replacing mode {:?} with {}",
            assignment.connector, assignment.mode_id, fallback.id
        );
        assignment.mode_id = Some(fallback.id.clone());
    }

    // Per-monitor properties are not carried over into a new configuration
    assignment.properties.clear();
    Some(assignment)
}
