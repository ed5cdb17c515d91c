//! Layout Planner
//!
//! Decides which logical monitors the desktop should have after a monitor is
//! toggled. The result is a candidate: mode ids are not yet validated and
//! positions are provisional.

use tracing::{debug, info};

use super::saved_layout::SavedLayoutStore;
use super::types::{
    DisplaySnapshot, LogicalMonitor, MonitorAssignment, OriginalLayoutCache, Properties,
    Transform,
};
use super::Rejection;

/// Horizontal step used to move a restored template off an occupied origin
pub const ORIGIN_COLLISION_STEP: i32 = 1920;

/// Direction of a planned toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDirection {
    /// Monitor was active and is being turned off
    Disable,
    /// Monitor was inactive and is being turned on
    Enable,
}

/// Candidate produced by [`LayoutPlanner::plan`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLayout {
    /// What the plan does to the target
    pub direction: ToggleDirection,
    /// Candidate logical monitors
    pub logical_monitors: Vec<LogicalMonitor>,
}

/// Computes candidate layouts for toggling one connector
pub struct LayoutPlanner<'a> {
    snapshot: &'a DisplaySnapshot,
    original: &'a OriginalLayoutCache,
    saved_layouts: &'a SavedLayoutStore,
}

impl<'a> LayoutPlanner<'a> {
    /// Planner over one snapshot
    pub fn new(
        snapshot: &'a DisplaySnapshot,
        original: &'a OriginalLayoutCache,
        saved_layouts: &'a SavedLayoutStore,
    ) -> Self {
        Self {
            snapshot,
            original,
            saved_layouts,
        }
    }

    /// Plan toggling `target`
    ///
    /// # Errors
    ///
    /// - [`Rejection::UnknownConnector`] if `target` is not connected
    /// - [`Rejection::PrimaryProtected`] if `target` is active and primary
    /// - [`Rejection::EmptyResult`] if disabling would leave no logical monitor
    /// - [`Rejection::NoValidMode`] if enabling finds no usable mode
    pub fn plan(&self, target: &str) -> Result<PlannedLayout, Rejection> {
        if self.snapshot.monitor(target).is_none() {
            return Err(Rejection::UnknownConnector(target.to_string()));
        }

        if self.snapshot.is_active(target) {
            if self.snapshot.is_primary(target) {
                return Err(Rejection::PrimaryProtected(target.to_string()));
            }
            let logical_monitors = self.plan_disable(target)?;
            Ok(PlannedLayout {
                direction: ToggleDirection::Disable,
                logical_monitors,
            })
        } else {
            let logical_monitors = self.plan_enable(target)?;
            Ok(PlannedLayout {
                direction: ToggleDirection::Enable,
                logical_monitors,
            })
        }
    }

    fn plan_disable(&self, target: &str) -> Result<Vec<LogicalMonitor>, Rejection> {
        let candidate: Vec<LogicalMonitor> = self
            .snapshot
            .logical_monitors
            .iter()
            .cloned()
            .filter_map(|mut lm| {
                lm.monitors.retain(|m| m.connector != target);
                (!lm.monitors.is_empty()).then_some(lm)
            })
            .collect();

        if candidate.is_empty() {
            return Err(Rejection::EmptyResult);
        }

        info!(
            "Planned disabling {}: {} logical monitor(s) remain",
            target,
            candidate.len()
        );
        Ok(candidate)
    }

    fn plan_enable(&self, target: &str) -> Result<Vec<LogicalMonitor>, Rejection> {
        let mut candidate = self.snapshot.logical_monitors.clone();
        let mut restored = false;

        for template in self.original.templates_for(target) {
            if candidate.iter().any(|lm| lm.same_connectors(template)) {
                continue;
            }

            let mut lm = template.clone();
            // Drop mirrors that are gone or already shown elsewhere
            lm.monitors.retain(|m| {
                m.connector == target
                    || (self.snapshot.monitor(&m.connector).is_some()
                        && !candidate.iter().any(|c| c.contains(&m.connector)))
            });
            if lm.primary && candidate.iter().any(|c| c.primary) {
                lm.primary = false;
            }
            avoid_origin_collision(&mut lm, &candidate);

            debug!("Restoring {} from original layout at ({}, {})", target, lm.x, lm.y);
            candidate.push(lm);
            restored = true;
        }

        if !restored {
            candidate.push(self.fresh_logical_monitor(target, candidate.is_empty())?);
        }

        info!(
            "Planned enabling {}: {} logical monitor(s)",
            target,
            candidate.len()
        );
        Ok(candidate)
    }

    /// Single-monitor logical monitor for a connector with no template
    fn fresh_logical_monitor(
        &self,
        target: &str,
        only_monitor: bool,
    ) -> Result<LogicalMonitor, Rejection> {
        let monitor = self
            .snapshot
            .monitor(target)
            .ok_or_else(|| Rejection::UnknownConnector(target.to_string()))?;

        let mode = monitor
            .valid_modes()
            .next()
            .ok_or(Rejection::NoValidMode)?;

        let (x, y, scale, transform) = match self.saved_layouts.lookup(target) {
            Some(saved) => (saved.x, saved.y, saved.scale, saved.transform),
            None => {
                let y = self.snapshot.primary().map(|lm| lm.y).unwrap_or(0);
                (0, y, 1.0, Transform::Normal)
            }
        };

        debug!(
            "New logical monitor for {} with mode {} at ({}, {}) scale {}",
            target, mode.id, x, y, scale
        );

        Ok(LogicalMonitor {
            x,
            y,
            scale,
            transform,
            primary: only_monitor,
            monitors: vec![MonitorAssignment::new(target, Some(mode.id.clone()))],
            properties: Properties::new(),
        })
    }
}

fn avoid_origin_collision(lm: &mut LogicalMonitor, existing: &[LogicalMonitor]) {
    while existing.iter().any(|e| e.x == lm.x && e.y == lm.y) {
        lm.x += ORIGIN_COLLISION_STEP;
    }
}
