//! Layout Positioning
//!
//! Turns a mode-resolved candidate into a submittable layout: exactly one
//! primary logical monitor at the origin, every other logical monitor tiled
//! to its right.
//!
//! ```text
//! ┌────────┬────────┬────────┐
//! │Primary │Second  │Third   │
//! │(0, 0)  │(w0, 0) │(w0+w1,0)
//! └────────┴────────┴────────┘
//! ```

use tracing::debug;

use super::types::{DisplayMode, LayoutMode, LogicalMonitor, PhysicalMonitor};

/// Width assumed when a logical monitor's mode cannot be found
pub const DEFAULT_MONITOR_WIDTH: i32 = 1920;

/// Height assumed when a logical monitor's mode cannot be found
pub const DEFAULT_MONITOR_HEIGHT: i32 = 1080;

/// Bounding box of a positioned layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualDesktop {
    /// Total width
    pub width: u32,
    /// Total height
    pub height: u32,
    /// Top-left X offset from origin
    pub offset_x: i32,
    /// Top-left Y offset from origin
    pub offset_y: i32,
}

/// Assigns final coordinates to logical monitors
pub struct LayoutPositioner<'a> {
    monitors: &'a [PhysicalMonitor],
    layout_mode: LayoutMode,
}

impl<'a> LayoutPositioner<'a> {
    /// Positioner using the modes of `monitors`
    pub fn new(monitors: &'a [PhysicalMonitor], layout_mode: LayoutMode) -> Self {
        Self {
            monitors,
            layout_mode,
        }
    }

    /// Position `candidate`
    ///
    /// `previous_primary` is the connector that was primary before the
    /// toggle; it wins when the candidate has zero or several primaries.
    /// The primary is moved to the front and placed at (0, 0); the others
    /// follow left to right in candidate order at y = 0.
    pub fn position(
        &self,
        mut candidate: Vec<LogicalMonitor>,
        previous_primary: Option<&str>,
    ) -> Vec<LogicalMonitor> {
        if candidate.is_empty() {
            return candidate;
        }

        let primary_count = candidate.iter().filter(|lm| lm.primary).count();
        let primary_idx = if primary_count == 1 {
            candidate.iter().position(|lm| lm.primary).unwrap_or(0)
        } else {
            let idx = previous_primary
                .and_then(|c| candidate.iter().position(|lm| lm.contains(c)))
                .unwrap_or(0);
            debug!(
                "{} primaries in candidate, electing logical monitor {}",
                primary_count, idx
            );
            idx
        };

        for (idx, lm) in candidate.iter_mut().enumerate() {
            lm.primary = idx == primary_idx;
        }

        let primary = candidate.remove(primary_idx);
        candidate.insert(0, primary);

        let mut current_x = 0i32;
        for lm in &mut candidate {
            lm.x = current_x;
            lm.y = 0;
            current_x += self.effective_width(lm);
        }

        debug!(
            "Positioned {} logical monitor(s), total width {}",
            candidate.len(),
            current_x
        );
        candidate
    }

    /// Horizontal extent of a logical monitor in layout coordinates
    ///
    /// Based on the mode of its first assignment: swapped for quarter
    /// rotations and divided by the scale in logical layout mode.
    pub fn effective_width(&self, lm: &LogicalMonitor) -> i32 {
        let Some(mode) = self.mode_of(lm) else {
            return DEFAULT_MONITOR_WIDTH;
        };

        let width = if lm.transform.is_rotated_quarter() {
            mode.height
        } else {
            mode.width
        };

        let width = match self.layout_mode {
            LayoutMode::Physical => width,
            LayoutMode::Logical if lm.scale > 0.0 => (width as f64 / lm.scale).round() as i32,
            LayoutMode::Logical => width,
        };

        width.max(1)
    }

    /// Vertical extent, mirroring [`effective_width`](Self::effective_width)
    pub fn effective_height(&self, lm: &LogicalMonitor) -> i32 {
        let Some(mode) = self.mode_of(lm) else {
            return DEFAULT_MONITOR_HEIGHT;
        };

        let height = if lm.transform.is_rotated_quarter() {
            mode.width
        } else {
            mode.height
        };

        match self.layout_mode {
            LayoutMode::Logical if lm.scale > 0.0 => {
                ((height as f64 / lm.scale).round() as i32).max(1)
            }
            _ => height.max(1),
        }
    }

    fn mode_of(&self, lm: &LogicalMonitor) -> Option<&'a DisplayMode> {
        let assignment = lm.monitors.first()?;
        let monitor = self
            .monitors
            .iter()
            .find(|m| m.connector == assignment.connector)?;
        monitor.mode(assignment.mode_id.as_deref()?)
    }

    /// Bounding box of `layout`
    pub fn virtual_desktop(&self, layout: &[LogicalMonitor]) -> Option<VirtualDesktop> {
        if layout.is_empty() {
            return None;
        }

        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;

        for lm in layout {
            min_x = min_x.min(lm.x);
            min_y = min_y.min(lm.y);
            max_x = max_x.max(lm.x + self.effective_width(lm));
            max_y = max_y.max(lm.y + self.effective_height(lm));
        }

        Some(VirtualDesktop {
            width: (max_x - min_x) as u32,
            height: (max_y - min_y) as u32,
            offset_x: min_x,
            offset_y: min_y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multimon::types::{MonitorAssignment, Properties, Transform};

    fn monitor(connector: &str, width: i32, height: i32) -> PhysicalMonitor {
        PhysicalMonitor {
            connector: connector.to_string(),
            vendor: String::new(),
            product: String::new(),
            serial: String::new(),
            modes: vec![DisplayMode {
                id: format!("{}x{}", width, height),
                width,
                height,
                refresh_rate: 60.0,
                is_current: true,
                is_preferred: true,
            }],
            is_builtin: false,
            display_name: None,
        }
    }

    fn logical(connector: &str, mode: &str, primary: bool) -> LogicalMonitor {
        LogicalMonitor {
            x: 500,
            y: 500,
            scale: 1.0,
            transform: Transform::Normal,
            primary,
            monitors: vec![MonitorAssignment::new(connector, Some(mode.to_string()))],
            properties: Properties::new(),
        }
    }

    fn monitors() -> Vec<PhysicalMonitor> {
        vec![
            monitor("eDP-1", 2560, 1440),
            monitor("HDMI-1", 1920, 1080),
            monitor("DP-1", 1280, 720),
        ]
    }

    // =========================================================================
    // Tiling
    // =========================================================================

    #[test]
    fn test_horizontal_tiling_mixed_resolutions() {
        let monitors = monitors();
        let positioner = LayoutPositioner::new(&monitors, LayoutMode::Logical);
        let layout = positioner.position(
            vec![
                logical("eDP-1", "2560x1440", true),
                logical("HDMI-1", "1920x1080", false),
                logical("DP-1", "1280x720", false),
            ],
            None,
        );

        assert_eq!((layout[0].x, layout[0].y), (0, 0));
        assert_eq!((layout[1].x, layout[1].y), (2560, 0));
        assert_eq!((layout[2].x, layout[2].y), (2560 + 1920, 0));
        assert!(layout[0].primary);
        assert!(!layout[1].primary && !layout[2].primary);
    }

    #[test]
    fn test_primary_moved_first() {
        let monitors = monitors();
        let positioner = LayoutPositioner::new(&monitors, LayoutMode::Logical);
        let layout = positioner.position(
            vec![
                logical("HDMI-1", "1920x1080", false),
                logical("eDP-1", "2560x1440", true),
            ],
            None,
        );

        assert!(layout[0].contains("eDP-1"));
        assert_eq!(layout[0].x, 0);
        assert_eq!(layout[1].x, 2560);
    }

    // =========================================================================
    // Primary Election
    // =========================================================================

    #[test]
    fn test_no_primary_prefers_previous_primary() {
        let monitors = monitors();
        let positioner = LayoutPositioner::new(&monitors, LayoutMode::Logical);
        let layout = positioner.position(
            vec![
                logical("HDMI-1", "1920x1080", false),
                logical("eDP-1", "2560x1440", false),
            ],
            Some("eDP-1"),
        );

        assert!(layout[0].primary);
        assert!(layout[0].contains("eDP-1"));
        assert_eq!(layout.iter().filter(|lm| lm.primary).count(), 1);
    }

    #[test]
    fn test_several_primaries_fall_back_to_first() {
        let monitors = monitors();
        let positioner = LayoutPositioner::new(&monitors, LayoutMode::Logical);
        let layout = positioner.position(
            vec![
                logical("HDMI-1", "1920x1080", true),
                logical("eDP-1", "2560x1440", true),
            ],
            Some("DP-7"),
        );

        assert!(layout[0].contains("HDMI-1"));
        assert_eq!(layout.iter().filter(|lm| lm.primary).count(), 1);
    }

    // =========================================================================
    // Effective Size
    // =========================================================================

    #[test]
    fn test_scale_in_logical_and_physical_modes() {
        let monitors = monitors();
        let mut lm = logical("eDP-1", "2560x1440", true);
        lm.scale = 2.0;

        let logical_mode = LayoutPositioner::new(&monitors, LayoutMode::Logical);
        assert_eq!(logical_mode.effective_width(&lm), 1280);

        let physical_mode = LayoutPositioner::new(&monitors, LayoutMode::Physical);
        assert_eq!(physical_mode.effective_width(&lm), 2560);
    }

    #[test]
    fn test_rotated_monitor_uses_height() {
        let monitors = monitors();
        let mut lm = logical("HDMI-1", "1920x1080", false);
        lm.transform = Transform::Rotate90;

        let positioner = LayoutPositioner::new(&monitors, LayoutMode::Logical);
        assert_eq!(positioner.effective_width(&lm), 1080);
        assert_eq!(positioner.effective_height(&lm), 1920);
    }

    #[test]
    fn test_unknown_mode_uses_default_width() {
        let monitors = monitors();
        let lm = logical("HDMI-1", "640x480", false);

        let positioner = LayoutPositioner::new(&monitors, LayoutMode::Logical);
        assert_eq!(positioner.effective_width(&lm), DEFAULT_MONITOR_WIDTH);
    }

    #[test]
    fn test_virtual_desktop_bounds() {
        let monitors = monitors();
        let positioner = LayoutPositioner::new(&monitors, LayoutMode::Logical);
        let layout = positioner.position(
            vec![
                logical("eDP-1", "2560x1440", true),
                logical("HDMI-1", "1920x1080", false),
            ],
            None,
        );

        let desktop = positioner.virtual_desktop(&layout).unwrap();
        assert_eq!(desktop.width, 4480);
        assert_eq!(desktop.height, 1440);
        assert_eq!((desktop.offset_x, desktop.offset_y), (0, 0));
        assert!(positioner.virtual_desktop(&[]).is_none());
    }
}
