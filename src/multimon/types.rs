//! Display Configuration Data Model
//!
//! Transport-independent view of the state reported by the display
//! configuration service: physical monitors with their modes, the logical
//! monitors currently laid out on the desktop, and the global properties.
//!
//! Everything here is plain owned data (`Clone + PartialEq`) so that a
//! snapshot can be handed through the plan → resolve → position pipeline by
//! value and compared in tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mode id the service uses to mark a mode as deleted. Never a valid mode.
pub const DELETED_MODE_ID: &str = "DEL";

/// Returns true if `id` can name a real mode.
///
/// Mode ids are opaque, snapshot-scoped strings. The empty string and the
/// deletion marker never refer to a usable mode.
pub fn is_valid_mode_id(id: &str) -> bool {
    !id.is_empty() && id != DELETED_MODE_ID
}

/// Loosely-typed property value carried in the service's `a{sv}` maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Unsigned integer
    U32(u32),
    /// Signed integer
    I32(i32),
    /// Floating point value
    F64(f64),
    /// String value
    Str(String),
}

impl PropertyValue {
    /// Boolean content, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Unsigned content, accepting non-negative signed values too
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            Self::I32(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// String content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Property map with deterministic iteration order
pub type Properties = BTreeMap<String, PropertyValue>;

/// Logical monitor transform
///
/// Numeric values match the service's wire encoding. The four rotations are
/// what the saved layout document can express (normal, left, upside-down,
/// right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transform {
    /// No rotation
    #[default]
    Normal,
    /// 90° ("left")
    Rotate90,
    /// 180° ("upside-down")
    Rotate180,
    /// 270° ("right")
    Rotate270,
    /// Flipped
    Flipped,
    /// Flipped + 90°
    Flipped90,
    /// Flipped + 180°
    Flipped180,
    /// Flipped + 270°
    Flipped270,
}

impl Transform {
    /// Decode the wire value; unknown values fall back to `Normal`
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Rotate90,
            2 => Self::Rotate180,
            3 => Self::Rotate270,
            4 => Self::Flipped,
            5 => Self::Flipped90,
            6 => Self::Flipped180,
            7 => Self::Flipped270,
            _ => Self::Normal,
        }
    }

    /// Wire value
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Rotate90 => 1,
            Self::Rotate180 => 2,
            Self::Rotate270 => 3,
            Self::Flipped => 4,
            Self::Flipped90 => 5,
            Self::Flipped180 => 6,
            Self::Flipped270 => 7,
        }
    }

    /// Map a saved-layout rotation token; unrecognised tokens are `Normal`
    pub fn from_rotation(token: &str) -> Self {
        match token {
            "left" => Self::Rotate90,
            "upside-down" => Self::Rotate180,
            "right" => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    /// True when the output is turned on its side (width and height swap)
    pub fn is_rotated_quarter(self) -> bool {
        matches!(
            self,
            Self::Rotate90 | Self::Rotate270 | Self::Flipped90 | Self::Flipped270
        )
    }
}

/// One display mode of a physical monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMode {
    /// Snapshot-scoped mode id
    pub id: String,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
    /// Refresh rate in Hz
    pub refresh_rate: f64,
    /// Mode is the one currently driven
    pub is_current: bool,
    /// Mode is the monitor's preferred mode
    pub is_preferred: bool,
}

impl DisplayMode {
    /// `"1920×1080 @ 60.0Hz"`
    pub fn describe(&self) -> String {
        format!(
            "{}×{} @ {:.1}Hz",
            self.width, self.height, self.refresh_rate
        )
    }

    /// `"1920×1080"`
    pub fn describe_size(&self) -> String {
        format!("{}×{}", self.width, self.height)
    }
}

/// A connected physical display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalMonitor {
    /// Connector name, e.g. "HDMI-1"
    pub connector: String,
    /// Vendor string
    pub vendor: String,
    /// Product string
    pub product: String,
    /// Serial string
    pub serial: String,
    /// Modes in service order
    pub modes: Vec<DisplayMode>,
    /// Built-in panel (laptop display)
    pub is_builtin: bool,
    /// Human readable name supplied by the service, if any
    pub display_name: Option<String>,
}

impl PhysicalMonitor {
    /// Modes whose ids can be submitted
    pub fn valid_modes(&self) -> impl Iterator<Item = &DisplayMode> {
        self.modes.iter().filter(|m| is_valid_mode_id(&m.id))
    }

    /// Look up a valid mode by id
    pub fn mode(&self, id: &str) -> Option<&DisplayMode> {
        self.valid_modes().find(|m| m.id == id)
    }

    /// Mode currently driven, if the monitor is lit
    pub fn current_mode(&self) -> Option<&DisplayMode> {
        self.valid_modes().find(|m| m.is_current)
    }

    /// Fallback mode: the preferred valid mode, else the first valid one
    pub fn fallback_mode(&self) -> Option<&DisplayMode> {
        self.valid_modes()
            .find(|m| m.is_preferred)
            .or_else(|| self.valid_modes().next())
    }

    /// Short display name: product, then service display name, then connector
    pub fn short_name(&self) -> String {
        if !self.product.trim().is_empty() {
            return self.product.trim().to_string();
        }
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        self.connector.clone()
    }

    /// Long display name including the connector
    pub fn long_name(&self) -> String {
        let vendor = self.vendor.trim();
        let product = self.product.trim();

        if product.is_empty() {
            return self.connector.clone();
        }
        if vendor.is_empty() || product.to_uppercase().contains(&vendor.to_uppercase()) {
            format!("{} ({})", product, self.connector)
        } else {
            format!("{} {} ({})", vendor, product, self.connector)
        }
    }
}

/// A (connector, mode) pair inside a logical monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorAssignment {
    /// Connector of the physical monitor
    pub connector: String,
    /// Mode id; `None` when the current mode is unknown
    pub mode_id: Option<String>,
    /// Per-monitor properties (e.g. "enable_underscanning")
    pub properties: Properties,
}

impl MonitorAssignment {
    /// Assignment without properties
    pub fn new(connector: impl Into<String>, mode_id: Option<String>) -> Self {
        Self {
            connector: connector.into(),
            mode_id,
            properties: Properties::new(),
        }
    }
}

/// A positioned region of the desktop shown on one or more monitors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalMonitor {
    /// X position
    pub x: i32,
    /// Y position
    pub y: i32,
    /// Scale factor (> 0)
    pub scale: f64,
    /// Rotation / flip
    pub transform: Transform,
    /// Primary flag
    pub primary: bool,
    /// Monitors showing this region (more than one means mirroring)
    pub monitors: Vec<MonitorAssignment>,
    /// Extra properties reported by the service
    pub properties: Properties,
}

impl LogicalMonitor {
    /// True if `connector` is assigned to this logical monitor
    pub fn contains(&self, connector: &str) -> bool {
        self.monitors.iter().any(|m| m.connector == connector)
    }

    /// Connector of the first assignment
    pub fn first_connector(&self) -> Option<&str> {
        self.monitors.first().map(|m| m.connector.as_str())
    }

    /// True if both logical monitors drive the same set of connectors
    pub fn same_connectors(&self, other: &LogicalMonitor) -> bool {
        self.monitors.len() == other.monitors.len()
            && self.monitors.iter().all(|m| other.contains(&m.connector))
    }
}

/// How logical monitor sizes relate to mode sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Size is mode size divided by scale
    #[default]
    Logical,
    /// Size is mode size
    Physical,
}

impl LayoutMode {
    /// Decode wire value (1 logical, 2 physical); others default to logical
    pub fn from_u32(value: u32) -> Self {
        match value {
            2 => Self::Physical,
            _ => Self::Logical,
        }
    }

    /// Wire value
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Logical => 1,
            Self::Physical => 2,
        }
    }
}

/// Global properties of a snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalProperties {
    /// Layout mode in effect
    pub layout_mode: LayoutMode,
    /// Whether the layout mode may be changed (and therefore sent back)
    pub supports_changing_layout_mode: bool,
    /// All logical monitors must share one scale
    pub global_scale_required: bool,
    /// Remaining properties, uninterpreted
    pub extra: Properties,
}

/// Everything the service reported in one `GetCurrentState` call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    /// Optimistic concurrency token
    pub serial: u32,
    /// Connected monitors
    pub monitors: Vec<PhysicalMonitor>,
    /// Current layout
    pub logical_monitors: Vec<LogicalMonitor>,
    /// Global properties
    pub properties: GlobalProperties,
}

impl DisplaySnapshot {
    /// Physical monitor by connector
    pub fn monitor(&self, connector: &str) -> Option<&PhysicalMonitor> {
        self.monitors.iter().find(|m| m.connector == connector)
    }

    /// True if `connector` is shown by any logical monitor
    pub fn is_active(&self, connector: &str) -> bool {
        self.logical_monitors.iter().any(|lm| lm.contains(connector))
    }

    /// True if `connector` belongs to the primary logical monitor
    pub fn is_primary(&self, connector: &str) -> bool {
        self.logical_monitors
            .iter()
            .any(|lm| lm.primary && lm.contains(connector))
    }

    /// The primary logical monitor
    pub fn primary(&self) -> Option<&LogicalMonitor> {
        self.logical_monitors.iter().find(|lm| lm.primary)
    }

    /// First connector of the primary logical monitor
    pub fn primary_connector(&self) -> Option<&str> {
        self.primary().and_then(LogicalMonitor::first_connector)
    }

    /// Mode the given connector is currently driven with
    pub fn active_mode(&self, connector: &str) -> Option<&DisplayMode> {
        let monitor = self.monitor(connector)?;
        let assigned = self
            .logical_monitors
            .iter()
            .flat_map(|lm| lm.monitors.iter())
            .find(|a| a.connector == connector)?;

        assigned
            .mode_id
            .as_deref()
            .and_then(|id| monitor.mode(id))
            .or_else(|| monitor.current_mode())
    }
}

/// The first non-empty layout seen since startup
///
/// Captured once and never refreshed: it anchors the layout the user had
/// before any toggling and serves as the template when a monitor is turned
/// back on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginalLayoutCache {
    layout: Option<Vec<LogicalMonitor>>,
}

impl OriginalLayoutCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-filled with a layout (empty layouts are ignored)
    pub fn with_layout(layout: Vec<LogicalMonitor>) -> Self {
        let mut cache = Self::new();
        cache.capture(&layout);
        cache
    }

    /// Record `layout` if nothing has been captured yet and it is non-empty.
    /// Returns true if this call captured it.
    pub fn capture(&mut self, layout: &[LogicalMonitor]) -> bool {
        if self.layout.is_some() || layout.is_empty() {
            return false;
        }
        self.layout = Some(layout.to_vec());
        true
    }

    /// True once a layout has been captured
    pub fn is_captured(&self) -> bool {
        self.layout.is_some()
    }

    /// Captured logical monitors that contain `connector`
    pub fn templates_for<'a>(
        &'a self,
        connector: &'a str,
    ) -> impl Iterator<Item = &'a LogicalMonitor> + 'a {
        self.layout
            .iter()
            .flatten()
            .filter(move |lm| lm.contains(connector))
    }
}

/// Geometry persisted for a connector in the saved layout document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedConnectorConfig {
    /// X position
    pub x: i32,
    /// Y position
    pub y: i32,
    /// Scale
    pub scale: f64,
    /// Rotation
    pub transform: Transform,
}

/// Method passed to `ApplyMonitorsConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Validate only, change nothing
    Verify,
    /// Apply until the next reboot/login
    Temporary,
    /// Apply and store; the desktop asks the user to confirm
    #[default]
    Persistent,
}

impl PersistenceMode {
    /// Wire value
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Verify => 0,
            Self::Temporary => 1,
            Self::Persistent => 2,
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Verify => "Verify",
            Self::Temporary => "Temporary",
            Self::Persistent => "Persistent",
        }
    }

    /// One-line explanation
    pub fn description(self) -> &'static str {
        match self {
            Self::Verify => "Changes are validated but not applied.",
            Self::Temporary => "Changes are temporary and reset on reboot.",
            Self::Persistent => "Changes are saved and require confirmation.",
        }
    }
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PersistenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verify" => Ok(Self::Verify),
            "temporary" | "temp" => Ok(Self::Temporary),
            "persistent" => Ok(Self::Persistent),
            other => Err(format!("unknown persistence mode: {}", other)),
        }
    }
}
