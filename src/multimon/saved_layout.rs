//! Saved Layout Store
//!
//! Reads per-connector geometry from the desktop's persisted monitor
//! configuration (`~/.config/monitors.xml`). The document is a sequence of
//! `<configuration>` blocks, each holding `<logicalmonitor>` blocks:
//!
//! ```text
//! <monitors version="2">
//!   <configuration>
//!     <logicalmonitor>
//!       <x>1920</x><y>0</y><scale>1</scale>
//!       <transform><rotation>left</rotation></transform>
//!       <monitor>
//!         <monitorspec><connector>HDMI-1</connector>...</monitorspec>
//!       </monitor>
//!     </logicalmonitor>
//!   </configuration>
//! </monitors>
//! ```
//!
//! Lookups scan configurations and logical monitors in document order and
//! return the first logical monitor whose connector matches and which carries
//! complete geometry. A missing, unreadable or malformed document is simply
//! "no saved geometry".

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::types::{SavedConnectorConfig, Transform};

/// Read-only access to the saved layout document
#[derive(Debug, Clone, Default)]
pub struct SavedLayoutStore {
    path: Option<PathBuf>,
}

impl SavedLayoutStore {
    /// Store backed by the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store that never has saved geometry
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// `$XDG_CONFIG_HOME/monitors.xml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("monitors.xml"))
    }

    /// Document path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Saved geometry for `connector`
    ///
    /// The document is re-read on every call so edits made by the desktop
    /// between toggles are picked up.
    pub fn lookup(&self, connector: &str) -> Option<SavedConnectorConfig> {
        let path = self.path.as_ref()?;

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("Saved layout {:?} not readable: {}", path, e);
                return None;
            }
        };

        let found = parse_saved_layout(&contents, connector);
        match &found {
            Some(config) => debug!("Saved geometry for {}: {:?}", connector, config),
            None => debug!("No saved geometry for {} in {:?}", connector, path),
        }
        found
    }
}

/// Geometry collected from one `<logicalmonitor>` block
#[derive(Debug, Default)]
struct LogicalMonitorBlock {
    x: Option<i32>,
    y: Option<i32>,
    scale: Option<f64>,
    rotation: Option<String>,
    connectors: Vec<String>,
}

impl LogicalMonitorBlock {
    fn into_config(self, connector: &str) -> Option<SavedConnectorConfig> {
        if !self.connectors.iter().any(|c| c == connector) {
            return None;
        }

        Some(SavedConnectorConfig {
            x: self.x?,
            y: self.y?,
            // Scale must be usable as-is by the service
            scale: self.scale.filter(|s| s.is_finite() && *s > 0.0)?,
            transform: self
                .rotation
                .as_deref()
                .map(Transform::from_rotation)
                .unwrap_or_default(),
        })
    }
}

/// Search `document` for saved geometry of `connector`
pub fn parse_saved_layout(document: &str, connector: &str) -> Option<SavedConnectorConfig> {
    let mut reader = Reader::from_str(document);
    reader.trim_text(true);

    // Element names from the document root down to the current element
    let mut path: Vec<String> = Vec::new();
    let mut in_configuration = false;
    let mut block: Option<LogicalMonitorBlock> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "configuration" => in_configuration = true,
                    "logicalmonitor" if in_configuration => {
                        block = Some(LogicalMonitorBlock::default());
                    }
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"configuration" => in_configuration = false,
                    b"logicalmonitor" => {
                        if let Some(config) = block.take().and_then(|b| b.into_config(connector)) {
                            return Some(config);
                        }
                    }
                    _ => {}
                }
                path.pop();
            }
            Ok(Event::Text(e)) => {
                let Some(current) = block.as_mut() else {
                    continue;
                };
                let Ok(text) = e.unescape() else {
                    continue;
                };
                let text = text.trim();

                // Direct children of <logicalmonitor> carry the geometry
                let parent = path.len().checked_sub(2).and_then(|i| path.get(i));
                let is_direct = parent.map(String::as_str) == Some("logicalmonitor");

                match path.last().map(String::as_str) {
                    Some("x") if is_direct => current.x = text.parse().ok(),
                    Some("y") if is_direct => current.y = text.parse().ok(),
                    Some("scale") if is_direct => current.scale = text.parse().ok(),
                    Some("rotation") => current.rotation = Some(text.to_string()),
                    Some("connector") => current.connectors.push(text.to_string()),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(
                    "Malformed saved layout at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                break;
            }
            _ => {}
        }
    }

    None
}
