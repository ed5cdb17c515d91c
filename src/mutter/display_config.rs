//! Mutter DisplayConfig D-Bus Interface
//!
//! Proxy for org.gnome.Mutter.DisplayConfig, the interface GNOME Settings
//! uses to read and change the monitor layout.
//!
//! ```text
//! GetCurrentState() -> (u serial,
//!                       a((ssss)a(siiddada{sv})a{sv}) monitors,
//!                       a(iiduba(ssss)a{sv}) logical_monitors,
//!                       a{sv} properties)
//!
//! ApplyMonitorsConfig(u serial, u method,
//!                     a(iiduba(ssa{sv})) logical_monitors,
//!                     a{sv} properties)
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};
use zbus::zvariant::{OwnedValue, Type, Value};
use zbus::Connection;

use crate::multimon::{
    self, DisplayConfigService, DisplayMode, DisplaySnapshot, GlobalProperties, LayoutMode,
    LogicalMonitor, MonitorAssignment, MultiMonitorError, PersistenceMode, PhysicalMonitor,
    Properties, PropertyValue, Transform,
};

/// Well-known bus name and interface
pub const DISPLAY_CONFIG_SERVICE: &str = "org.gnome.Mutter.DisplayConfig";

/// Object path
pub const DISPLAY_CONFIG_PATH: &str = "/org/gnome/Mutter/DisplayConfig";

/// `(ssss)`: connector, vendor, product, serial
#[derive(Debug, Clone, Deserialize, Type)]
struct MonitorSpec {
    connector: String,
    vendor: String,
    product: String,
    serial: String,
}

/// `(siiddada{sv})`
#[derive(Debug, Deserialize, Type)]
struct WireMode {
    id: String,
    width: i32,
    height: i32,
    refresh_rate: f64,
    #[allow(dead_code)]
    preferred_scale: f64,
    #[allow(dead_code)]
    supported_scales: Vec<f64>,
    properties: HashMap<String, OwnedValue>,
}

/// `((ssss)a(siiddada{sv})a{sv})`
#[derive(Debug, Deserialize, Type)]
struct WireMonitor {
    spec: MonitorSpec,
    modes: Vec<WireMode>,
    properties: HashMap<String, OwnedValue>,
}

/// `(iiduba(ssss)a{sv})`
#[derive(Debug, Deserialize, Type)]
struct WireLogicalMonitor {
    x: i32,
    y: i32,
    scale: f64,
    transform: u32,
    primary: bool,
    monitors: Vec<MonitorSpec>,
    properties: HashMap<String, OwnedValue>,
}

type CurrentState = (
    u32,
    Vec<WireMonitor>,
    Vec<WireLogicalMonitor>,
    HashMap<String, OwnedValue>,
);

/// `(ssa{sv})`
#[derive(Debug, Serialize, Type)]
struct ApplyMonitor<'a> {
    connector: &'a str,
    mode_id: &'a str,
    properties: HashMap<&'a str, Value<'a>>,
}

/// `(iiduba(ssa{sv}))`
#[derive(Debug, Serialize, Type)]
struct ApplyLogicalMonitor<'a> {
    x: i32,
    y: i32,
    scale: f64,
    transform: u32,
    primary: bool,
    monitors: Vec<ApplyMonitor<'a>>,
}

/// DisplayConfig interface proxy
///
/// Service: org.gnome.Mutter.DisplayConfig
/// Path: /org/gnome/Mutter/DisplayConfig
#[derive(Debug)]
pub struct MutterDisplayConfig {
    proxy: zbus::Proxy<'static>,
}

impl MutterDisplayConfig {
    /// Create a new DisplayConfig proxy
    pub async fn new(connection: &Connection) -> Result<Self> {
        let proxy = zbus::ProxyBuilder::new(connection)
            .interface(DISPLAY_CONFIG_SERVICE)?
            .path(DISPLAY_CONFIG_PATH)?
            .destination(DISPLAY_CONFIG_SERVICE)?
            .build()
            .await
            .context("Failed to create Mutter DisplayConfig proxy")?;

        Ok(Self { proxy })
    }

    /// Read monitors, logical monitors and global properties
    pub async fn current_state(&self) -> Result<DisplaySnapshot> {
        let response = self
            .proxy
            .call_method("GetCurrentState", &())
            .await
            .context("Failed to call GetCurrentState")?;

        let body = response.body();
        let state: CurrentState = body
            .deserialize()
            .context("Failed to deserialize GetCurrentState response")?;

        Ok(snapshot_from_wire(state))
    }

    /// Submit a layout
    ///
    /// # Arguments
    ///
    /// * `serial` - Serial of the snapshot the layout was computed from
    /// * `method` - Verify, temporary or persistent
    /// * `logical_monitors` - Complete layout; every assignment needs a mode id
    /// * `properties` - Global properties (e.g. "layout-mode")
    pub async fn apply_config(
        &self,
        serial: u32,
        method: PersistenceMode,
        logical_monitors: &[LogicalMonitor],
        properties: &Properties,
    ) -> Result<()> {
        let wire = logical_monitors
            .iter()
            .map(logical_monitor_to_wire)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "ApplyMonitorsConfig serial={} method={} logical_monitors={}",
            serial,
            method.as_u32(),
            wire.len()
        );
        trace!("ApplyMonitorsConfig payload: {:?}", wire);

        self.proxy
            .call_method(
                "ApplyMonitorsConfig",
                &(serial, method.as_u32(), wire, to_wire_properties(properties)),
            )
            .await
            .context("Failed to call ApplyMonitorsConfig")?;

        Ok(())
    }

    /// Subscribe to MonitorsChanged
    ///
    /// Emitted after every configuration change and on hotplug.
    pub async fn receive_monitors_changed(
        &self,
    ) -> Result<impl futures_util::Stream<Item = zbus::Message>> {
        self.proxy
            .receive_signal("MonitorsChanged")
            .await
            .context("Failed to subscribe to MonitorsChanged signal")
    }
}

#[async_trait]
impl DisplayConfigService for MutterDisplayConfig {
    async fn get_current_state(&self) -> multimon::Result<DisplaySnapshot> {
        self.current_state()
            .await
            .map_err(|e| MultiMonitorError::RemoteUnavailable(format!("{:#}", e)))
    }

    async fn apply_monitors_config(
        &self,
        serial: u32,
        method: PersistenceMode,
        logical_monitors: &[LogicalMonitor],
        properties: &Properties,
    ) -> multimon::Result<()> {
        self.apply_config(serial, method, logical_monitors, properties)
            .await
            .map_err(classify_apply_error)
    }
}

/// Error replies are refusals; anything else means the service is unreachable
fn classify_apply_error(e: anyhow::Error) -> MultiMonitorError {
    match e.downcast_ref::<zbus::Error>() {
        Some(zbus::Error::MethodError(..)) | Some(zbus::Error::FDO(_)) => {
            MultiMonitorError::RemoteRejected(format!("{:#}", e))
        }
        _ => MultiMonitorError::RemoteUnavailable(format!("{:#}", e)),
    }
}

fn snapshot_from_wire(state: CurrentState) -> DisplaySnapshot {
    let (serial, wire_monitors, wire_logical, wire_properties) = state;

    let monitors: Vec<PhysicalMonitor> = wire_monitors.into_iter().map(monitor_from_wire).collect();

    let logical_monitors = wire_logical
        .into_iter()
        .map(|lm| LogicalMonitor {
            x: lm.x,
            y: lm.y,
            scale: lm.scale,
            transform: Transform::from_u32(lm.transform),
            primary: lm.primary,
            monitors: lm
                .monitors
                .iter()
                .map(|spec| {
                    // Logical monitors name monitors, not modes: use the driven mode
                    let mode_id = monitors
                        .iter()
                        .find(|m| m.connector == spec.connector)
                        .and_then(PhysicalMonitor::current_mode)
                        .map(|mode| mode.id.clone());
                    MonitorAssignment::new(spec.connector.clone(), mode_id)
                })
                .collect(),
            properties: from_wire_properties(&lm.properties),
        })
        .collect();

    let mut extra = from_wire_properties(&wire_properties);
    let properties = GlobalProperties {
        layout_mode: extra
            .remove("layout-mode")
            .and_then(|v| v.as_u32())
            .map(LayoutMode::from_u32)
            .unwrap_or_default(),
        supports_changing_layout_mode: extra
            .remove("supports-changing-layout-mode")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        global_scale_required: extra
            .remove("global-scale-required")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        extra,
    };

    DisplaySnapshot {
        serial,
        monitors,
        logical_monitors,
        properties,
    }
}

fn monitor_from_wire(wire: WireMonitor) -> PhysicalMonitor {
    let properties = from_wire_properties(&wire.properties);

    let modes = wire
        .modes
        .into_iter()
        .map(|mode| {
            let props = from_wire_properties(&mode.properties);
            let flag = |key: &str| props.get(key).and_then(PropertyValue::as_bool).unwrap_or(false);
            DisplayMode {
                is_current: flag("is-current"),
                is_preferred: flag("is-preferred"),
                id: mode.id,
                width: mode.width,
                height: mode.height,
                refresh_rate: mode.refresh_rate,
            }
        })
        .collect();

    PhysicalMonitor {
        connector: wire.spec.connector,
        vendor: wire.spec.vendor,
        product: wire.spec.product,
        serial: wire.spec.serial,
        modes,
        is_builtin: properties
            .get("is-builtin")
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false),
        display_name: properties
            .get("display-name")
            .and_then(PropertyValue::as_str)
            .map(str::to_string),
    }
}

fn from_wire_properties(dict: &HashMap<String, OwnedValue>) -> Properties {
    dict.iter()
        .filter_map(|(key, value)| match property_value(value) {
            Some(v) => Some((key.clone(), v)),
            None => {
                trace!(
                    "Skipping property '{}' of type {}",
                    key,
                    value.value_signature()
                );
                None
            }
        })
        .collect()
}

fn property_value(value: &Value<'_>) -> Option<PropertyValue> {
    Some(match value {
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::U8(v) => PropertyValue::U32(u32::from(*v)),
        Value::U16(v) => PropertyValue::U32(u32::from(*v)),
        Value::U32(v) => PropertyValue::U32(*v),
        Value::I16(v) => PropertyValue::I32(i32::from(*v)),
        Value::I32(v) => PropertyValue::I32(*v),
        Value::F64(v) => PropertyValue::F64(*v),
        Value::Str(s) => PropertyValue::Str(s.as_str().to_string()),
        Value::Value(inner) => return property_value(inner),
        _ => return None,
    })
}

fn logical_monitor_to_wire(lm: &LogicalMonitor) -> Result<ApplyLogicalMonitor<'_>> {
    let mut monitors = Vec::with_capacity(lm.monitors.len());
    for m in &lm.monitors {
        let mode_id = m
            .mode_id
            .as_deref()
            .with_context(|| format!("No mode for {}", m.connector))?;
        monitors.push(ApplyMonitor {
            connector: &m.connector,
            mode_id,
            properties: to_wire_properties(&m.properties),
        });
    }

    Ok(ApplyLogicalMonitor {
        x: lm.x,
        y: lm.y,
        scale: lm.scale,
        transform: lm.transform.as_u32(),
        primary: lm.primary,
        monitors,
    })
}

fn to_wire_properties(properties: &Properties) -> HashMap<&str, Value<'_>> {
    properties
        .iter()
        .map(|(key, value)| {
            let value = match value {
                PropertyValue::Bool(b) => Value::from(*b),
                PropertyValue::U32(v) => Value::from(*v),
                PropertyValue::I32(v) => Value::from(*v),
                PropertyValue::F64(v) => Value::from(*v),
                PropertyValue::Str(s) => Value::from(s.as_str()),
            };
            (key.as_str(), value)
        })
        .collect()
}
