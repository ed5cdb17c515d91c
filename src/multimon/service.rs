//! Display Configuration Service Seam
//!
//! The reconciliation engine talks to the desktop's display configuration
//! service only through this trait. The production implementation is the
//! Mutter D-Bus proxy; tests inject in-memory fakes or mocks.

use async_trait::async_trait;

use super::types::{DisplaySnapshot, LogicalMonitor, PersistenceMode, Properties};
use super::Result;

/// Remote display configuration service
///
/// Implementations map transport failures to
/// [`MultiMonitorError::RemoteUnavailable`](super::MultiMonitorError::RemoteUnavailable)
/// and refusals of an apply call to
/// [`MultiMonitorError::RemoteRejected`](super::MultiMonitorError::RemoteRejected).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DisplayConfigService: Send + Sync {
    /// Fetch the current monitors, layout and global properties
    async fn get_current_state(&self) -> Result<DisplaySnapshot>;

    /// Submit a complete layout
    ///
    /// `serial` must be the serial of the snapshot the layout was computed
    /// from; the service refuses stale serials.
    async fn apply_monitors_config(
        &self,
        serial: u32,
        method: PersistenceMode,
        logical_monitors: &[LogicalMonitor],
        properties: &Properties,
    ) -> Result<()>;
}
