//! Configuration Submission
//!
//! Submits a finished layout to the display configuration service and owns
//! the delayed re-read that follows every submission. The service settles
//! asynchronously (mode sets, hotplug re-probing), so the authoritative
//! post-apply state is only fetched after a short delay; nothing is committed
//! locally in the meantime.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::service::DisplayConfigService;
use super::types::{
    DisplaySnapshot, GlobalProperties, LogicalMonitor, PersistenceMode, Properties, PropertyValue,
};
use super::{Rejection, Result};

/// One-shot delayed task that replaces itself when rescheduled
///
/// Dropping the timer aborts a pending task.
#[derive(Debug)]
pub struct RefreshTimer {
    delay: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshTimer {
    /// Timer firing `delay` after each [`schedule`](Self::schedule)
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: Mutex::new(None),
        }
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the delay, aborting any task still pending
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        if let Some(previous) = self.handle.lock().replace(handle) {
            if !previous.is_finished() {
                debug!("Replacing pending refresh");
            }
            previous.abort();
        }
    }

    /// Abort the pending task. Returns true if one was still waiting.
    pub fn cancel(&self) -> bool {
        match self.handle.lock().take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    /// True while a scheduled task has not completed
    pub fn is_pending(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the scheduled task, if any, to finish
    pub async fn settled(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            // Aborted tasks resolve with a cancellation error
            let _ = handle.await;
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

/// Submits layouts and schedules the settle refresh
pub struct ConfigApplier {
    service: Arc<dyn DisplayConfigService>,
    timer: RefreshTimer,
}

impl ConfigApplier {
    /// Applier over `service`, refreshing `settle_delay` after each submission
    pub fn new(service: Arc<dyn DisplayConfigService>, settle_delay: Duration) -> Self {
        Self {
            service,
            timer: RefreshTimer::new(settle_delay),
        }
    }

    /// Submit `layout`, computed from `snapshot`, with `method`
    ///
    /// # Arguments
    ///
    /// * `snapshot` - State the layout was derived from; supplies the serial
    ///   and the global properties
    /// * `layout` - Final, positioned logical monitors
    /// * `method` - Persistence mode for this submission
    ///
    /// # Errors
    ///
    /// [`Rejection::EmptyResult`] for an empty layout (nothing is sent), or
    /// the service's `RemoteUnavailable`/`RemoteRejected`.
    pub async fn apply(
        &self,
        snapshot: &DisplaySnapshot,
        layout: &[LogicalMonitor],
        method: PersistenceMode,
    ) -> Result<()> {
        if layout.is_empty() {
            return Err(Rejection::EmptyResult.into());
        }

        let properties = apply_properties(&snapshot.properties);

        info!(
            "Applying {} logical monitor(s) with serial {} ({})",
            layout.len(),
            snapshot.serial,
            method
        );
        for lm in layout {
            debug!(
                "  ({}, {}) scale {} {:?}{} {:?}",
                lm.x,
                lm.y,
                lm.scale,
                lm.transform,
                if lm.primary { " primary" } else { "" },
                lm.monitors
                    .iter()
                    .map(|m| format!("{}:{}", m.connector, m.mode_id.as_deref().unwrap_or("?")))
                    .collect::<Vec<_>>()
            );
        }

        match self
            .service
            .apply_monitors_config(snapshot.serial, method, layout, &properties)
            .await
        {
            Ok(()) => {
                info!("Display configuration accepted");
                Ok(())
            }
            Err(e) => {
                error!("Display configuration failed: {}", e);
                Err(e)
            }
        }
    }

    /// Run `refresh` once the settle delay has passed, replacing a pending one
    pub fn schedule_refresh<F>(&self, refresh: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!("Refresh scheduled in {:?}", self.timer.delay());
        self.timer.schedule(refresh);
    }

    /// Abort a pending refresh
    pub fn cancel_refresh(&self) -> bool {
        self.timer.cancel()
    }

    /// True while a refresh is waiting or running
    pub fn refresh_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Wait for the pending refresh to complete
    pub async fn settled(&self) {
        self.timer.settled().await;
    }
}

/// Global properties sent with an apply call
///
/// The layout mode is echoed back only when the service allows changing it;
/// otherwise the map stays empty.
pub fn apply_properties(global: &GlobalProperties) -> Properties {
    let mut properties = Properties::new();
    if global.supports_changing_layout_mode {
        properties.insert(
            "layout-mode".to_string(),
            PropertyValue::U32(global.layout_mode.as_u32()),
        );
    }
    properties
}
