//! Settle-driven, debounced viewport tracking

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use curbside_domain::CameraRepository;
use curbside_types::{CameraState, LngLatBounds};

use crate::visible::VisibleTrucks;

/// Publishes viewport bounds to the visible set once gestures settle.
///
/// Camera state is saved on every settle; bounds publication waits for
/// `delay` of quiet and only the last settle wins.
pub struct ViewportTracker {
    delay: Duration,
    visible: VisibleTrucks,
    camera_repo: Option<Arc<dyn CameraRepository>>,
    last_camera: Option<CameraState>,
    pending: Option<JoinHandle<()>>,
}

impl ViewportTracker {
    pub fn new(delay: Duration, visible: VisibleTrucks, camera_repo: Option<Arc<dyn CameraRepository>>) -> Self {
        Self {
            delay,
            visible,
            camera_repo,
            last_camera: None,
            pending: None,
        }
    }

    /// Handle a move-end or zoom-end
    pub fn on_settle(&mut self, camera: CameraState, bounds: LngLatBounds) {
        self.last_camera = Some(camera);
        if let Some(repo) = &self.camera_repo {
            if let Err(e) = repo.save(&camera) {
                tracing::warn!(error = %e, "failed to persist camera state");
            }
        }

        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        let visible = self.visible.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            visible.set_bounds(Some(bounds));
        }));
    }

    /// Drop any unpublished bounds
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
            tracing::debug!("pending viewport update cancelled");
        }
    }

    /// Wait for the pending publication, if any
    pub async fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.await;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.is_finished())
    }

    pub fn last_camera(&self) -> Option<CameraState> {
        self.last_camera
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for ViewportTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}
