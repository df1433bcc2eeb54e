//! User location: permission, single-shot position fix, "you are here"
//! marker, and persistence of the last known position.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use curbside_domain::LocationRepository;
use curbside_types::{CameraState, LatLng, LocationError, PermissionState, StoredLocation};

use crate::surface::{CameraTransition, MapSurface, MarkerId, SurfaceHandle};

/// Device geolocation
#[async_trait]
pub trait Geolocation: Send + Sync {
    /// Current permission without prompting
    async fn permission(&self) -> PermissionState;

    /// One position fix. A `Prompt` permission is resolved by this call.
    async fn current_position(&self) -> Result<LatLng, LocationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "position", rename_all = "lowercase")]
pub enum LocationState {
    Unknown,
    Granted,
    Denied,
    Locating,
    Located(LatLng),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    Located(LatLng),
    /// A request was already running; nothing new was started
    AlreadyInFlight,
    Denied,
    Failed(LocationError),
}

impl std::fmt::Display for LocateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocateOutcome::Located(position) => write!(f, "located at {}", position),
            LocateOutcome::AlreadyInFlight => write!(f, "request already in flight"),
            LocateOutcome::Denied => write!(f, "permission denied"),
            LocateOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Visual state of the locate control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocateButton {
    Hidden,
    Idle,
    Locating,
    Active,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    /// Minimum zoom after a successful fix
    pub locate_zoom: f64,
    pub fly_duration_ms: u64,
}

struct TrackerState {
    state: LocationState,
    marker: Option<MarkerId>,
    last_position: Option<LatLng>,
}

/// Location state machine bound to one map session.
///
/// Clones share state, so a clone can run a request in a spawned task
/// while another observes it.
pub struct UserLocationTracker<S> {
    geolocation: Arc<dyn Geolocation>,
    repo: Arc<dyn LocationRepository>,
    surface: SurfaceHandle<S>,
    settings: TrackerSettings,
    marker_color: String,
    inner: Arc<Mutex<TrackerState>>,
}

impl<S> Clone for UserLocationTracker<S> {
    fn clone(&self) -> Self {
        Self {
            geolocation: Arc::clone(&self.geolocation),
            repo: Arc::clone(&self.repo),
            surface: self.surface.clone(),
            settings: self.settings,
            marker_color: self.marker_color.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: MapSurface> UserLocationTracker<S> {
    pub fn new(
        geolocation: Arc<dyn Geolocation>,
        repo: Arc<dyn LocationRepository>,
        surface: SurfaceHandle<S>,
        settings: TrackerSettings,
        marker_color: impl Into<String>,
    ) -> Self {
        Self {
            geolocation,
            repo,
            surface,
            settings,
            marker_color: marker_color.into(),
            inner: Arc::new(Mutex::new(TrackerState {
                state: LocationState::Unknown,
                marker: None,
                last_position: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Put back the persisted marker if sharing was active.
    ///
    /// Returns the restored position.
    pub fn restore(&self) -> Option<LatLng> {
        let stored = match self.repo.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored location");
                return None;
            }
        };
        let position = stored.restorable()?;
        self.place_marker(position);
        self.lock().last_position = Some(position);
        tracing::debug!(%position, "restored last known location");
        Some(position)
    }

    /// Resolve the permission state and, when sharing was active and
    /// permission allows, refresh the fix.
    pub async fn initialize(&self) -> LocationState {
        let permission = self.geolocation.permission().await;
        let had_position = self.lock().last_position.is_some();
        match permission {
            PermissionState::Granted => {
                self.set_state(LocationState::Granted);
                if had_position {
                    self.locate().await;
                }
            }
            PermissionState::Denied => self.apply_denial(),
            PermissionState::Prompt => {}
        }
        self.state()
    }

    /// Request one position fix and move the map to it
    pub async fn locate(&self) -> LocateOutcome {
        let prior = {
            let mut inner = self.lock();
            match inner.state {
                LocationState::Locating => {
                    tracing::debug!("location request already in flight");
                    return LocateOutcome::AlreadyInFlight;
                }
                LocationState::Denied => {
                    tracing::debug!("location permission denied, not requesting");
                    return LocateOutcome::Denied;
                }
                _ => {}
            }
            let prior = inner.state;
            inner.state = LocationState::Locating;
            prior
        };

        let result = match self.geolocation.current_position().await {
            Ok(position) if !position.is_valid() => Err(LocationError::PositionUnavailable(format!(
                "invalid coordinates {}",
                position
            ))),
            other => other,
        };

        match result {
            Ok(position) => {
                self.on_position(position);
                LocateOutcome::Located(position)
            }
            Err(LocationError::PermissionDenied) => {
                self.apply_denial();
                LocateOutcome::Denied
            }
            Err(e) => {
                tracing::warn!(error = %e, "location request failed");
                self.set_state(prior);
                LocateOutcome::Failed(e)
            }
        }
    }

    fn on_position(&self, position: LatLng) {
        {
            let mut inner = self.lock();
            inner.state = LocationState::Located(position);
            inner.last_position = Some(position);
        }
        let stored = StoredLocation {
            position: Some(position),
            active: true,
            updated_at: Some(Utc::now()),
        };
        if let Err(e) = self.repo.save(&stored) {
            tracing::warn!(error = %e, "failed to persist location");
        }

        if !self.place_marker(position) {
            tracing::debug!("map closed before location fix arrived");
            return;
        }
        let locate_zoom = self.settings.locate_zoom;
        let duration_ms = self.settings.fly_duration_ms;
        self.surface.with(|s| {
            let zoom = s.camera().zoom.max(locate_zoom);
            s.move_camera(CameraTransition::fly(CameraState::new(position, zoom), duration_ms));
        });
        tracing::info!(%position, "user located");
    }

    /// Create or move the marker. False if the map is gone.
    fn place_marker(&self, position: LatLng) -> bool {
        let existing = self.lock().marker;
        let placed = self.surface.with(|s| {
            if let Some(id) = existing {
                if s.set_marker_position(id, position) {
                    return id;
                }
            }
            s.add_marker(position, &self.marker_color)
        });
        match placed {
            Some(id) => {
                self.lock().marker = Some(id);
                true
            }
            None => false,
        }
    }

    fn apply_denial(&self) {
        let marker = {
            let mut inner = self.lock();
            inner.state = LocationState::Denied;
            inner.last_position = None;
            inner.marker.take()
        };
        if let Some(id) = marker {
            self.surface.with(|s| s.remove_marker(id));
        }
        if let Err(e) = self.repo.save(&StoredLocation::inactive()) {
            tracing::warn!(error = %e, "failed to persist location sharing state");
        }
        tracing::info!("location permission denied");
    }

    fn set_state(&self, state: LocationState) {
        self.lock().state = state;
    }

    /// Remove the marker from an already-locked surface during teardown
    pub fn detach_marker(&self, surface: &mut S) {
        if let Some(id) = self.lock().marker.take() {
            surface.remove_marker(id);
        }
    }

    pub fn state(&self) -> LocationState {
        self.lock().state
    }

    /// `None` until permission is known
    pub fn permission_granted(&self) -> Option<bool> {
        match self.lock().state {
            LocationState::Unknown => None,
            LocationState::Denied => Some(false),
            LocationState::Granted | LocationState::Located(_) => Some(true),
            LocationState::Locating => None,
        }
    }

    pub fn button_state(&self) -> LocateButton {
        let inner = self.lock();
        match inner.state {
            LocationState::Denied => LocateButton::Hidden,
            LocationState::Locating => LocateButton::Locating,
            LocationState::Located(_) => LocateButton::Active,
            _ if inner.marker.is_some() => LocateButton::Active,
            _ => LocateButton::Idle,
        }
    }

    pub fn marker(&self) -> Option<MarkerId> {
        self.lock().marker
    }

    pub fn last_position(&self) -> Option<LatLng> {
        self.lock().last_position
    }
}
