//! Headless map sessions wired to the configured store and dataset

use std::sync::{Arc, Mutex};

use serde::Serialize;

use curbside_domain::{CameraRepository, LocationRepository, Truck};
use curbside_map::{
    Geolocation, HeadlessSurface, LocateButton, LocationState, MapSession, SelectionCallback,
    SessionDeps, StyleLoadMode, VisibleTrucks,
};
use curbside_store::FileKvStore;
use curbside_types::{CameraState, LatLng, Result, StoredLocation, Theme};

use crate::config::Config;
use crate::replay::{self, ReplayReport, ReplayScript};
use crate::repository::{open_camera_repo, open_location_repo};

/// Result of pressing the locate control once
#[derive(Debug, Clone, Serialize)]
pub struct LocateReport {
    pub state: LocationState,
    pub outcome: String,
    pub button: LocateButton,
    pub camera: Option<CameraState>,
    pub marker: Option<LatLng>,
    pub stored: StoredLocation,
}

pub struct MapService {
    config: Config,
    trucks: Vec<Truck>,
    store: Arc<FileKvStore>,
}

impl MapService {
    pub fn new(config: Config, trucks: Vec<Truck>, store: Arc<FileKvStore>) -> Self {
        Self { config, trucks, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn camera_repo(&self) -> Arc<dyn CameraRepository> {
        Arc::new(open_camera_repo(&self.store))
    }

    fn location_repo(&self) -> Arc<dyn LocationRepository> {
        Arc::new(open_location_repo(&self.store))
    }

    /// Mount a map on a fresh headless surface
    pub fn open_session(
        &self,
        geolocation: Arc<dyn Geolocation>,
        on_select: Option<SelectionCallback>,
        theme: Theme,
        style_mode: StyleLoadMode,
    ) -> Result<MapSession<HeadlessSurface>> {
        let surface = HeadlessSurface::new(
            self.config.viewport.width,
            self.config.viewport.height,
            self.config.map.default_camera,
        )
        .with_style_load_mode(style_mode);
        let deps = SessionDeps {
            camera_repo: self.camera_repo(),
            location_repo: self.location_repo(),
            geolocation,
            visible: VisibleTrucks::new(self.trucks.clone()),
            on_select,
            theme,
        };
        MapSession::open(surface, self.config.map.clone(), deps)
    }

    fn configured_geolocation(&self) -> Arc<dyn Geolocation> {
        Arc::new(self.config.geolocation.clone())
    }

    /// Open a map, resolve permission, press locate once, close the map
    pub async fn locate(&self) -> Result<LocateReport> {
        let mut session = self.open_session(
            self.configured_geolocation(),
            None,
            self.config.theme,
            StyleLoadMode::Immediate,
        )?;
        let initial = session.initialize_location().await?;
        tracing::debug!(state = ?initial, "location initialized");

        let outcome = session.locate().await?;
        session.settle().await?;

        let location = session.location();
        let marker = location
            .marker()
            .and_then(|id| session.with_surface(|s| s.marker(id).map(|m| m.position)).flatten());
        let report = LocateReport {
            state: location.state(),
            outcome: outcome.to_string(),
            button: location.button_state(),
            camera: session.camera(),
            marker,
            stored: StoredLocation::inactive(),
        };
        session.close();

        Ok(LocateReport {
            stored: self.stored_location()?,
            ..report
        })
    }

    /// Drive a scripted interaction against a headless map
    pub async fn replay(&self, script: &ReplayScript) -> Result<ReplayReport> {
        let selections = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&selections);
        let on_select: SelectionCallback = Arc::new(move |id: &str| {
            sink.lock()
                .unwrap_or_else(|p| p.into_inner())
                .push(id.to_string());
        });
        let style_mode = if script.deferred_style_load {
            StyleLoadMode::Deferred
        } else {
            StyleLoadMode::Immediate
        };
        let mut session = self.open_session(
            self.configured_geolocation(),
            Some(on_select),
            script.theme.unwrap_or(self.config.theme),
            style_mode,
        )?;
        let result = replay::run(&mut session, script, &selections).await;
        session.close();
        result
    }

    pub fn saved_camera(&self) -> Result<Option<CameraState>> {
        self.camera_repo().load()
    }

    pub fn clear_camera(&self) -> Result<()> {
        self.camera_repo().clear()
    }

    pub fn stored_location(&self) -> Result<StoredLocation> {
        self.location_repo().load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::open_kv_store_at;
    use curbside_infra::{sample_trucks, StaticGeolocation};
    use curbside_map::TransitionKind;

    fn service(dir: &tempfile::TempDir, geolocation: StaticGeolocation) -> MapService {
        let config = Config {
            geolocation,
            ..Config::default()
        };
        let store = open_kv_store_at(dir.path().to_path_buf()).unwrap();
        MapService::new(config, sample_trucks(), store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_flies_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let here = LatLng::new(37.8044, -122.2712);
        let service = service(&dir, StaticGeolocation::at(here));

        let report = service.locate().await.unwrap();
        assert_eq!(report.state, LocationState::Located(here));
        assert_eq!(report.button, LocateButton::Active);
        assert_eq!(report.marker, Some(here));
        assert_eq!(report.camera.unwrap().zoom, 14.0);
        assert_eq!(report.stored.restorable(), Some(here));

        // close saved the camera at the fix
        let saved = service.saved_camera().unwrap().unwrap();
        assert!(saved.center.approx_eq(&here, 1e-9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_denied_hides_control() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, StaticGeolocation::denied());

        let report = service.locate().await.unwrap();
        assert_eq!(report.state, LocationState::Denied);
        assert_eq!(report.button, LocateButton::Hidden);
        assert_eq!(report.marker, None);
        assert!(!report.stored.active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_uses_fly_transition_for_locate() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, StaticGeolocation::at(LatLng::new(37.79, -122.40)));
        let mut session = service
            .open_session(Arc::new(service.config().geolocation.clone()), None, Theme::Light, StyleLoadMode::Immediate)
            .unwrap();
        session.locate().await.unwrap();
        let last = session.with_surface(|s| s.last_transition().copied()).flatten().unwrap();
        assert_eq!(last.kind, TransitionKind::Fly);
        session.close();
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_camera() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, StaticGeolocation::default());
        let mut session = service
            .open_session(Arc::new(StaticGeolocation::default()), None, Theme::Light, StyleLoadMode::Immediate)
            .unwrap();
        session.close();
        assert!(service.saved_camera().unwrap().is_some());

        service.clear_camera().unwrap();
        assert_eq!(service.saved_camera().unwrap(), None);
    }
}
