//! Map session: owns the surface, routes its events to the renderer,
//! viewport tracker and location tracker, and tears everything down on close.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use curbside_domain::service::ClusterOptions;
use curbside_domain::{CameraRepository, LocationRepository, Truck};
use curbside_types::{CameraState, Error, LatLng, MapError, Theme};

use crate::events::MapEvent;
use crate::location::{Geolocation, LocateOutcome, LocationState, TrackerSettings, UserLocationTracker};
use crate::renderer::{ClickAction, ClusterRenderer, SelectionCallback};
use crate::source::ClusterSource;
use crate::style::{ClusterStyle, MarkerPalette};
use crate::surface::{
    lock_surface, CameraTransition, EventKind, ListenerId, MapSurface, SurfaceHandle, CLUSTER_LAYER_ID,
    POINT_LAYER_ID,
};
use crate::viewport::ViewportTracker;
use crate::visible::VisibleTrucks;

/// Basemap style per theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleUrls {
    pub light: String,
    pub dark: String,
}

impl Default for StyleUrls {
    fn default() -> Self {
        Self {
            light: "https://basemaps.cartocdn.com/gl/positron-gl-style/style.json".to_string(),
            dark: "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json".to_string(),
        }
    }
}

impl StyleUrls {
    pub fn url(&self, theme: Theme) -> &str {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}

/// Map behaviour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub cluster: ClusterOptions,
    #[serde(default)]
    pub cluster_style: ClusterStyle,
    #[serde(default)]
    pub palette: MarkerPalette,
    /// Quiet period before viewport bounds are published
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Camera used when nothing was saved
    #[serde(default = "default_camera")]
    pub default_camera: CameraState,
    /// Minimum zoom after locating the user
    #[serde(default = "default_locate_zoom")]
    pub locate_zoom: f64,
    #[serde(default = "default_fly_duration_ms")]
    pub fly_duration_ms: u64,
    #[serde(default = "default_ease_duration_ms")]
    pub ease_duration_ms: u64,
    #[serde(default)]
    pub styles: StyleUrls,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_camera() -> CameraState {
    CameraState::new(LatLng::new(37.7749, -122.4194), 12.0)
}

fn default_locate_zoom() -> f64 {
    14.0
}

fn default_fly_duration_ms() -> u64 {
    1500
}

fn default_ease_duration_ms() -> u64 {
    500
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterOptions::default(),
            cluster_style: ClusterStyle::default(),
            palette: MarkerPalette::default(),
            debounce_ms: default_debounce_ms(),
            default_camera: default_camera(),
            locate_zoom: default_locate_zoom(),
            fly_duration_ms: default_fly_duration_ms(),
            ease_duration_ms: default_ease_duration_ms(),
            styles: StyleUrls::default(),
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<(), MapError> {
        self.cluster.validate()?;
        self.cluster_style.validate()?;
        if !self.default_camera.center.is_valid() || !self.default_camera.zoom.is_finite() {
            return Err(MapError::InvalidOptions(format!(
                "invalid default camera {}",
                self.default_camera
            )));
        }
        if !(0.0..=24.0).contains(&self.locate_zoom) {
            return Err(MapError::InvalidOptions(format!(
                "locate zoom {} out of range",
                self.locate_zoom
            )));
        }
        Ok(())
    }
}

/// Collaborators a session is opened with
pub struct SessionDeps {
    pub camera_repo: Arc<dyn CameraRepository>,
    pub location_repo: Arc<dyn LocationRepository>,
    pub geolocation: Arc<dyn Geolocation>,
    /// Visible-set store; its dataset feeds the cluster index
    pub visible: VisibleTrucks,
    pub on_select: Option<SelectionCallback>,
    pub theme: Theme,
}

/// One mounted map.
///
/// Must be opened and driven inside a tokio runtime. Dropping the session
/// closes it.
pub struct MapSession<S: MapSurface> {
    id: Uuid,
    config: MapConfig,
    surface: Option<Arc<Mutex<S>>>,
    source: ClusterSource,
    renderer: ClusterRenderer,
    viewport: ViewportTracker,
    location: UserLocationTracker<S>,
    visible: VisibleTrucks,
    camera_repo: Arc<dyn CameraRepository>,
    listeners: Vec<ListenerId>,
    theme: Theme,
    /// Camera to put back once a swapped style finishes loading
    pending_restore: Option<CameraState>,
}

impl<S: MapSurface> MapSession<S> {
    pub fn open(surface: S, config: MapConfig, deps: SessionDeps) -> Result<Self, Error> {
        config.validate()?;
        let id = Uuid::new_v4();

        let source = ClusterSource::new();
        let dataset = deps.visible.dataset();
        let index = source.rebuild(dataset.iter().map(Truck::to_point), config.cluster)?;
        if index.excluded_count() > 0 {
            tracing::warn!(excluded = index.excluded_count(), "some trucks were left off the map");
        }

        let shared = Arc::new(Mutex::new(surface));
        let location = UserLocationTracker::new(
            deps.geolocation,
            deps.location_repo,
            SurfaceHandle::new(&shared),
            TrackerSettings {
                locate_zoom: config.locate_zoom,
                fly_duration_ms: config.fly_duration_ms,
            },
            config.palette.user_location_color.clone(),
        );
        let restored = location.restore();

        let saved = deps.camera_repo.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read saved camera");
            None
        });
        let camera = saved
            .or_else(|| restored.map(|p| CameraState::new(p, config.locate_zoom)))
            .unwrap_or(config.default_camera);

        let mut renderer = ClusterRenderer::new(
            source.clone(),
            config.cluster_style.clone(),
            config.palette.clone(),
            config.ease_duration_ms,
            deps.on_select,
        );
        let viewport = ViewportTracker::new(
            Duration::from_millis(config.debounce_ms),
            deps.visible.clone(),
            Some(Arc::clone(&deps.camera_repo)),
        );

        let listeners = {
            let mut s = lock_surface(&shared);
            let mut ids = vec![
                s.on(EventKind::Move, None),
                s.on(EventKind::MoveEnd, None),
                s.on(EventKind::ZoomEnd, None),
                s.on(EventKind::StyleLoad, None),
            ];
            for layer in [CLUSTER_LAYER_ID, POINT_LAYER_ID] {
                ids.push(s.on(EventKind::Click, Some(layer)));
                ids.push(s.on(EventKind::MouseEnter, Some(layer)));
                ids.push(s.on(EventKind::MouseLeave, Some(layer)));
            }
            s.set_style(config.styles.url(deps.theme));
            s.move_camera(CameraTransition::jump(camera));
            if s.is_style_loaded() {
                renderer.install(&mut *s)?;
            }
            ids
        };

        tracing::info!(
            session_id = %id,
            trucks = index.len(),
            theme = %deps.theme,
            camera = %camera,
            "map session opened"
        );

        let mut session = Self {
            id,
            config,
            surface: Some(shared),
            source,
            renderer,
            viewport,
            location,
            visible: deps.visible,
            camera_repo: deps.camera_repo,
            listeners,
            theme: deps.theme,
            pending_restore: None,
        };
        session.pump()?;
        Ok(session)
    }

    /// Route one surface event
    pub fn dispatch(&mut self, event: MapEvent) -> Result<(), Error> {
        let Some(shared) = self.surface.clone() else {
            tracing::debug!(?event, "event after close ignored");
            return Ok(());
        };
        match event {
            MapEvent::Move => {}
            MapEvent::MoveEnd | MapEvent::ZoomEnd => {
                let (camera, bounds) = {
                    let mut s = lock_surface(&shared);
                    self.renderer.refresh(&mut *s, false)?;
                    (s.camera(), s.bounds())
                };
                self.viewport.on_settle(camera, bounds);
            }
            MapEvent::Click(hit) => {
                let action = self.renderer.handle_click(&hit, SurfaceHandle::new(&shared));
                if action == ClickAction::Ignored {
                    tracing::debug!(layer = %hit.layer, "click on non-interactive feature");
                }
            }
            MapEvent::MouseEnter { layer } => {
                let mut s = lock_surface(&shared);
                self.renderer.handle_hover(&mut *s, &layer, true);
            }
            MapEvent::MouseLeave { layer } => {
                let mut s = lock_surface(&shared);
                self.renderer.handle_hover(&mut *s, &layer, false);
            }
            MapEvent::StyleLoaded => {
                let mut s = lock_surface(&shared);
                if !s.is_style_loaded() {
                    tracing::debug!("stale style load ignored, a newer style is still loading");
                    return Ok(());
                }
                self.renderer.install(&mut *s)?;
                if let Some(camera) = self.pending_restore.take() {
                    s.move_camera(CameraTransition::jump(camera));
                    tracing::debug!(%camera, "camera restored after style load");
                }
            }
        }
        Ok(())
    }

    /// Drain and dispatch queued surface events until none are left.
    ///
    /// A failing event is logged and skipped; the rest of the batch still
    /// runs. Returns the number of events handled.
    pub fn pump(&mut self) -> Result<usize, Error> {
        let mut handled = 0;
        loop {
            let events = match &self.surface {
                Some(shared) => lock_surface(shared).take_events(),
                None => break,
            };
            if events.is_empty() {
                break;
            }
            for event in events {
                if let Err(e) = self.dispatch(event.clone()) {
                    tracing::warn!(session_id = %self.id, ?event, error = %e, "map event failed");
                }
                handled += 1;
            }
        }
        Ok(handled)
    }

    /// Run until expansion lookups finish, events are drained, and pending
    /// bounds are published
    pub async fn settle(&mut self) -> Result<(), Error> {
        loop {
            self.renderer.wait_for_lookups().await;
            let handled = self.pump()?;
            if handled == 0 && self.renderer.pending_lookups() == 0 {
                break;
            }
        }
        self.viewport.flush().await;
        Ok(())
    }

    /// Swap the basemap. Layers come back when the new style reports loaded.
    pub fn set_theme(&mut self, theme: Theme) -> Result<(), Error> {
        if theme == self.theme {
            return Ok(());
        }
        let shared = self.surface.as_ref().ok_or(MapError::Disposed)?;
        {
            let mut s = lock_surface(shared);
            self.pending_restore = Some(s.camera());
            self.renderer.detach();
            s.set_style(self.config.styles.url(theme));
        }
        tracing::info!(session_id = %self.id, %theme, "theme changed");
        self.theme = theme;
        self.pump()?;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, Error> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Locate-me button
    pub async fn locate(&mut self) -> Result<LocateOutcome, Error> {
        if self.surface.is_none() {
            return Err(MapError::Disposed.into());
        }
        let outcome = self.location.locate().await;
        self.pump()?;
        Ok(outcome)
    }

    /// Resolve permission and refresh a restored position
    pub async fn initialize_location(&mut self) -> Result<LocationState, Error> {
        if self.surface.is_none() {
            return Err(MapError::Disposed.into());
        }
        let state = self.location.initialize().await;
        self.pump()?;
        Ok(state)
    }

    /// Run `f` against the surface, e.g. to feed it gestures
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        self.surface.as_ref().map(|shared| f(&mut lock_surface(shared)))
    }

    pub fn camera(&self) -> Option<CameraState> {
        self.with_surface(|s| s.camera())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    pub fn source(&self) -> &ClusterSource {
        &self.source
    }

    pub fn renderer(&self) -> &ClusterRenderer {
        &self.renderer
    }

    pub fn viewport(&self) -> &ViewportTracker {
        &self.viewport
    }

    pub fn location(&self) -> &UserLocationTracker<S> {
        &self.location
    }

    pub fn visible(&self) -> &VisibleTrucks {
        &self.visible
    }

    /// Tear down and hand the surface back.
    ///
    /// Idempotent. Returns `None` when already closed.
    pub fn close(&mut self) -> Option<S> {
        let shared = self.surface.take()?;
        self.viewport.cancel();
        self.renderer.abort_lookups();
        self.pending_restore = None;
        {
            let mut s = lock_surface(&shared);
            let camera = s.camera();
            if let Err(e) = self.camera_repo.save(&camera) {
                tracing::warn!(error = %e, "failed to persist camera state");
            }
            for id in self.listeners.drain(..) {
                s.off(id);
            }
            self.location.detach_marker(&mut *s);
            self.renderer.uninstall(&mut *s);
            s.take_events();
        }
        tracing::info!(session_id = %self.id, "map session closed");

        match Arc::try_unwrap(shared) {
            Ok(mutex) => Some(mutex.into_inner().unwrap_or_else(|p| p.into_inner())),
            Err(_) => {
                tracing::debug!(session_id = %self.id, "surface still referenced after close");
                None
            }
        }
    }
}

impl<S: MapSurface> Drop for MapSession<S> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessSurface, StyleLoadMode};
    use crate::surface::TransitionKind;
    use crate::test_support::{sample_trucks, MemoryCameraRepository, MemoryLocationRepository, ScriptedGeolocation};
    use curbside_domain::service::EMPTY_STATE_MESSAGE;
    use curbside_types::StoredLocation;

    struct Harness {
        camera_repo: Arc<MemoryCameraRepository>,
        location_repo: Arc<MemoryLocationRepository>,
        visible: VisibleTrucks,
        selected: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                camera_repo: Arc::new(MemoryCameraRepository::default()),
                location_repo: Arc::new(MemoryLocationRepository::with(StoredLocation::inactive())),
                visible: VisibleTrucks::new(sample_trucks()),
                selected: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn deps(&self, geo: ScriptedGeolocation) -> SessionDeps {
            let sink = Arc::clone(&self.selected);
            SessionDeps {
                camera_repo: self.camera_repo.clone(),
                location_repo: self.location_repo.clone(),
                geolocation: Arc::new(geo),
                visible: self.visible.clone(),
                on_select: Some(Arc::new(move |id: &str| sink.lock().unwrap().push(id.to_string()))),
                theme: Theme::Light,
            }
        }

        fn open(&self, surface: HeadlessSurface) -> MapSession<HeadlessSurface> {
            let geo = ScriptedGeolocation::granted(LatLng::new(37.7793, -122.4193));
            MapSession::open(surface, MapConfig::default(), self.deps(geo)).unwrap()
        }
    }

    fn bay_area() -> CameraState {
        CameraState::new(LatLng::new(37.82, -122.33), 10.0)
    }

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new(1024, 768, bay_area())
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_installs_clusters_at_default_camera() {
        let h = Harness::new();
        let session = h.open(surface());
        let (camera, features, layers) = session
            .with_surface(|s| (s.camera(), s.rendered_features(), s.layer_ids().len()))
            .unwrap();
        assert!(camera.approx_eq(&MapConfig::default().default_camera, 1e-9));
        assert_eq!(layers, 3);
        assert!(!features.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zoom_ten_scenario() {
        let h = Harness::new();
        let mut session = h.open(surface());
        session.with_surface(|s| s.pan_to(bay_area()));
        session.settle().await.unwrap();

        let mut counts: Vec<usize> = session
            .with_surface(|s| s.rendered_features().iter().map(|(_, f)| f.point_count()).collect())
            .unwrap();
        counts.sort();
        assert_eq!(counts, vec![1, 2, 4]);
        assert_eq!(h.visible.snapshot().len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cluster_click_zooms_in() {
        let h = Harness::new();
        let mut session = h.open(surface());
        session.with_surface(|s| s.pan_to(bay_area()));
        session.settle().await.unwrap();

        let cluster = session
            .with_surface(|s| s.rendered_clusters().into_iter().find(|c| c.point_count == 4))
            .flatten()
            .unwrap();
        let expansion = session.source().current().unwrap().expansion_zoom(cluster.id).unwrap();
        assert!(session.with_surface(|s| s.click_cluster(cluster.id)).unwrap());
        session.settle().await.unwrap();

        let camera = session.camera().unwrap();
        assert!(camera.zoom >= f64::from(expansion));
        assert!(camera.center.approx_eq(&cluster.centroid, 1e-9));
        assert!(h.visible.snapshot().len() < 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_truck_click_reaches_callback() {
        let h = Harness::new();
        let mut session = h.open(surface());
        session.with_surface(|s| s.pan_to(CameraState::new(LatLng::new(37.8716, -122.2727), 16.0)));
        session.settle().await.unwrap();

        assert!(session.with_surface(|s| s.click_truck("t7")).unwrap());
        session.pump().unwrap();
        assert_eq!(*h.selected.lock().unwrap(), vec!["t7".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_sets_pointer() {
        let h = Harness::new();
        let mut session = h.open(surface());
        session.with_surface(|s| s.hover(CLUSTER_LAYER_ID, true));
        session.pump().unwrap();
        assert_eq!(session.with_surface(|s| s.cursor()), Some(crate::surface::Cursor::Pointer));
        session.with_surface(|s| s.hover(CLUSTER_LAYER_ID, false));
        session.pump().unwrap();
        assert_eq!(session.with_surface(|s| s.cursor()), Some(crate::surface::Cursor::Default));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pan_burst_publishes_once() {
        let h = Harness::new();
        let mut session = h.open(surface());
        session.settle().await.unwrap();
        let before = h.visible.revision();

        for zoom in [11.0, 12.0, 13.0, 14.0] {
            session.with_surface(|s| s.pan_to(CameraState::new(LatLng::new(37.7897, -122.4003), zoom)));
            session.pump().unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert_eq!(h.visible.revision(), before);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.visible.revision(), before + 1);
        assert_eq!(h.visible.snapshot().ids(), vec!["t1", "t2", "t3", "t4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_area() {
        let h = Harness::new();
        let mut session = h.open(surface());
        session.with_surface(|s| s.pan_to(CameraState::new(LatLng::new(0.0, -30.0), 12.0)));
        session.settle().await.unwrap();

        let visible = h.visible.snapshot();
        assert!(visible.is_empty());
        assert!(visible.is_filtered);
        assert_eq!(visible.empty_state_message(), Some(EMPTY_STATE_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_theme_toggle_restores_camera_after_load() {
        let h = Harness::new();
        let mut session = h.open(surface().with_style_load_mode(StyleLoadMode::Deferred));
        session.with_surface(|s| s.finish_style_load());
        session.pump().unwrap();
        let camera = CameraState::new(LatLng::new(37.7897, -122.4003), 13.25);
        session.with_surface(|s| s.pan_to(camera));
        session.settle().await.unwrap();

        assert_eq!(session.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(session.with_surface(|s| s.layer_ids().len()), Some(0));
        assert!(!session.renderer().is_installed());

        session.with_surface(|s| s.finish_style_load());
        session.settle().await.unwrap();
        let (restored, layers, style) = session
            .with_surface(|s| (s.camera(), s.layer_ids().len(), s.style_url().map(str::to_string)))
            .unwrap();
        assert!(restored.approx_eq(&camera, 1e-9));
        assert_eq!(layers, 3);
        assert_eq!(style.as_deref(), Some(MapConfig::default().styles.dark.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_theme_toggle_with_undrained_style_load() {
        let h = Harness::new();
        let mut session = h.open(surface().with_style_load_mode(StyleLoadMode::Deferred));
        let camera = CameraState::new(LatLng::new(37.7897, -122.4003), 13.25);
        // style load and pan are still queued when the theme changes
        session.with_surface(|s| {
            s.finish_style_load();
            s.pan_to(camera);
        });

        assert_eq!(session.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(session.theme(), Theme::Dark);
        assert!(!session.renderer().is_installed());
        assert_eq!(session.with_surface(|s| s.source_ids().len()), Some(0));
        let saved = h.camera_repo.load().unwrap().unwrap();
        assert!(saved.approx_eq(&camera, 1e-9));

        session.with_surface(|s| s.finish_style_load());
        session.settle().await.unwrap();
        assert!(session.renderer().is_installed());
        assert_eq!(session.with_surface(|s| s.layer_ids().len()), Some(3));
        assert!(session.camera().unwrap().approx_eq(&camera, 1e-9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_survives_theme_toggle() {
        let h = Harness::new();
        let mut session = h.open(surface());
        session.locate().await.unwrap();
        let marker = session.location().marker().unwrap();
        session.toggle_theme().unwrap();
        assert!(session.with_surface(|s| s.marker(marker).is_some()).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_tears_everything_down() {
        let h = Harness::new();
        let mut session = h.open(surface());
        session.locate().await.unwrap();
        session.with_surface(|s| s.pan_to(CameraState::new(LatLng::new(37.80, -122.27), 15.0)));
        session.pump().unwrap();

        let surface = session.close().unwrap();
        assert_eq!(surface.listener_count(), 0);
        assert!(surface.markers().is_empty());
        assert!(surface.layer_ids().is_empty());
        assert!(surface.source_ids().is_empty());
        assert_eq!(h.camera_repo.load().unwrap(), Some(surface.camera()));

        assert!(session.close().is_none());
        assert!(!session.is_open());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(h.visible.bounds(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_restores_saved_camera() {
        let h = Harness::new();
        let camera = CameraState::new(LatLng::new(37.80, -122.27), 15.0);
        {
            let mut session = h.open(surface());
            session.with_surface(|s| s.pan_to(camera));
            session.pump().unwrap();
        }
        let session = h.open(surface());
        assert!(session.camera().unwrap().approx_eq(&camera, 1e-9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persisted_location_sets_initial_camera() {
        let h = Harness::new();
        let home = LatLng::new(37.7793, -122.4193);
        h.location_repo
            .save(&StoredLocation {
                position: Some(home),
                active: true,
                updated_at: None,
            })
            .unwrap();
        let session = h.open(surface());
        let camera = session.camera().unwrap();
        assert!(camera.center.approx_eq(&home, 1e-9));
        assert_eq!(camera.zoom, 14.0);
        assert!(session.location().marker().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_location_leaves_no_marker() {
        let h = Harness::new();
        let mut session = MapSession::open(surface(), MapConfig::default(), h.deps(ScriptedGeolocation::denied())).unwrap();
        assert_eq!(session.initialize_location().await.unwrap(), LocationState::Denied);
        assert_eq!(session.location().permission_granted(), Some(false));
        assert!(session.with_surface(|s| s.markers().is_empty()).unwrap());
        assert!(!h.location_repo.load().unwrap().active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_flies_to_position() {
        let h = Harness::new();
        let mut session = h.open(surface());
        let outcome = session.locate().await.unwrap();
        assert_eq!(outcome, LocateOutcome::Located(LatLng::new(37.7793, -122.4193)));
        let fly = session.with_surface(|s| *s.last_transition().unwrap()).unwrap();
        assert_eq!(fly.kind, TransitionKind::Fly);
        assert_eq!(fly.target.zoom, 14.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MapConfig::default();
        config.cluster.max_zoom = 30;
        assert!(config.validate().is_err());
        let mut config = MapConfig::default();
        config.locate_zoom = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: MapConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MapConfig::default());
        assert_eq!(config.debounce_ms, 100);
    }
}
