//! Deterministic in-memory map surface
//!
//! Keeps the bookkeeping a real map library would (style, sources, layers,
//! markers, listeners, camera) and derives viewport bounds with Web
//! Mercator math. Used by the CLI and by tests; gesture helpers such as
//! [`HeadlessSurface::pan_to`] and [`HeadlessSurface::click_truck`] stand in
//! for user input.

use std::collections::BTreeMap;

use serde::Serialize;

use curbside_domain::{Cluster, ClusterId, MapFeature, TruckPoint};
use curbside_types::{project, unproject, wrap_lng, CameraState, LatLng, LngLatBounds, MapError};

use crate::events::{FeatureHit, MapEvent};
use crate::surface::{
    CameraTransition, Cursor, EventKind, LayerPaint, LayerSpec, ListenerId, MapSurface, MarkerId,
};

/// Pixel size of one world tile at zoom 0
pub const TILE_SIZE: f64 = 512.0;
/// Zoom range the surface accepts
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

/// When a newly set style reports itself loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StyleLoadMode {
    /// Loaded as soon as it is set
    #[default]
    Immediate,
    /// Loaded when [`HeadlessSurface::finish_style_load`] is called
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedMarker {
    pub id: MarkerId,
    pub position: LatLng,
    pub color: String,
}

#[derive(Debug, Clone)]
struct Listener {
    id: ListenerId,
    kind: EventKind,
    layer: Option<String>,
}

#[derive(Debug)]
pub struct HeadlessSurface {
    width_px: f64,
    height_px: f64,
    camera: CameraState,
    style_url: Option<String>,
    style_loaded: bool,
    load_mode: StyleLoadMode,
    sources: BTreeMap<String, Vec<MapFeature>>,
    layers: Vec<LayerSpec>,
    markers: BTreeMap<MarkerId, PlacedMarker>,
    next_marker: u64,
    listeners: Vec<Listener>,
    next_listener: u64,
    cursor: Cursor,
    transitions: Vec<CameraTransition>,
    events: Vec<MapEvent>,
}

impl HeadlessSurface {
    pub fn new(width_px: u32, height_px: u32, camera: CameraState) -> Self {
        Self {
            width_px: f64::from(width_px.max(1)),
            height_px: f64::from(height_px.max(1)),
            camera: clamp_camera(camera),
            style_url: None,
            style_loaded: false,
            load_mode: StyleLoadMode::Immediate,
            sources: BTreeMap::new(),
            layers: Vec::new(),
            markers: BTreeMap::new(),
            next_marker: 1,
            listeners: Vec::new(),
            next_listener: 1,
            cursor: Cursor::Default,
            transitions: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_style_load_mode(mut self, mode: StyleLoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    pub fn viewport_px(&self) -> (f64, f64) {
        (self.width_px, self.height_px)
    }

    pub fn style_url(&self) -> Option<&str> {
        self.style_url.as_deref()
    }

    /// Complete a deferred style load. Returns false if nothing was loading.
    pub fn finish_style_load(&mut self) -> bool {
        if self.style_url.is_none() || self.style_loaded {
            return false;
        }
        self.style_loaded = true;
        self.emit(MapEvent::StyleLoaded);
        true
    }

    /// User pan/zoom gesture ending at `camera`
    pub fn pan_to(&mut self, camera: CameraState) {
        self.apply_camera(camera);
    }

    /// Click a feature on a layer. Returns false when nobody listens.
    pub fn click(&mut self, layer: &str, feature: MapFeature) -> bool {
        self.emit_on_layer(
            EventKind::Click,
            layer,
            MapEvent::Click(FeatureHit {
                layer: layer.to_string(),
                feature,
            }),
        )
    }

    /// Click a rendered cluster by id
    pub fn click_cluster(&mut self, id: ClusterId) -> bool {
        let hit = self
            .rendered_features()
            .into_iter()
            .find(|(_, f)| f.as_cluster().is_some_and(|c| c.id == id));
        match hit {
            Some((layer, feature)) => self.click(&layer, feature),
            None => false,
        }
    }

    /// Click a rendered truck point by truck id
    pub fn click_truck(&mut self, id: &str) -> bool {
        let hit = self
            .rendered_features()
            .into_iter()
            .find(|(_, f)| f.as_truck().is_some_and(|t| t.id == id));
        match hit {
            Some((layer, feature)) => self.click(&layer, feature),
            None => false,
        }
    }

    /// Pointer entering (`true`) or leaving a layer
    pub fn hover(&mut self, layer: &str, entered: bool) -> bool {
        let (kind, event) = if entered {
            (
                EventKind::MouseEnter,
                MapEvent::MouseEnter {
                    layer: layer.to_string(),
                },
            )
        } else {
            (
                EventKind::MouseLeave,
                MapEvent::MouseLeave {
                    layer: layer.to_string(),
                },
            )
        };
        self.emit_on_layer(kind, layer, event)
    }

    pub fn source_features(&self, id: &str) -> Option<&[MapFeature]> {
        self.sources.get(id).map(Vec::as_slice)
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    /// Features drawn inside the viewport, paired with the layer drawing them
    pub fn rendered_features(&self) -> Vec<(String, MapFeature)> {
        let bounds = self.bounds();
        let mut out = Vec::new();
        for layer in &self.layers {
            let Some(features) = self.sources.get(&layer.source) else {
                continue;
            };
            for feature in features {
                let drawn = match layer.paint {
                    LayerPaint::ClusterCircles(_) => feature.as_cluster().is_some(),
                    LayerPaint::TruckPoints(_) => feature.as_truck().is_some(),
                    LayerPaint::ClusterCount => false,
                };
                if drawn && bounds.contains(&feature.coordinates()) {
                    out.push((layer.id.clone(), feature.clone()));
                }
            }
        }
        out
    }

    pub fn rendered_clusters(&self) -> Vec<Cluster> {
        self.rendered_features()
            .into_iter()
            .filter_map(|(_, f)| f.as_cluster().cloned())
            .collect()
    }

    pub fn rendered_trucks(&self) -> Vec<TruckPoint> {
        self.rendered_features()
            .into_iter()
            .filter_map(|(_, f)| f.as_truck().cloned())
            .collect()
    }

    pub fn markers(&self) -> Vec<&PlacedMarker> {
        self.markers.values().collect()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&PlacedMarker> {
        self.markers.get(&id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Programmatic camera moves, oldest first
    pub fn transitions(&self) -> &[CameraTransition] {
        &self.transitions
    }

    pub fn last_transition(&self) -> Option<&CameraTransition> {
        self.transitions.last()
    }

    fn apply_camera(&mut self, camera: CameraState) {
        let camera = clamp_camera(camera);
        let zoom_changed = (camera.zoom - self.camera.zoom).abs() > f64::EPSILON;
        self.camera = camera;
        self.emit(MapEvent::Move);
        self.emit(MapEvent::MoveEnd);
        if zoom_changed {
            self.emit(MapEvent::ZoomEnd);
        }
    }

    fn emit(&mut self, event: MapEvent) {
        let kind = EventKind::of(&event);
        if self.listeners.iter().any(|l| l.kind == kind && l.layer.is_none()) {
            self.events.push(event);
        }
    }

    fn emit_on_layer(&mut self, kind: EventKind, layer: &str, event: MapEvent) -> bool {
        let listening = self
            .listeners
            .iter()
            .any(|l| l.kind == kind && l.layer.as_deref() == Some(layer));
        if listening && self.has_layer(layer) {
            self.events.push(event);
            true
        } else {
            false
        }
    }
}

impl MapSurface for HeadlessSurface {
    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn set_style(&mut self, url: &str) {
        self.style_url = Some(url.to_string());
        self.sources.clear();
        self.layers.clear();
        self.style_loaded = false;
        if self.load_mode == StyleLoadMode::Immediate {
            self.finish_style_load();
        }
    }

    fn add_source(&mut self, id: &str, features: Vec<MapFeature>) -> Result<(), MapError> {
        if !self.style_loaded {
            return Err(MapError::StyleNotLoaded);
        }
        if self.sources.contains_key(id) {
            return Err(MapError::SourceExists(id.to_string()));
        }
        self.sources.insert(id.to_string(), features);
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, features: Vec<MapFeature>) -> Result<(), MapError> {
        match self.sources.get_mut(id) {
            Some(slot) => {
                *slot = features;
                Ok(())
            }
            None => Err(MapError::SourceNotFound(id.to_string())),
        }
    }

    fn remove_source(&mut self, id: &str) -> bool {
        self.sources.remove(id).is_some()
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), MapError> {
        if !self.style_loaded {
            return Err(MapError::StyleNotLoaded);
        }
        if self.has_layer(&layer.id) {
            return Err(MapError::LayerExists(layer.id));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::SourceNotFound(layer.source));
        }
        self.layers.push(layer);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        self.layers.len() != before
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn camera(&self) -> CameraState {
        self.camera
    }

    fn bounds(&self) -> LngLatBounds {
        let world_px = TILE_SIZE * 2_f64.powf(self.camera.zoom);
        let half_w = self.width_px / 2.0 / world_px;
        let half_h = self.height_px / 2.0 / world_px;
        let (cx, cy) = project(&self.camera.center);

        let north = unproject(cx, (cy - half_h).clamp(0.0, 1.0)).lat;
        let south = unproject(cx, (cy + half_h).clamp(0.0, 1.0)).lat;

        if half_w * 2.0 >= 1.0 {
            return LngLatBounds::from_edges(-180.0, south, 180.0, north);
        }
        let west = wrap_lng(unproject(cx - half_w, cy).lng);
        let east = wrap_lng(unproject(cx + half_w, cy).lng);
        LngLatBounds::from_edges(west, south, east, north)
    }

    fn move_camera(&mut self, transition: CameraTransition) {
        let target = clamp_camera(transition.target);
        self.transitions.push(CameraTransition { target, ..transition });
        self.apply_camera(target);
    }

    fn add_marker(&mut self, position: LatLng, color: &str) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(
            id,
            PlacedMarker {
                id,
                position,
                color: color.to_string(),
            },
        );
        id
    }

    fn set_marker_position(&mut self, id: MarkerId, position: LatLng) -> bool {
        match self.markers.get_mut(&id) {
            Some(marker) => {
                marker.position = position;
                true
            }
            None => false,
        }
    }

    fn remove_marker(&mut self, id: MarkerId) -> bool {
        self.markers.remove(&id).is_some()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn on(&mut self, kind: EventKind, layer: Option<&str>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener {
            id,
            kind,
            layer: layer.map(str::to_string),
        });
        id
    }

    fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }
}

fn clamp_camera(camera: CameraState) -> CameraState {
    let zoom = if camera.zoom.is_finite() {
        camera.zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        MIN_ZOOM
    };
    let center = LatLng::new(camera.center.lat.clamp(-85.051129, 85.051129), wrap_lng(camera.center.lng));
    CameraState::new(center, zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CLUSTER_LAYER_ID, POINT_LAYER_ID, TRUCK_SOURCE_ID};
    use crate::style::{ClusterStyle, MarkerPalette};

    fn sf() -> CameraState {
        CameraState::new(LatLng::new(37.7749, -122.4194), 12.0)
    }

    #[test]
    fn test_bounds_contain_center() {
        let surface = HeadlessSurface::new(800, 600, sf());
        let bounds = surface.bounds();
        assert!(bounds.contains(&sf().center));
        assert!(bounds.west() < bounds.east());
        assert!(bounds.south() < bounds.north());
    }

    #[test]
    fn test_bounds_shrink_with_zoom() {
        let mut surface = HeadlessSurface::new(800, 600, sf());
        let wide = surface.bounds();
        surface.pan_to(CameraState::new(sf().center, 14.0));
        let narrow = surface.bounds();
        assert!(narrow.east() - narrow.west() < wide.east() - wide.west());
        // 800px at z12 with 512px tiles spans 800 / (512 * 4096) of the world
        let expected = 800.0 / (512.0 * 4096.0) * 360.0;
        assert!((wide.east() - wide.west() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_world_view_covers_all_longitudes() {
        let surface = HeadlessSurface::new(2048, 1024, CameraState::new(LatLng::new(0.0, 0.0), 1.0));
        let bounds = surface.bounds();
        assert_eq!(bounds.west(), -180.0);
        assert_eq!(bounds.east(), 180.0);
    }

    #[test]
    fn test_antimeridian_view_wraps() {
        let surface = HeadlessSurface::new(1024, 512, CameraState::new(LatLng::new(0.0, 179.5), 6.0));
        let bounds = surface.bounds();
        assert!(bounds.crosses_antimeridian());
        assert!(bounds.contains(&LatLng::new(0.0, -179.9)));
        assert!(bounds.contains(&LatLng::new(0.0, 179.9)));
    }

    #[test]
    fn test_events_only_for_listeners() {
        let mut surface = HeadlessSurface::new(800, 600, sf());
        surface.pan_to(CameraState::new(sf().center, 13.0));
        assert!(surface.take_events().is_empty());

        surface.on(EventKind::MoveEnd, None);
        surface.on(EventKind::ZoomEnd, None);
        surface.pan_to(CameraState::new(sf().center, 13.0));
        assert_eq!(surface.take_events(), vec![MapEvent::MoveEnd]);
        surface.pan_to(CameraState::new(sf().center, 14.0));
        assert_eq!(surface.take_events(), vec![MapEvent::MoveEnd, MapEvent::ZoomEnd]);
    }

    #[test]
    fn test_style_swap_clears_sources_and_layers_but_keeps_markers() {
        let mut surface = HeadlessSurface::new(800, 600, sf());
        surface.set_style("light");
        surface.add_source(TRUCK_SOURCE_ID, Vec::new()).unwrap();
        surface
            .add_layer(LayerSpec {
                id: CLUSTER_LAYER_ID.to_string(),
                source: TRUCK_SOURCE_ID.to_string(),
                paint: LayerPaint::ClusterCircles(ClusterStyle::default()),
            })
            .unwrap();
        let marker = surface.add_marker(sf().center, "#3b82f6");

        surface.set_style("dark");
        assert!(surface.source_ids().is_empty());
        assert!(surface.layer_ids().is_empty());
        assert!(surface.marker(marker).is_some());
        assert_eq!(surface.style_url(), Some("dark"));
    }

    #[test]
    fn test_deferred_style_load() {
        let mut surface = HeadlessSurface::new(800, 600, sf()).with_style_load_mode(StyleLoadMode::Deferred);
        surface.on(EventKind::StyleLoad, None);
        surface.set_style("light");
        assert!(!surface.is_style_loaded());
        assert!(matches!(
            surface.add_source(TRUCK_SOURCE_ID, Vec::new()),
            Err(MapError::StyleNotLoaded)
        ));
        assert!(surface.finish_style_load());
        assert!(surface.is_style_loaded());
        assert_eq!(surface.take_events(), vec![MapEvent::StyleLoaded]);
        assert!(!surface.finish_style_load());
    }

    #[test]
    fn test_layer_requires_source() {
        let mut surface = HeadlessSurface::new(800, 600, sf());
        surface.set_style("light");
        let err = surface
            .add_layer(LayerSpec {
                id: POINT_LAYER_ID.to_string(),
                source: TRUCK_SOURCE_ID.to_string(),
                paint: LayerPaint::TruckPoints(MarkerPalette::default()),
            })
            .unwrap_err();
        assert!(matches!(err, MapError::SourceNotFound(_)));
    }

    #[test]
    fn test_move_camera_logs_transition() {
        let mut surface = HeadlessSurface::new(800, 600, sf());
        let target = CameraState::new(LatLng::new(37.80, -122.27), 30.0);
        surface.move_camera(CameraTransition::ease(target, 500));
        let logged = surface.last_transition().unwrap();
        assert_eq!(logged.duration_ms, 500);
        assert_eq!(logged.target.zoom, MAX_ZOOM);
        assert_eq!(surface.camera().zoom, MAX_ZOOM);
    }

    #[test]
    fn test_listener_off() {
        let mut surface = HeadlessSurface::new(800, 600, sf());
        let id = surface.on(EventKind::MoveEnd, None);
        assert_eq!(surface.listener_count(), 1);
        assert!(surface.off(id));
        assert!(!surface.off(id));
        surface.pan_to(sf());
        assert!(surface.take_events().is_empty());
    }
}
