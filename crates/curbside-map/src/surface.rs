//! Map surface abstraction
//!
//! The session drives any map library through [`MapSurface`]. Events raised
//! by the surface are queued and drained with [`MapSurface::take_events`].

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Deserialize, Serialize};

use curbside_domain::MapFeature;
use curbside_types::{CameraState, LatLng, LngLatBounds, MapError};

use crate::events::MapEvent;
use crate::style::{ClusterStyle, MarkerPalette};

/// Source holding the clustered truck features
pub const TRUCK_SOURCE_ID: &str = "trucks";
/// Cluster circles
pub const CLUSTER_LAYER_ID: &str = "clusters";
/// Count labels drawn over cluster circles
pub const CLUSTER_COUNT_LAYER_ID: &str = "cluster-count";
/// Individual truck points
pub const POINT_LAYER_ID: &str = "unclustered-point";

/// What a layer draws from its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerPaint {
    ClusterCircles(ClusterStyle),
    ClusterCount,
    TruckPoints(MarkerPalette),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub paint: LayerPaint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Jump,
    Ease,
    Fly,
}

/// A programmatic camera move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTransition {
    pub kind: TransitionKind,
    pub target: CameraState,
    pub duration_ms: u64,
}

impl CameraTransition {
    pub fn jump(target: CameraState) -> Self {
        Self {
            kind: TransitionKind::Jump,
            target,
            duration_ms: 0,
        }
    }

    pub fn ease(target: CameraState, duration_ms: u64) -> Self {
        Self {
            kind: TransitionKind::Ease,
            target,
            duration_ms,
        }
    }

    pub fn fly(target: CameraState, duration_ms: u64) -> Self {
        Self {
            kind: TransitionKind::Fly,
            target,
            duration_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

/// Event types a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Move,
    MoveEnd,
    ZoomEnd,
    Click,
    MouseEnter,
    MouseLeave,
    StyleLoad,
}

impl EventKind {
    pub fn of(event: &MapEvent) -> Self {
        match event {
            MapEvent::Move => EventKind::Move,
            MapEvent::MoveEnd => EventKind::MoveEnd,
            MapEvent::ZoomEnd => EventKind::ZoomEnd,
            MapEvent::Click(_) => EventKind::Click,
            MapEvent::MouseEnter { .. } => EventKind::MouseEnter,
            MapEvent::MouseLeave { .. } => EventKind::MouseLeave,
            MapEvent::StyleLoaded => EventKind::StyleLoad,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Operations the map core needs from a map library
pub trait MapSurface: Send + 'static {
    fn is_style_loaded(&self) -> bool;

    /// Swap the basemap style. Sources and layers are dropped; markers stay.
    fn set_style(&mut self, url: &str);

    fn add_source(&mut self, id: &str, features: Vec<MapFeature>) -> Result<(), MapError>;

    fn set_source_data(&mut self, id: &str, features: Vec<MapFeature>) -> Result<(), MapError>;

    fn remove_source(&mut self, id: &str) -> bool;

    fn has_source(&self, id: &str) -> bool;

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), MapError>;

    fn remove_layer(&mut self, id: &str) -> bool;

    fn has_layer(&self, id: &str) -> bool;

    fn camera(&self) -> CameraState;

    /// Geographic bounds of the current viewport
    fn bounds(&self) -> LngLatBounds;

    fn move_camera(&mut self, transition: CameraTransition);

    fn add_marker(&mut self, position: LatLng, color: &str) -> MarkerId;

    fn set_marker_position(&mut self, id: MarkerId, position: LatLng) -> bool;

    fn remove_marker(&mut self, id: MarkerId) -> bool;

    fn set_cursor(&mut self, cursor: Cursor);

    /// Register interest in an event, optionally scoped to one layer
    fn on(&mut self, kind: EventKind, layer: Option<&str>) -> ListenerId;

    fn off(&mut self, id: ListenerId) -> bool;

    /// Drain queued events in the order they were raised
    fn take_events(&mut self) -> Vec<MapEvent>;
}

/// Weak handle to a session's surface.
///
/// Async completions hold one of these; once the session closes the
/// handle no longer resolves and the completion does nothing.
pub struct SurfaceHandle<S> {
    inner: Weak<Mutex<S>>,
}

impl<S> Clone for SurfaceHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> SurfaceHandle<S> {
    pub fn new(surface: &Arc<Mutex<S>>) -> Self {
        Self {
            inner: Arc::downgrade(surface),
        }
    }

    /// A handle that never resolves
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    /// Run `f` against the surface if it is still alive
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let surface = self.inner.upgrade()?;
        let mut guard = lock_surface(&surface);
        Some(f(&mut guard))
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

/// Lock a shared surface, recovering from a poisoned lock
pub fn lock_surface<S>(surface: &Mutex<S>) -> MutexGuard<'_, S> {
    surface.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_stops_resolving_after_drop() {
        let surface = Arc::new(Mutex::new(5_u32));
        let handle = SurfaceHandle::new(&surface);
        assert_eq!(handle.with(|v| *v + 1), Some(6));
        drop(surface);
        assert!(!handle.is_alive());
        assert_eq!(handle.with(|v| *v + 1), None);
    }

    #[test]
    fn test_detached_handle() {
        let handle: SurfaceHandle<u32> = SurfaceHandle::detached();
        assert!(!handle.is_alive());
        assert!(handle.with(|_| ()).is_none());
    }
}
