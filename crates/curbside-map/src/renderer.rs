//! Cluster and truck-point rendering plus click/hover handling

use std::sync::Arc;

use tokio::task::JoinSet;

use curbside_domain::MapFeature;
use curbside_types::{CameraState, LngLatBounds, MapError};

use crate::events::FeatureHit;
use crate::source::ClusterSource;
use crate::style::{paint_for, ClusterStyle, MarkerPalette, Paint};
use crate::surface::{
    CameraTransition, Cursor, LayerPaint, LayerSpec, MapSurface, SurfaceHandle, CLUSTER_COUNT_LAYER_ID,
    CLUSTER_LAYER_ID, POINT_LAYER_ID, TRUCK_SOURCE_ID,
};

/// Invoked with the truck id when a truck point is clicked
pub type SelectionCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// What a click did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Expansion lookup started for this cluster
    Expanding(u64),
    /// Truck selected
    Selected(String),
    Ignored,
}

pub struct ClusterRenderer {
    source: ClusterSource,
    style: ClusterStyle,
    palette: MarkerPalette,
    ease_duration_ms: u64,
    on_select: Option<SelectionCallback>,
    installed: bool,
    rendered_bucket: Option<u8>,
    lookups: JoinSet<()>,
}

impl ClusterRenderer {
    pub fn new(
        source: ClusterSource,
        style: ClusterStyle,
        palette: MarkerPalette,
        ease_duration_ms: u64,
        on_select: Option<SelectionCallback>,
    ) -> Self {
        Self {
            source,
            style,
            palette,
            ease_duration_ms,
            on_select,
            installed: false,
            rendered_bucket: None,
            lookups: JoinSet::new(),
        }
    }

    /// Source and the three layers, bottom to top
    pub fn layers(&self) -> Vec<LayerSpec> {
        vec![
            LayerSpec {
                id: CLUSTER_LAYER_ID.to_string(),
                source: TRUCK_SOURCE_ID.to_string(),
                paint: LayerPaint::ClusterCircles(self.style.clone()),
            },
            LayerSpec {
                id: CLUSTER_COUNT_LAYER_ID.to_string(),
                source: TRUCK_SOURCE_ID.to_string(),
                paint: LayerPaint::ClusterCount,
            },
            LayerSpec {
                id: POINT_LAYER_ID.to_string(),
                source: TRUCK_SOURCE_ID.to_string(),
                paint: LayerPaint::TruckPoints(self.palette.clone()),
            },
        ]
    }

    /// Add the source and layers and render. Safe to call again; missing
    /// pieces are re-added and the source is re-rendered.
    pub fn install<S: MapSurface>(&mut self, surface: &mut S) -> Result<(), MapError> {
        if !surface.is_style_loaded() {
            return Err(MapError::StyleNotLoaded);
        }
        if !surface.has_source(TRUCK_SOURCE_ID) {
            surface.add_source(TRUCK_SOURCE_ID, Vec::new())?;
        }
        for layer in self.layers() {
            if !surface.has_layer(&layer.id) {
                surface.add_layer(layer)?;
            }
        }
        self.installed = true;
        self.refresh(surface, true)?;
        tracing::debug!("cluster layers installed");
        Ok(())
    }

    pub fn uninstall<S: MapSurface>(&mut self, surface: &mut S) {
        for layer in self.layers().iter().rev() {
            surface.remove_layer(&layer.id);
        }
        surface.remove_source(TRUCK_SOURCE_ID);
        self.detach();
    }

    /// Forget the installed state after the surface dropped our layers
    /// (style swap)
    pub fn detach(&mut self) {
        self.installed = false;
        self.rendered_bucket = None;
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn rendered_bucket(&self) -> Option<u8> {
        self.rendered_bucket
    }

    /// Push features for the current zoom bucket into the source.
    ///
    /// Skipped when the bucket did not change unless `force` is set.
    /// Returns whether the source was rewritten.
    pub fn refresh<S: MapSurface>(&mut self, surface: &mut S, force: bool) -> Result<bool, MapError> {
        if !self.installed || !surface.has_source(TRUCK_SOURCE_ID) {
            return Ok(false);
        }
        let Some(index) = self.source.current() else {
            surface.set_source_data(TRUCK_SOURCE_ID, Vec::new())?;
            self.rendered_bucket = None;
            return Ok(true);
        };

        let zoom = surface.camera().zoom;
        let bucket = index.zoom_bucket(zoom);
        if !force && self.rendered_bucket == Some(bucket) {
            return Ok(false);
        }
        let features = index.clusters(&LngLatBounds::world(), zoom);
        tracing::debug!(zoom_bucket = bucket, features = features.len(), "rendering cluster source");
        surface.set_source_data(TRUCK_SOURCE_ID, features)?;
        self.rendered_bucket = Some(bucket);
        Ok(true)
    }

    /// Handle a click on one of the interactive layers
    pub fn handle_click<S: MapSurface>(&mut self, hit: &FeatureHit, handle: SurfaceHandle<S>) -> ClickAction {
        self.reap_lookups();
        match (&hit.feature, hit.layer.as_str()) {
            (MapFeature::Cluster(cluster), CLUSTER_LAYER_ID) => {
                let source = self.source.clone();
                let cluster = cluster.clone();
                let duration_ms = self.ease_duration_ms;
                let raw_id = cluster.id.as_u64();
                self.lookups.spawn(async move {
                    let zoom = match source.expansion_zoom(cluster.id).await {
                        Ok(zoom) => zoom,
                        Err(e) => {
                            tracing::debug!(cluster_id = %cluster.id, error = %e, "cluster expansion lookup failed");
                            return;
                        }
                    };
                    let target = CameraState::new(cluster.centroid, f64::from(zoom));
                    let moved = handle.with(|s| s.move_camera(CameraTransition::ease(target, duration_ms)));
                    if moved.is_none() {
                        tracing::debug!(cluster_id = %cluster.id, "map closed before cluster expansion finished");
                    }
                });
                ClickAction::Expanding(raw_id)
            }
            (MapFeature::Truck(truck), POINT_LAYER_ID) => {
                tracing::debug!(truck_id = %truck.id, "truck selected");
                if let Some(callback) = &self.on_select {
                    callback(&truck.id);
                }
                ClickAction::Selected(truck.id.clone())
            }
            (_, layer) => {
                tracing::debug!(layer, "ignoring click");
                ClickAction::Ignored
            }
        }
    }

    /// Pointer cursor over interactive layers, default elsewhere
    pub fn handle_hover<S: MapSurface>(&self, surface: &mut S, layer: &str, entered: bool) {
        if layer != CLUSTER_LAYER_ID && layer != POINT_LAYER_ID {
            return;
        }
        surface.set_cursor(if entered { Cursor::Pointer } else { Cursor::Default });
    }

    pub fn paint_for(&self, feature: &MapFeature) -> Paint {
        paint_for(feature, &self.style, &self.palette)
    }

    pub fn pending_lookups(&self) -> usize {
        self.lookups.len()
    }

    /// Drop lookups that already finished
    fn reap_lookups(&mut self) {
        while self.lookups.try_join_next().is_some() {}
    }

    /// Wait for every in-flight expansion lookup
    pub async fn wait_for_lookups(&mut self) {
        while self.lookups.join_next().await.is_some() {}
    }

    pub fn abort_lookups(&mut self) {
        self.lookups.abort_all();
    }
}

impl std::fmt::Debug for ClusterRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterRenderer")
            .field("installed", &self.installed)
            .field("rendered_bucket", &self.rendered_bucket)
            .field("pending_lookups", &self.lookups.len())
            .finish()
    }
}
