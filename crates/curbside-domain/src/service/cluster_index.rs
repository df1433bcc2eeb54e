//! Hierarchical point clustering in Web Mercator space
//!
//! Points are projected to normalized mercator coordinates and clustered
//! greedily once per zoom level, from `max_zoom` down to `min_zoom`. Each
//! level clusters the output of the level above it, so clusters nest and a
//! cluster id can be walked back to its children and leaves.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use curbside_types::{project, unproject, LatLng, LngLatBounds, MapError};

use crate::model::{Cluster, ClusterId, MapFeature, TruckPoint};

/// Highest `max_zoom` the id encoding supports
pub const MAX_SUPPORTED_ZOOM: u8 = 24;

/// Clustering parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptions {
    /// Lowest zoom that gets clusters
    #[serde(default)]
    pub min_zoom: u8,
    /// Last zoom that clusters; every point is individual above it
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    /// Merge radius in screen pixels
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Tile extent the radius is measured against
    #[serde(default = "default_extent")]
    pub extent: f64,
    /// Minimum members for a cluster
    #[serde(default = "default_min_points")]
    pub min_points: usize,
}

fn default_max_zoom() -> u8 {
    14
}

fn default_radius() -> f64 {
    50.0
}

fn default_extent() -> f64 {
    512.0
}

fn default_min_points() -> usize {
    2
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: default_max_zoom(),
            radius: default_radius(),
            extent: default_extent(),
            min_points: default_min_points(),
        }
    }
}

impl ClusterOptions {
    pub fn validate(&self) -> Result<(), MapError> {
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(MapError::InvalidOptions(format!(
                "max_zoom {} exceeds {}",
                self.max_zoom, MAX_SUPPORTED_ZOOM
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::InvalidOptions(format!(
                "min_zoom {} above max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(MapError::InvalidOptions(format!("radius {}", self.radius)));
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(MapError::InvalidOptions(format!("extent {}", self.extent)));
        }
        if self.min_points < 2 {
            return Err(MapError::InvalidOptions(format!(
                "min_points {} below 2",
                self.min_points
            )));
        }
        Ok(())
    }

    /// Merge distance at `zoom`, in normalized mercator units
    fn radius_at(&self, zoom: u8) -> f64 {
        self.radius / (self.extent * 2f64.powi(i32::from(zoom)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeSource {
    Point(usize),
    Cluster(ClusterId),
}

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    num_points: usize,
    source: NodeSource,
    /// Cluster this node was merged into at the next lower zoom
    parent: Option<ClusterId>,
}

#[derive(Debug, Clone, Copy)]
struct NodeRef {
    idx: usize,
    pos: [f64; 2],
}

impl RTreeObject for NodeRef {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for NodeRef {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Nodes of one zoom level plus their spatial index
#[derive(Debug)]
struct Level {
    nodes: Vec<Node>,
    tree: RTree<NodeRef>,
}

impl Level {
    fn new(nodes: Vec<Node>) -> Self {
        let refs = nodes
            .iter()
            .enumerate()
            .map(|(idx, n)| NodeRef {
                idx,
                pos: [n.x, n.y],
            })
            .collect();
        Self {
            nodes,
            tree: RTree::bulk_load(refs),
        }
    }

    /// Indices within `r` of (x, y), ascending so results never depend on tree layout
    fn within(&self, x: f64, y: f64, r: f64) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .tree
            .locate_within_distance([x, y], r * r)
            .map(|n| n.idx)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|n| n.idx)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Queryable clustering of a fixed point set.
///
/// Immutable once built; a changed dataset means a new index.
#[derive(Debug)]
pub struct ClusterIndex {
    options: ClusterOptions,
    points: Vec<TruckPoint>,
    /// Indexed by zoom, `max_zoom + 1` holds the raw points
    levels: Vec<Option<Level>>,
    excluded: usize,
}

impl ClusterIndex {
    /// Build an index. Points with invalid coordinates are left out.
    pub fn build<I>(points: I, options: ClusterOptions) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = TruckPoint>,
    {
        options.validate()?;

        let mut kept = Vec::new();
        let mut excluded = 0;
        for point in points {
            if point.coordinates.is_valid() {
                kept.push(point);
            } else {
                tracing::warn!(truck_id = %point.id, coordinates = ?point.coordinates, "excluding truck with invalid coordinates");
                excluded += 1;
            }
        }

        let nodes = kept
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let (x, y) = project(&p.coordinates);
                Node {
                    x,
                    y,
                    num_points: 1,
                    source: NodeSource::Point(i),
                    parent: None,
                }
            })
            .collect();

        let top = usize::from(options.max_zoom) + 1;
        let mut levels: Vec<Option<Level>> = (0..=top).map(|_| None).collect();
        let mut current = Level::new(nodes);
        for zoom in (options.min_zoom..=options.max_zoom).rev() {
            let clustered = cluster_level(&mut current, zoom, &options);
            levels[usize::from(zoom) + 1] = Some(current);
            current = clustered;
        }
        levels[usize::from(options.min_zoom)] = Some(current);

        tracing::debug!(
            points = kept.len(),
            excluded,
            min_zoom = options.min_zoom,
            max_zoom = options.max_zoom,
            "cluster index built"
        );

        Ok(Self {
            options,
            points: kept,
            levels,
            excluded,
        })
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Points that made it into the index
    pub fn points(&self) -> &[TruckPoint] {
        &self.points
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points dropped for invalid coordinates
    pub fn excluded_count(&self) -> usize {
        self.excluded
    }

    /// Level actually used for a (possibly fractional) zoom
    pub fn zoom_bucket(&self, zoom: f64) -> u8 {
        let min = f64::from(self.options.min_zoom);
        let max = f64::from(self.options.max_zoom) + 1.0;
        if !zoom.is_finite() {
            return self.options.min_zoom;
        }
        zoom.floor().clamp(min, max) as u8
    }

    /// Features visible in `bounds` at `zoom`
    pub fn clusters(&self, bounds: &LngLatBounds, zoom: f64) -> Vec<MapFeature> {
        let south = bounds.south().clamp(-90.0, 90.0);
        let north = bounds.north().clamp(-90.0, 90.0);
        let (west, east) = bounds.wrapped_lng_range();

        if west > east {
            let mut features = self.clusters_in(west, south, 180.0, north, zoom);
            features.extend(self.clusters_in(-180.0, south, east, north, zoom));
            return features;
        }
        self.clusters_in(west, south, east, north, zoom)
    }

    fn clusters_in(&self, west: f64, south: f64, east: f64, north: f64, zoom: f64) -> Vec<MapFeature> {
        let Some(level) = self.level(self.zoom_bucket(zoom)) else {
            return Vec::new();
        };
        let (min_x, max_y) = project(&LatLng::new(south, west));
        let (max_x, min_y) = project(&LatLng::new(north, east));
        level
            .range(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(|i| self.feature(&level.nodes[i]))
            .collect()
    }

    /// Features one zoom level below the cluster that merged into it
    pub fn children(&self, cluster_id: ClusterId) -> Result<Vec<MapFeature>, MapError> {
        let invalid = || MapError::InvalidClusterId(cluster_id.as_u64());
        let (origin_idx, child_zoom) = cluster_id.decode().ok_or_else(invalid)?;
        if child_zoom == 0 || child_zoom <= self.options.min_zoom {
            return Err(invalid());
        }
        let level = self.level(child_zoom).ok_or_else(invalid)?;
        let origin = level.nodes.get(origin_idx).ok_or_else(invalid)?;

        let r = self.options.radius_at(child_zoom - 1);
        let children: Vec<MapFeature> = level
            .within(origin.x, origin.y, r)
            .into_iter()
            .filter(|&i| level.nodes[i].parent == Some(cluster_id))
            .map(|i| self.feature(&level.nodes[i]))
            .collect();

        if children.is_empty() {
            return Err(invalid());
        }
        Ok(children)
    }

    /// Member trucks of a cluster, paginated
    pub fn leaves(
        &self,
        cluster_id: ClusterId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TruckPoint>, MapError> {
        let mut leaves = Vec::new();
        let mut skipped = 0;
        self.append_leaves(&mut leaves, cluster_id, limit, offset, &mut skipped)?;
        Ok(leaves)
    }

    fn append_leaves(
        &self,
        result: &mut Vec<TruckPoint>,
        cluster_id: ClusterId,
        limit: usize,
        offset: usize,
        skipped: &mut usize,
    ) -> Result<(), MapError> {
        for child in self.children(cluster_id)? {
            if result.len() >= limit {
                break;
            }
            match child {
                MapFeature::Cluster(c) => {
                    if *skipped + c.point_count <= offset {
                        *skipped += c.point_count;
                    } else {
                        self.append_leaves(result, c.id, limit, offset, skipped)?;
                    }
                }
                MapFeature::Truck(t) => {
                    if *skipped < offset {
                        *skipped += 1;
                    } else {
                        result.push(t);
                    }
                }
            }
        }
        Ok(())
    }

    /// Minimum zoom at which the cluster no longer renders as a single cluster
    pub fn expansion_zoom(&self, cluster_id: ClusterId) -> Result<u8, MapError> {
        let (_, child_zoom) = cluster_id
            .decode()
            .ok_or(MapError::InvalidClusterId(cluster_id.as_u64()))?;
        let mut expansion = child_zoom.saturating_sub(1);
        let mut current = cluster_id;
        while expansion <= self.options.max_zoom {
            let children = self.children(current)?;
            expansion += 1;
            match children.as_slice() {
                [MapFeature::Cluster(only)] => current = only.id,
                _ => break,
            }
        }
        Ok(expansion)
    }

    fn level(&self, zoom: u8) -> Option<&Level> {
        self.levels.get(usize::from(zoom)).and_then(Option::as_ref)
    }

    fn feature(&self, node: &Node) -> MapFeature {
        match node.source {
            NodeSource::Point(i) => MapFeature::Truck(self.points[i].clone()),
            NodeSource::Cluster(id) => MapFeature::Cluster(Cluster {
                id,
                centroid: unproject(node.x, node.y),
                point_count: node.num_points,
            }),
        }
    }
}

/// Cluster the nodes of `level` (zoom + 1) into the level for `zoom`.
/// Marks merged nodes in `level` with their parent id.
fn cluster_level(level: &mut Level, zoom: u8, options: &ClusterOptions) -> Level {
    let r = options.radius_at(zoom);
    let mut visited = vec![false; level.nodes.len()];
    let mut out = Vec::new();

    for i in 0..level.nodes.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let (px, py, origin_count) = {
            let p = &level.nodes[i];
            (p.x, p.y, p.num_points)
        };
        let neighbors: Vec<usize> = level
            .within(px, py, r)
            .into_iter()
            .filter(|&j| !visited[j])
            .collect();
        let num_points = origin_count
            + neighbors
                .iter()
                .map(|&j| level.nodes[j].num_points)
                .sum::<usize>();

        if num_points > origin_count && num_points >= options.min_points {
            let id = ClusterId::encode(i, zoom + 1);
            let mut wx = px * origin_count as f64;
            let mut wy = py * origin_count as f64;
            for &j in &neighbors {
                visited[j] = true;
                let b = &mut level.nodes[j];
                wx += b.x * b.num_points as f64;
                wy += b.y * b.num_points as f64;
                b.parent = Some(id);
            }
            level.nodes[i].parent = Some(id);
            out.push(Node {
                x: wx / num_points as f64,
                y: wy / num_points as f64,
                num_points,
                source: NodeSource::Cluster(id),
                parent: None,
            });
        } else {
            out.push(Node {
                parent: None,
                ..level.nodes[i].clone()
            });
            if num_points > 1 {
                for &j in &neighbors {
                    visited[j] = true;
                    out.push(Node {
                        parent: None,
                        ..level.nodes[j].clone()
                    });
                }
            }
        }
    }

    Level::new(out)
}
