//! Cluster and rendered-feature types

use serde::{Deserialize, Serialize};

use curbside_types::LatLng;

use super::truck::TruckPoint;

/// Opaque cluster identifier.
///
/// Encodes the position of the seed point in the level the cluster was
/// built from, plus that level's zoom. Only the index that issued an id can
/// resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u64);

impl ClusterId {
    const ZOOM_BITS: u64 = 5;
    const ZOOM_MASK: u64 = (1 << Self::ZOOM_BITS) - 1;

    /// `origin_index` indexes the level at `child_zoom`, the cluster itself lives at `child_zoom - 1`
    pub(crate) fn encode(origin_index: usize, child_zoom: u8) -> Self {
        ClusterId(((origin_index as u64) << Self::ZOOM_BITS) | u64::from(child_zoom))
    }

    /// (origin index, child zoom), or None for ids no index could have issued
    pub(crate) fn decode(self) -> Option<(usize, u8)> {
        let child_zoom = (self.0 & Self::ZOOM_MASK) as u8;
        if child_zoom == 0 {
            return None;
        }
        Some(((self.0 >> Self::ZOOM_BITS) as usize, child_zoom))
    }

    /// Rebuild an id from its raw value (e.g. from a command-line argument)
    pub fn from_raw(raw: u64) -> Self {
        ClusterId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Two or more trucks merged at a zoom level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    /// Count-weighted centroid of the members
    pub centroid: LatLng,
    pub point_count: usize,
}

impl Cluster {
    /// Short label drawn inside the circle: 7, 1.2k, 15k
    pub fn abbreviated_count(&self) -> String {
        let count = self.point_count;
        if count >= 10_000 {
            format!("{}k", (count as f64 / 1000.0).round())
        } else if count >= 1000 {
            format!("{}k", (count as f64 / 100.0).round() / 10.0)
        } else {
            count.to_string()
        }
    }
}

/// One feature of a rendered frame: a cluster or an individual truck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MapFeature {
    Cluster(Cluster),
    Truck(TruckPoint),
}

impl MapFeature {
    pub fn coordinates(&self) -> LatLng {
        match self {
            MapFeature::Cluster(c) => c.centroid,
            MapFeature::Truck(t) => t.coordinates,
        }
    }

    /// Number of trucks this feature stands for
    pub fn point_count(&self) -> usize {
        match self {
            MapFeature::Cluster(c) => c.point_count,
            MapFeature::Truck(_) => 1,
        }
    }

    pub fn as_cluster(&self) -> Option<&Cluster> {
        match self {
            MapFeature::Cluster(c) => Some(c),
            MapFeature::Truck(_) => None,
        }
    }

    pub fn as_truck(&self) -> Option<&TruckPoint> {
        match self {
            MapFeature::Truck(t) => Some(t),
            MapFeature::Cluster(_) => None,
        }
    }
}
