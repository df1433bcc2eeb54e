//! Read-only queries over the truck dataset and its cluster index

use serde::Serialize;

use curbside_domain::service::{ClusterIndex, ClusterOptions, VisibleTruckSet, VisibleTruckStore};
use curbside_domain::{ClusterId, MapFeature, Truck, TruckPoint};
use curbside_types::{Error, LatLng, LngLatBounds, Result};

/// Filters for the truck list
#[derive(Debug, Clone, Default)]
pub struct TruckFilter {
    pub open_only: bool,
    /// Case-insensitive tag or cuisine match
    pub tag: Option<String>,
}

impl TruckFilter {
    fn matches(&self, truck: &Truck) -> bool {
        if self.open_only && !truck.is_open {
            return false;
        }
        match &self.tag {
            None => true,
            Some(tag) => {
                let tag = tag.to_lowercase();
                truck.tags.iter().any(|t| t.to_lowercase() == tag)
                    || truck
                        .cuisine
                        .as_ref()
                        .is_some_and(|c| c.to_lowercase() == tag)
            }
        }
    }
}

/// What clicking a cluster would reveal
#[derive(Debug, Clone, Serialize)]
pub struct ClusterExpansion {
    pub cluster_id: ClusterId,
    pub expansion_zoom: u8,
    pub children: Vec<MapFeature>,
}

pub struct TruckQueryService {
    trucks: Vec<Truck>,
    index: ClusterIndex,
}

impl TruckQueryService {
    pub fn new(trucks: Vec<Truck>, options: ClusterOptions) -> Result<Self> {
        let index = ClusterIndex::build(trucks.iter().map(Truck::to_point), options)?;
        if index.excluded_count() > 0 {
            tracing::warn!(excluded = index.excluded_count(), "trucks with invalid coordinates not clustered");
        }
        Ok(Self { trucks, index })
    }

    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    pub fn index(&self) -> &ClusterIndex {
        &self.index
    }

    pub fn list(&self, filter: &TruckFilter) -> Vec<&Truck> {
        self.trucks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn show(&self, id: &str) -> Result<&Truck> {
        self.trucks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::TruckNotFound(id.to_string()))
    }

    /// Rendered features for a viewport at a zoom level
    pub fn clusters(&self, bounds: &LngLatBounds, zoom: f64) -> Vec<MapFeature> {
        self.index.clusters(bounds, zoom)
    }

    pub fn expand(&self, cluster_id: u64) -> Result<ClusterExpansion> {
        let id = ClusterId::from_raw(cluster_id);
        Ok(ClusterExpansion {
            cluster_id: id,
            expansion_zoom: self.index.expansion_zoom(id)?,
            children: self.index.children(id)?,
        })
    }

    pub fn leaves(&self, cluster_id: u64, limit: usize, offset: usize) -> Result<Vec<TruckPoint>> {
        Ok(self.index.leaves(ClusterId::from_raw(cluster_id), limit, offset)?)
    }

    /// Trucks inside `bounds`; the whole dataset when unset
    pub fn visible(&self, bounds: Option<LngLatBounds>) -> VisibleTruckSet {
        let mut store = VisibleTruckStore::new(self.trucks.clone());
        store.set_bounds(bounds);
        store.visible().clone()
    }

    /// Nearest trucks with distance in km
    pub fn nearest(&self, origin: &LatLng, limit: usize) -> Vec<(Truck, f64)> {
        self.visible(None)
            .sorted_by_distance(origin)
            .into_iter()
            .take(limit)
            .map(|(t, d)| (t.clone(), d))
            .collect()
    }
}
