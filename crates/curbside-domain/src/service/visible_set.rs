//! Viewport filtering of the truck dataset for the list view

use serde::Serialize;

use curbside_types::{LatLng, LngLatBounds};

use crate::model::Truck;

/// Message shown by the list view when the viewport holds no trucks
pub const EMPTY_STATE_MESSAGE: &str = "No food trucks in this area. Zoom out or pan the map to find more.";

/// Trucks inside the current viewport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleTruckSet {
    pub trucks: Vec<Truck>,
    /// False when no bounds are set and the full dataset is shown
    pub is_filtered: bool,
    pub bounds: Option<LngLatBounds>,
    /// Size of the full dataset
    pub total: usize,
}

impl VisibleTruckSet {
    fn compute(dataset: &[Truck], bounds: Option<LngLatBounds>) -> Self {
        let trucks: Vec<Truck> = match &bounds {
            None => dataset.to_vec(),
            Some(b) => dataset
                .iter()
                .filter(|t| b.contains(&t.coordinates))
                .cloned()
                .collect(),
        };
        let is_filtered = bounds.is_some() && trucks.len() != dataset.len();
        Self {
            trucks,
            is_filtered,
            bounds,
            total: dataset.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.trucks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trucks.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.trucks.iter().map(|t| t.id.as_str()).collect()
    }

    /// Explicit empty-state text; the list must not fall back to the full dataset
    pub fn empty_state_message(&self) -> Option<&'static str> {
        if self.is_empty() {
            Some(EMPTY_STATE_MESSAGE)
        } else {
            None
        }
    }

    /// Nearest first, with distance in km. Ties keep dataset order.
    pub fn sorted_by_distance(&self, origin: &LatLng) -> Vec<(&Truck, f64)> {
        let mut ranked: Vec<(&Truck, f64)> = self
            .trucks
            .iter()
            .map(|t| (t, origin.distance_km(&t.coordinates)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }
}

/// Single-writer store for the visible set.
///
/// `set_bounds` is the only mutator; the derived set is recomputed in full
/// on every change.
#[derive(Debug, Clone)]
pub struct VisibleTruckStore {
    dataset: Vec<Truck>,
    current: VisibleTruckSet,
    revision: u64,
}

impl VisibleTruckStore {
    pub fn new(dataset: Vec<Truck>) -> Self {
        let current = VisibleTruckSet::compute(&dataset, None);
        Self {
            dataset,
            current,
            revision: 0,
        }
    }

    /// Apply new viewport bounds. Returns false when nothing changed.
    pub fn set_bounds(&mut self, bounds: Option<LngLatBounds>) -> bool {
        if self.current.bounds == bounds {
            return false;
        }
        self.current = VisibleTruckSet::compute(&self.dataset, bounds);
        self.revision += 1;
        true
    }

    /// Swap the dataset, keeping the current bounds
    pub fn replace_dataset(&mut self, dataset: Vec<Truck>) {
        self.dataset = dataset;
        self.current = VisibleTruckSet::compute(&self.dataset, self.current.bounds);
        self.revision += 1;
    }

    pub fn visible(&self) -> &VisibleTruckSet {
        &self.current
    }

    pub fn is_filtered(&self) -> bool {
        self.current.is_filtered
    }

    pub fn bounds(&self) -> Option<LngLatBounds> {
        self.current.bounds
    }

    pub fn dataset(&self) -> &[Truck] {
        &self.dataset
    }

    /// Increments on every effective change
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
