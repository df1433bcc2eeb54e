//! Food truck records

use serde::{Deserialize, Serialize};

use curbside_types::LatLng;

/// A food truck as loaded from the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    /// Unique identifier
    pub id: String,
    pub name: String,
    pub coordinates: LatLng,
    pub is_open: bool,
    /// Average rating, 0.0 - 5.0
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Truck {
    /// Point feature used by the cluster index
    pub fn to_point(&self) -> TruckPoint {
        TruckPoint {
            id: self.id.clone(),
            coordinates: self.coordinates,
            name: self.name.clone(),
            is_open: self.is_open,
            rating: self.rating,
            tags: self.tags.clone(),
        }
    }
}

/// Point feature for a single truck, carrying the properties the map paints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckPoint {
    pub id: String,
    pub coordinates: LatLng,
    pub name: String,
    pub is_open: bool,
    pub rating: f64,
    pub tags: Vec<String>,
}
