//! Events a map surface delivers to the session

use serde::{Deserialize, Serialize};

use curbside_domain::MapFeature;

/// A feature under the pointer on an interactive layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureHit {
    pub layer: String,
    pub feature: MapFeature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    /// Intermediate frame of a pan or zoom
    Move,
    /// Pan gesture settled
    MoveEnd,
    /// Zoom gesture settled
    ZoomEnd,
    Click(FeatureHit),
    MouseEnter { layer: String },
    MouseLeave { layer: String },
    /// A newly set style finished loading; sources and layers must be re-added
    StyleLoaded,
}

impl MapEvent {
    /// Settle events are the only camera events that update bounds
    pub fn is_settle(&self) -> bool {
        matches!(self, MapEvent::MoveEnd | MapEvent::ZoomEnd)
    }
}
