//! Paint tables for clusters and truck markers

use serde::{Deserialize, Serialize};

use curbside_domain::MapFeature;
use curbside_types::MapError;

/// Radius of an individual truck marker
pub const TRUCK_MARKER_RADIUS_PX: f64 = 8.0;

/// One step of the cluster paint table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTier {
    /// Smallest member count painted with this tier
    pub min_count: usize,
    pub radius_px: f64,
    pub color: String,
}

/// Cluster circles sized and colored by member count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStyle {
    pub tiers: Vec<ClusterTier>,
}

impl Default for ClusterStyle {
    fn default() -> Self {
        Self {
            tiers: vec![
                ClusterTier {
                    min_count: 0,
                    radius_px: 20.0,
                    color: "#51bbd6".to_string(),
                },
                ClusterTier {
                    min_count: 10,
                    radius_px: 30.0,
                    color: "#f1f075".to_string(),
                },
                ClusterTier {
                    min_count: 50,
                    radius_px: 40.0,
                    color: "#f28cb1".to_string(),
                },
            ],
        }
    }
}

impl ClusterStyle {
    /// Tiers must be non-empty and strictly ascending by `min_count`
    pub fn validate(&self) -> Result<(), MapError> {
        if self.tiers.is_empty() {
            return Err(MapError::InvalidOptions("cluster style has no tiers".to_string()));
        }
        if self.tiers.windows(2).any(|w| w[0].min_count >= w[1].min_count) {
            return Err(MapError::InvalidOptions(
                "cluster tiers must ascend by min_count".to_string(),
            ));
        }
        Ok(())
    }

    /// Highest tier whose threshold the count reaches; counts below the
    /// first threshold use the first tier
    pub fn tier_for(&self, count: usize) -> Option<&ClusterTier> {
        self.tiers
            .iter()
            .rev()
            .find(|t| count >= t.min_count)
            .or_else(|| self.tiers.first())
    }
}

/// Marker colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPalette {
    pub open_color: String,
    pub closed_color: String,
    pub user_location_color: String,
}

impl Default for MarkerPalette {
    fn default() -> Self {
        Self {
            open_color: "#22c55e".to_string(),
            closed_color: "#ef4444".to_string(),
            user_location_color: "#3b82f6".to_string(),
        }
    }
}

impl MarkerPalette {
    pub fn color_for(&self, is_open: bool) -> &str {
        if is_open {
            &self.open_color
        } else {
            &self.closed_color
        }
    }
}

/// Resolved paint for one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paint {
    pub radius_px: f64,
    pub color: String,
}

pub fn paint_for(feature: &MapFeature, style: &ClusterStyle, palette: &MarkerPalette) -> Paint {
    match feature {
        MapFeature::Cluster(c) => match style.tier_for(c.point_count) {
            Some(tier) => Paint {
                radius_px: tier.radius_px,
                color: tier.color.clone(),
            },
            None => Paint {
                radius_px: TRUCK_MARKER_RADIUS_PX,
                color: palette.open_color.clone(),
            },
        },
        MapFeature::Truck(t) => Paint {
            radius_px: TRUCK_MARKER_RADIUS_PX,
            color: palette.color_for(t.is_open).to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        let style = ClusterStyle::default();
        assert_eq!(style.tier_for(2).unwrap().color, "#51bbd6");
        assert_eq!(style.tier_for(9).unwrap().radius_px, 20.0);
        assert_eq!(style.tier_for(10).unwrap().color, "#f1f075");
        assert_eq!(style.tier_for(49).unwrap().radius_px, 30.0);
        assert_eq!(style.tier_for(50).unwrap().color, "#f28cb1");
        assert_eq!(style.tier_for(5000).unwrap().radius_px, 40.0);
    }

    #[test]
    fn test_thresholds_are_configuration() {
        let style = ClusterStyle {
            tiers: vec![
                ClusterTier {
                    min_count: 5,
                    radius_px: 12.0,
                    color: "a".to_string(),
                },
                ClusterTier {
                    min_count: 100,
                    radius_px: 24.0,
                    color: "b".to_string(),
                },
            ],
        };
        assert!(style.validate().is_ok());
        assert_eq!(style.tier_for(2).unwrap().color, "a");
        assert_eq!(style.tier_for(150).unwrap().color, "b");
    }

    #[test]
    fn test_validate_rejects_unordered_tiers() {
        let mut style = ClusterStyle::default();
        style.tiers.swap(0, 2);
        assert!(style.validate().is_err());
        assert!(ClusterStyle { tiers: vec![] }.validate().is_err());
    }

    #[test]
    fn test_marker_color_by_open_state() {
        let palette = MarkerPalette::default();
        assert_eq!(palette.color_for(true), "#22c55e");
        assert_eq!(palette.color_for(false), "#ef4444");
    }
}
