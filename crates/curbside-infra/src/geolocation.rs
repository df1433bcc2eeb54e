//! Geolocation answered from configuration

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use curbside_map::Geolocation;
use curbside_types::{LatLng, LocationError, PermissionState};

/// Fixed permission and position, set from config or the command line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticGeolocation {
    #[serde(default)]
    pub permission: PermissionState,
    #[serde(default)]
    pub position: Option<LatLng>,
}

impl StaticGeolocation {
    pub fn new(permission: PermissionState, position: Option<LatLng>) -> Self {
        Self { permission, position }
    }

    /// Granted with a fixed fix
    pub fn at(position: LatLng) -> Self {
        Self::new(PermissionState::Granted, Some(position))
    }

    pub fn denied() -> Self {
        Self::new(PermissionState::Denied, None)
    }
}

#[async_trait]
impl Geolocation for StaticGeolocation {
    async fn permission(&self) -> PermissionState {
        self.permission
    }

    /// A `Prompt` permission is treated as accepted when a position is configured
    async fn current_position(&self) -> Result<LatLng, LocationError> {
        if self.permission == PermissionState::Denied {
            return Err(LocationError::PermissionDenied);
        }
        self.position.ok_or_else(|| {
            LocationError::PositionUnavailable("no position configured".to_string())
        })
    }
}
