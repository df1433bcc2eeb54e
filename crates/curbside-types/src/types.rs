//! Shared value types for the map core

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Map camera: center and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LatLng,
    pub zoom: f64,
}

impl CameraState {
    pub const fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn approx_eq(&self, other: &CameraState, epsilon: f64) -> bool {
        self.center.approx_eq(&other.center, epsilon) && (self.zoom - other.zoom).abs() <= epsilon
    }
}

impl std::fmt::Display for CameraState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ z{:.2}", self.center, self.zoom)
    }
}

/// Basemap theme. Switching theme swaps the map style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Answer of a geolocation permission query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Prompt,
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Prompt => write!(f, "prompt"),
        }
    }
}

/// Last known device position as kept in persistent storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLocation {
    pub position: Option<LatLng>,
    /// "Location sharing active" flag
    pub active: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredLocation {
    pub fn inactive() -> Self {
        Self {
            position: None,
            active: false,
            updated_at: None,
        }
    }

    /// Position to restore on startup, only while sharing is active
    pub fn restorable(&self) -> Option<LatLng> {
        if self.active {
            self.position.filter(|p| p.is_valid())
        } else {
            None
        }
    }
}
