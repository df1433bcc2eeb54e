//! Error types for curbside

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Key-value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    IoError(String),

    #[error("Store data corrupted: {0}")]
    Corrupted(String),
}

/// Map core errors
///
/// None of these reach the user as a blocking failure; the map session logs
/// them and carries on.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Invalid cluster options: {0}")]
    InvalidOptions(String),

    #[error("Unknown cluster id: {0}")]
    InvalidClusterId(u64),

    #[error("Cluster index not ready")]
    IndexNotReady,

    #[error("Source already exists: {0}")]
    SourceExists(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Layer already exists: {0}")]
    LayerExists(String),

    #[error("Style is not loaded")]
    StyleNotLoaded,

    #[error("Map surface has been disposed")]
    Disposed,
}

/// Geolocation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Position request timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Truck not found: {0}")]
    TruckNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
