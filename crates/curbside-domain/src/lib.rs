//! Domain layer: truck and cluster models, clustering, viewport filtering

pub mod model;
pub mod repository;
pub mod service;

pub use model::*;
pub use repository::{CameraRepository, LocationRepository, TruckRepository};
