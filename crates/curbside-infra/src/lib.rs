//! Infrastructure layer: dataset loading, sample data, repository
//! implementations and a static geolocation source

pub mod dataset_loader;
pub mod geolocation;
pub mod persistence;
pub mod sample_data;

pub use dataset_loader::{DatasetFormat, TruckDatasetLoader};
pub use geolocation::StaticGeolocation;
pub use persistence::{FileTruckRepository, KvCameraRepository, KvLocationRepository, StaticTruckRepository};
pub use sample_data::sample_trucks;
