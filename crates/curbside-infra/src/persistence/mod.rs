//! Persistence implementations
//!
//! Truck repositories over a loaded dataset, and key-value backed location
//! and camera repositories.

mod kv_camera_repo;
mod kv_location_repo;
mod truck_repo;

pub use kv_camera_repo::{KvCameraRepository, CAMERA_STATE_KEY};
pub use kv_location_repo::{
    KvLocationRepository, LOCATION_SHARING_ACTIVE_KEY, LOCATION_UPDATED_AT_KEY, USER_LATITUDE_KEY,
    USER_LONGITUDE_KEY,
};
pub use truck_repo::{FileTruckRepository, StaticTruckRepository};
