//! Repository trait definitions for data access and persistence

use curbside_types::{CameraState, Error, StoredLocation};

use crate::model::Truck;

/// Read-only access to the truck dataset
pub trait TruckRepository {
    /// All trucks in dataset order
    fn find_all(&self) -> Result<Vec<Truck>, Error>;

    /// Find a truck by its identifier
    fn find_by_id(&self, id: &str) -> Result<Option<Truck>, Error>;
}

/// Last known user location and the "sharing active" flag
pub trait LocationRepository: Send + Sync {
    /// Load the stored location; an empty store yields an inactive location
    fn load(&self) -> Result<StoredLocation, Error>;

    /// Persist the location
    fn save(&self, location: &StoredLocation) -> Result<(), Error>;
}

/// Last camera position, kept across map remounts
pub trait CameraRepository: Send + Sync {
    fn load(&self) -> Result<Option<CameraState>, Error>;

    fn save(&self, camera: &CameraState) -> Result<(), Error>;

    fn clear(&self) -> Result<(), Error>;
}
