//! In-memory collaborators for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use curbside_domain::{CameraRepository, LocationRepository, Truck};
use curbside_types::{CameraState, Error, LatLng, LocationError, PermissionState, StoredLocation};

use crate::location::Geolocation;

fn truck(id: &str, name: &str, lat: f64, lng: f64, is_open: bool) -> Truck {
    Truck {
        id: id.to_string(),
        name: name.to_string(),
        coordinates: LatLng::new(lat, lng),
        is_open,
        rating: 4.5,
        tags: vec!["street food".to_string()],
        cuisine: None,
        description: None,
    }
}

/// Four downtown SF trucks, two in Oakland, one in Berkeley
pub fn sample_trucks() -> Vec<Truck> {
    vec![
        truck("t1", "Taco Loco", 37.7890, -122.4010, true),
        truck("t2", "Curry Up Now", 37.7920, -122.3990, true),
        truck("t3", "Señor Sisig", 37.7875, -122.4045, false),
        truck("t4", "Kasa Express", 37.7905, -122.3965, true),
        truck("t5", "Oakland BBQ Wagon", 37.8044, -122.2712, true),
        truck("t6", "Lake Merritt Dumplings", 37.8080, -122.2650, false),
        truck("t7", "Berkeley Bao", 37.8716, -122.2727, true),
    ]
}

#[derive(Debug, Default)]
pub struct MemoryCameraRepository {
    camera: Mutex<Option<CameraState>>,
}

impl CameraRepository for MemoryCameraRepository {
    fn load(&self) -> Result<Option<CameraState>, Error> {
        Ok(*self.camera.lock().unwrap())
    }

    fn save(&self, camera: &CameraState) -> Result<(), Error> {
        *self.camera.lock().unwrap() = Some(*camera);
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.camera.lock().unwrap() = None;
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryLocationRepository {
    stored: Mutex<StoredLocation>,
}

impl MemoryLocationRepository {
    pub fn with(stored: StoredLocation) -> Self {
        Self {
            stored: Mutex::new(stored),
        }
    }
}

impl LocationRepository for MemoryLocationRepository {
    fn load(&self) -> Result<StoredLocation, Error> {
        Ok(self.stored.lock().unwrap().clone())
    }

    fn save(&self, location: &StoredLocation) -> Result<(), Error> {
        *self.stored.lock().unwrap() = location.clone();
        Ok(())
    }
}

/// Geolocation with a fixed permission and a fixed answer
#[derive(Debug, Clone)]
pub struct ScriptedGeolocation {
    permission: PermissionState,
    answer: Result<LatLng, LocationError>,
    delay: Option<Duration>,
    requests: Arc<AtomicUsize>,
}

impl ScriptedGeolocation {
    fn new(permission: PermissionState, answer: Result<LatLng, LocationError>) -> Self {
        Self {
            permission,
            answer,
            delay: None,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn granted(position: LatLng) -> Self {
        Self::new(PermissionState::Granted, Ok(position))
    }

    pub fn granted_with(answer: Result<LatLng, LocationError>) -> Self {
        Self::new(PermissionState::Granted, answer)
    }

    pub fn denied() -> Self {
        Self::new(PermissionState::Denied, Err(LocationError::PermissionDenied))
    }

    pub fn prompt(answer: Result<LatLng, LocationError>) -> Self {
        Self::new(PermissionState::Prompt, answer)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geolocation for ScriptedGeolocation {
    async fn permission(&self) -> PermissionState {
        self.permission
    }

    async fn current_position(&self) -> Result<LatLng, LocationError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }
}
