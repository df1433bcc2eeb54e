//! Camera state kept in the key-value store as JSON

use curbside_domain::CameraRepository;
use curbside_store::KeyValueStore;
use curbside_types::{CameraState, Error};

pub const CAMERA_STATE_KEY: &str = "camera_state";

pub struct KvCameraRepository<K> {
    store: K,
}

impl<K: KeyValueStore> KvCameraRepository<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }
}

impl<K: KeyValueStore> CameraRepository for KvCameraRepository<K> {
    /// An unreadable entry counts as no saved camera
    fn load(&self) -> Result<Option<CameraState>, Error> {
        let Some(raw) = self.store.get(CAMERA_STATE_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<CameraState>(&raw) {
            Ok(camera) if camera.center.is_valid() && camera.zoom.is_finite() => Ok(Some(camera)),
            Ok(camera) => {
                tracing::warn!(%camera, "ignoring out-of-range saved camera");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable saved camera");
                Ok(None)
            }
        }
    }

    fn save(&self, camera: &CameraState) -> Result<(), Error> {
        let raw = serde_json::to_string(camera)?;
        self.store.set(CAMERA_STATE_KEY, &raw)
    }

    fn clear(&self) -> Result<(), Error> {
        self.store.remove(CAMERA_STATE_KEY)?;
        Ok(())
    }
}
