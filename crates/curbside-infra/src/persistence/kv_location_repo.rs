//! User location kept in the key-value store under flat keys

use chrono::{DateTime, Utc};

use curbside_domain::LocationRepository;
use curbside_store::KeyValueStore;
use curbside_types::{Error, LatLng, StoredLocation};

pub const USER_LONGITUDE_KEY: &str = "user_longitude";
pub const USER_LATITUDE_KEY: &str = "user_latitude";
pub const LOCATION_SHARING_ACTIVE_KEY: &str = "location_sharing_active";
pub const LOCATION_UPDATED_AT_KEY: &str = "location_updated_at";

pub struct KvLocationRepository<K> {
    store: K,
}

impl<K: KeyValueStore> KvLocationRepository<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    fn read_f64(&self, key: &str) -> Result<Option<f64>, Error> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<f64>() {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, value = %raw, error = %e, "ignoring unreadable stored coordinate");
                Ok(None)
            }
        }
    }
}

impl<K: KeyValueStore> LocationRepository for KvLocationRepository<K> {
    fn load(&self) -> Result<StoredLocation, Error> {
        let active = self
            .store
            .get(LOCATION_SHARING_ACTIVE_KEY)?
            .is_some_and(|v| v.trim() == "true");

        let position = match (self.read_f64(USER_LATITUDE_KEY)?, self.read_f64(USER_LONGITUDE_KEY)?) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        };

        let updated_at = self
            .store
            .get(LOCATION_UPDATED_AT_KEY)?
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|t| t.with_timezone(&Utc));

        Ok(StoredLocation {
            position,
            active,
            updated_at,
        })
    }

    fn save(&self, location: &StoredLocation) -> Result<(), Error> {
        self.store.set(
            LOCATION_SHARING_ACTIVE_KEY,
            if location.active { "true" } else { "false" },
        )?;
        match location.position {
            Some(position) => {
                self.store.set(USER_LATITUDE_KEY, &position.lat.to_string())?;
                self.store.set(USER_LONGITUDE_KEY, &position.lng.to_string())?;
            }
            None => {
                self.store.remove(USER_LATITUDE_KEY)?;
                self.store.remove(USER_LONGITUDE_KEY)?;
            }
        }
        match location.updated_at {
            Some(at) => self.store.set(LOCATION_UPDATED_AT_KEY, &at.to_rfc3339())?,
            None => {
                self.store.remove(LOCATION_UPDATED_AT_KEY)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use chrono::TimeZone;
    use curbside_store::{FileKvStore, MemoryKvStore};

    #[test]
    fn test_empty_store_is_inactive() {
        let repo = KvLocationRepository::new(MemoryKvStore::new());
        assert_eq!(repo.load().unwrap(), StoredLocation::inactive());
    }

    #[test]
    fn test_round_trip_through_flat_keys() {
        let store = Arc::new(MemoryKvStore::new());
        let repo = KvLocationRepository::new(Arc::clone(&store));
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
        let location = StoredLocation {
            position: Some(LatLng::new(37.7793, -122.4193)),
            active: true,
            updated_at: Some(at),
        };
        repo.save(&location).unwrap();

        assert_eq!(store.get(USER_LATITUDE_KEY).unwrap().as_deref(), Some("37.7793"));
        assert_eq!(store.get(USER_LONGITUDE_KEY).unwrap().as_deref(), Some("-122.4193"));
        assert_eq!(store.get(LOCATION_SHARING_ACTIVE_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(repo.load().unwrap(), location);
    }

    #[test]
    fn test_inactive_clears_position() {
        let store = Arc::new(MemoryKvStore::new());
        let repo = KvLocationRepository::new(Arc::clone(&store));
        repo.save(&StoredLocation {
            position: Some(LatLng::new(1.0, 2.0)),
            active: true,
            updated_at: None,
        })
        .unwrap();
        repo.save(&StoredLocation::inactive()).unwrap();
        assert_eq!(store.get(USER_LATITUDE_KEY).unwrap(), None);
        assert_eq!(repo.load().unwrap().restorable(), None);
    }

    #[test]
    fn test_garbage_coordinate_is_ignored() {
        let store = MemoryKvStore::new();
        store.set(USER_LATITUDE_KEY, "north").unwrap();
        store.set(USER_LONGITUDE_KEY, "-122.4").unwrap();
        store.set(LOCATION_SHARING_ACTIVE_KEY, "true").unwrap();
        let loaded = KvLocationRepository::new(store).load().unwrap();
        assert!(loaded.active);
        assert_eq!(loaded.position, None);
    }

    #[test]
    fn test_survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let location = StoredLocation {
            position: Some(LatLng::new(37.8, -122.27)),
            active: true,
            updated_at: None,
        };
        {
            let repo = KvLocationRepository::new(FileKvStore::open(dir.path().to_path_buf()).unwrap());
            repo.save(&location).unwrap();
        }
        let repo = KvLocationRepository::new(FileKvStore::open(dir.path().to_path_buf()).unwrap());
        assert_eq!(repo.load().unwrap(), location);
    }
}
