//! Repository adapters for persistence layer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use curbside_domain::{Truck, TruckRepository};
use curbside_infra::{
    sample_trucks, FileTruckRepository, KvCameraRepository, KvLocationRepository,
    StaticTruckRepository,
};
use curbside_store::FileKvStore;
use curbside_types::Result;

use crate::config::Config;

/// Open the key-value store shared by the camera and location repositories
pub fn open_kv_store(config: &Config) -> Result<Arc<FileKvStore>> {
    let store_dir = config.store_dir()?;
    open_kv_store_at(store_dir)
}

/// Open the key-value store at a custom directory
pub fn open_kv_store_at(store_dir: PathBuf) -> Result<Arc<FileKvStore>> {
    FileKvStore::open(store_dir).map(Arc::new)
}

/// Open the camera repository over a shared store
pub fn open_camera_repo(store: &Arc<FileKvStore>) -> KvCameraRepository<Arc<FileKvStore>> {
    KvCameraRepository::new(Arc::clone(store))
}

/// Open the location repository over a shared store
pub fn open_location_repo(store: &Arc<FileKvStore>) -> KvLocationRepository<Arc<FileKvStore>> {
    KvLocationRepository::new(Arc::clone(store))
}

/// Open the truck dataset: `data` overrides the configured file; with
/// neither the built-in sample is used
pub fn open_truck_repo(config: &Config, data: Option<&Path>) -> Result<Box<dyn TruckRepository>> {
    match data.or(config.data_path.as_deref()) {
        Some(path) => {
            let repo = FileTruckRepository::new(path.to_path_buf())?;
            Ok(Box::new(repo))
        }
        None => Ok(Box::new(StaticTruckRepository::new(sample_trucks()))),
    }
}

/// Load all trucks from the selected dataset
pub fn load_trucks(config: &Config, data: Option<&Path>) -> Result<Vec<Truck>> {
    open_truck_repo(config, data)?.find_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use curbside_domain::CameraRepository;
    use curbside_types::{CameraState, LatLng};

    #[test]
    fn test_sample_dataset_when_unset() {
        let trucks = load_trucks(&Config::default(), None).unwrap();
        assert_eq!(trucks.len(), 7);
    }

    #[test]
    fn test_data_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trucks.json");
        std::fs::write(
            &path,
            r#"[{"id":"x","name":"X","coordinates":{"lat":1.0,"lng":2.0},"is_open":true}]"#,
        )
        .unwrap();
        let config = Config {
            data_path: Some(dir.path().join("missing.toml")),
            ..Config::default()
        };
        let trucks = load_trucks(&config, Some(&path)).unwrap();
        assert_eq!(trucks.len(), 1);
        assert!(load_trucks(&config, None).is_err());
    }

    #[test]
    fn test_repos_share_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            store_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let store = open_kv_store(&config).unwrap();
        let camera = CameraState::new(LatLng::new(37.8, -122.4), 13.0);
        open_camera_repo(&store).save(&camera).unwrap();

        let reopened = open_kv_store_at(dir.path().to_path_buf()).unwrap();
        assert_eq!(open_camera_repo(&reopened).load().unwrap(), Some(camera));
    }
}
