//! Truck repositories

use std::path::{Path, PathBuf};

use curbside_domain::{Truck, TruckRepository};
use curbside_types::Error;

use crate::dataset_loader::TruckDatasetLoader;

/// Dataset file repository (TOML, JSON or CSV)
pub struct FileTruckRepository {
    path: PathBuf,
    loader: TruckDatasetLoader,
}

impl FileTruckRepository {
    pub fn new(path: PathBuf) -> Result<Self, Error> {
        let loader = TruckDatasetLoader::load_from_file(&path)?;
        Ok(Self { path, loader })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload data from disk
    pub fn reload(&mut self) -> Result<(), Error> {
        self.loader = TruckDatasetLoader::load_from_file(&self.path)?;
        Ok(())
    }
}

impl TruckRepository for FileTruckRepository {
    fn find_all(&self) -> Result<Vec<Truck>, Error> {
        Ok(self.loader.trucks().to_vec())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Truck>, Error> {
        Ok(self.loader.get(id).cloned())
    }
}

/// Fixed in-memory dataset
#[derive(Debug, Clone, Default)]
pub struct StaticTruckRepository {
    trucks: Vec<Truck>,
}

impl StaticTruckRepository {
    pub fn new(trucks: Vec<Truck>) -> Self {
        Self { trucks }
    }
}

impl TruckRepository for StaticTruckRepository {
    fn find_all(&self) -> Result<Vec<Truck>, Error> {
        Ok(self.trucks.clone())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Truck>, Error> {
        Ok(self.trucks.iter().find(|t| t.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_data::sample_trucks;

    #[test]
    fn test_static_repository() {
        let repo = StaticTruckRepository::new(sample_trucks());
        assert_eq!(repo.find_all().unwrap().len(), 7);
        assert_eq!(repo.find_by_id("t7").unwrap().unwrap().name, "Berkeley Bao");
        assert!(repo.find_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_file_repository_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trucks.json");
        std::fs::write(&path, serde_json::to_string(&sample_trucks()).unwrap()).unwrap();

        let mut repo = FileTruckRepository::new(path.clone()).unwrap();
        assert_eq!(repo.find_all().unwrap().len(), 7);

        std::fs::write(&path, serde_json::to_string(&sample_trucks()[..2]).unwrap()).unwrap();
        repo.reload().unwrap();
        assert_eq!(repo.find_all().unwrap().len(), 2);
        assert_eq!(repo.path(), path.as_path());
    }
}
