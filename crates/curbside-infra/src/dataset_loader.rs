//! Truck dataset loader for TOML, JSON and CSV files

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use curbside_domain::Truck;
use curbside_types::{Error, LatLng, Result};

/// On-disk dataset encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Toml,
    Json,
    Csv,
}

impl DatasetFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Ok(DatasetFormat::Toml),
            "json" => Ok(DatasetFormat::Json),
            "csv" => Ok(DatasetFormat::Csv),
            _ => Err(Error::Dataset(format!(
                "Unsupported dataset format: {}",
                path.display()
            ))),
        }
    }
}

/// Container for parsing trucks.toml
#[derive(Debug, Deserialize)]
struct TomlDataset {
    trucks: Vec<Truck>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDataset {
    List(Vec<Truck>),
    Wrapped { trucks: Vec<Truck> },
}

/// One CSV row; tags are `;`-separated
#[derive(Debug, Deserialize)]
struct CsvTruckRow {
    id: String,
    name: String,
    lat: f64,
    lng: f64,
    is_open: bool,
    rating: Option<f64>,
    tags: Option<String>,
    cuisine: Option<String>,
    description: Option<String>,
}

impl From<CsvTruckRow> for Truck {
    fn from(row: CsvTruckRow) -> Self {
        let tags = row
            .tags
            .map(|t| {
                t.split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Truck {
            id: row.id,
            name: row.name,
            coordinates: LatLng::new(row.lat, row.lng),
            is_open: row.is_open,
            rating: row.rating.unwrap_or(0.0),
            tags,
            cuisine: row.cuisine.filter(|s| !s.is_empty()),
            description: row.description.filter(|s| !s.is_empty()),
        }
    }
}

/// Truck dataset in file order
#[derive(Debug, Clone)]
pub struct TruckDatasetLoader {
    trucks: Vec<Truck>,
}

impl TruckDatasetLoader {
    /// Load a dataset, choosing the parser from the file extension
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let format = DatasetFormat::from_path(path)?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Dataset(format!("Failed to read dataset file: {}", e)))?;
        let loader = Self::load_from_str(&content, format)?;
        tracing::debug!(path = %path.display(), trucks = loader.count(), "dataset loaded");
        Ok(loader)
    }

    pub fn load_from_str(content: &str, format: DatasetFormat) -> Result<Self> {
        match format {
            DatasetFormat::Toml => Self::load_toml_str(content),
            DatasetFormat::Json => Self::load_json_str(content),
            DatasetFormat::Csv => Self::load_csv_str(content),
        }
    }

    /// `[[trucks]]` tables
    pub fn load_toml_str(toml_content: &str) -> Result<Self> {
        let dataset: TomlDataset = toml::from_str(toml_content)
            .map_err(|e| Error::Dataset(format!("Failed to parse dataset TOML: {}", e)))?;
        Self::from_trucks(dataset.trucks)
    }

    /// A bare array or `{ "trucks": [...] }`
    pub fn load_json_str(json_content: &str) -> Result<Self> {
        let dataset: JsonDataset = serde_json::from_str(json_content)
            .map_err(|e| Error::Dataset(format!("Failed to parse dataset JSON: {}", e)))?;
        let trucks = match dataset {
            JsonDataset::List(trucks) => trucks,
            JsonDataset::Wrapped { trucks } => trucks,
        };
        Self::from_trucks(trucks)
    }

    /// Header row required: `id,name,lat,lng,is_open,rating,tags,cuisine,description`
    pub fn load_csv_str(csv_content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_content.as_bytes());

        let mut trucks = Vec::new();
        for (row_idx, result) in reader.deserialize::<CsvTruckRow>().enumerate() {
            let row = result
                .map_err(|e| Error::Dataset(format!("Invalid dataset row {}: {}", row_idx + 2, e)))?;
            trucks.push(Truck::from(row));
        }
        Self::from_trucks(trucks)
    }

    /// Check ids are present and unique
    pub fn from_trucks(trucks: Vec<Truck>) -> Result<Self> {
        let mut seen = HashSet::new();
        for truck in &trucks {
            if truck.id.trim().is_empty() {
                return Err(Error::Dataset(format!("Truck \"{}\" has an empty id", truck.name)));
            }
            if !seen.insert(truck.id.as_str()) {
                return Err(Error::Dataset(format!("Duplicate truck id: {}", truck.id)));
            }
            if !truck.coordinates.is_valid() {
                tracing::warn!(truck_id = %truck.id, coordinates = %truck.coordinates, "truck has invalid coordinates");
            }
        }
        Ok(Self { trucks })
    }

    pub fn get(&self, id: &str) -> Option<&Truck> {
        self.trucks.iter().find(|t| t.id == id)
    }

    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    pub fn into_trucks(self) -> Vec<Truck> {
        self.trucks
    }

    pub fn count(&self) -> usize {
        self.trucks.len()
    }
}
