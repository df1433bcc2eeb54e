//! Built-in Bay Area dataset used when no data file is given

use curbside_domain::Truck;
use curbside_types::LatLng;

#[allow(clippy::too_many_arguments)]
fn truck(
    id: &str,
    name: &str,
    lat: f64,
    lng: f64,
    is_open: bool,
    rating: f64,
    tags: &[&str],
    cuisine: &str,
    description: &str,
) -> Truck {
    Truck {
        id: id.to_string(),
        name: name.to_string(),
        coordinates: LatLng::new(lat, lng),
        is_open,
        rating,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        cuisine: Some(cuisine.to_string()),
        description: Some(description.to_string()),
    }
}

/// Seven trucks: four around downtown San Francisco, two near Lake
/// Merritt in Oakland and one in Berkeley
pub fn sample_trucks() -> Vec<Truck> {
    vec![
        truck(
            "t1",
            "Taco Loco",
            37.7890,
            -122.4010,
            true,
            4.6,
            &["tacos", "mexican"],
            "Mexican",
            "Al pastor off the trompo, late nights on Market",
        ),
        truck(
            "t2",
            "Curry Up Now",
            37.7920,
            -122.3990,
            true,
            4.4,
            &["indian", "burritos"],
            "Indian",
            "Tikka masala burritos and sexy fries",
        ),
        truck(
            "t3",
            "Señor Sisig",
            37.7875,
            -122.4045,
            false,
            4.7,
            &["filipino", "fusion"],
            "Filipino",
            "Pork sisig tacos and silog plates",
        ),
        truck(
            "t4",
            "Kasa Express",
            37.7905,
            -122.3965,
            true,
            4.2,
            &["indian", "rolls"],
            "Indian",
            "Kati rolls and thalis",
        ),
        truck(
            "t5",
            "Oakland BBQ Wagon",
            37.8044,
            -122.2712,
            true,
            4.5,
            &["bbq", "southern"],
            "Barbecue",
            "Brisket and hot links by the pound",
        ),
        truck(
            "t6",
            "Lake Merritt Dumplings",
            37.8080,
            -122.2650,
            false,
            4.3,
            &["dumplings", "chinese"],
            "Chinese",
            "Hand-folded pork and chive dumplings",
        ),
        truck(
            "t7",
            "Berkeley Bao",
            37.8716,
            -122.2727,
            true,
            4.8,
            &["bao", "taiwanese"],
            "Taiwanese",
            "Gua bao and scallion pancakes near campus",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset_loader::TruckDatasetLoader;

    #[test]
    fn test_sample_is_a_valid_dataset() {
        let loader = TruckDatasetLoader::from_trucks(sample_trucks()).unwrap();
        assert_eq!(loader.count(), 7);
        assert!(loader.trucks().iter().all(|t| t.coordinates.is_valid()));
        assert!(loader.trucks().iter().any(|t| !t.is_open));
    }
}
