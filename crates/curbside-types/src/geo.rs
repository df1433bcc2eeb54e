//! Geographic primitives: coordinates, bounds and Web Mercator math

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// Mean earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the lat/lng domain
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance (haversine)
    pub fn distance_km(&self, other: &LatLng) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }

    pub fn approx_eq(&self, other: &LatLng, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon && (self.lng - other.lng).abs() <= epsilon
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// Parses `"lat,lng"`
impl FromStr for LatLng {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_floats(s)?;
        match parts.as_slice() {
            [lat, lng] => {
                let point = LatLng::new(*lat, *lng);
                if point.is_valid() {
                    Ok(point)
                } else {
                    Err(format!("coordinate out of range: {}", s))
                }
            }
            _ => Err(format!("expected \"lat,lng\", got \"{}\"", s)),
        }
    }
}

/// Wrap a longitude into [-180, 180]. Values already in range are untouched.
pub fn wrap_lng(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

/// Geographic rectangle given by its south-west and north-east corners.
///
/// A south-west longitude greater than the north-east longitude means the
/// rectangle crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LngLatBounds {
    pub const fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    pub fn from_edges(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    pub fn world() -> Self {
        Self::from_edges(-180.0, -90.0, 180.0, 90.0)
    }

    pub fn west(&self) -> f64 {
        self.south_west.lng
    }

    pub fn south(&self) -> f64 {
        self.south_west.lat
    }

    pub fn east(&self) -> f64 {
        self.north_east.lng
    }

    pub fn north(&self) -> f64 {
        self.north_east.lat
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west() > self.east()
    }

    /// Inclusive containment; points on an edge are inside.
    pub fn contains(&self, point: &LatLng) -> bool {
        if !point.lat.is_finite() || !point.lng.is_finite() {
            return false;
        }
        if point.lat < self.south() || point.lat > self.north() {
            return false;
        }
        let lng = wrap_lng(point.lng);
        let (west, east) = self.wrapped_lng_range();
        if west > east {
            lng >= west || lng <= east
        } else {
            lng >= west && lng <= east
        }
    }

    /// West and east edges wrapped into [-180, 180]. A span of 360 degrees or
    /// more covers every longitude. West above east means the range crosses
    /// the antimeridian.
    pub fn wrapped_lng_range(&self) -> (f64, f64) {
        if !self.crosses_antimeridian() && self.east() - self.west() >= 360.0 {
            return (-180.0, 180.0);
        }
        (wrap_lng(self.west()), wrap_lng(self.east()))
    }

    pub fn center(&self) -> LatLng {
        let lat = (self.south() + self.north()) / 2.0;
        let lng = if self.crosses_antimeridian() {
            wrap_lng((self.west() + self.east() + 360.0) / 2.0)
        } else {
            (self.west() + self.east()) / 2.0
        };
        LatLng::new(lat, lng)
    }
}

impl std::fmt::Display for LngLatBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.5}, {:.5}] - [{:.5}, {:.5}]",
            self.west(),
            self.south(),
            self.east(),
            self.north()
        )
    }
}

/// Parses `"west,south,east,north"`
impl FromStr for LngLatBounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_floats(s)?;
        match parts.as_slice() {
            [west, south, east, north] => {
                if south > north {
                    return Err(format!("south edge above north edge: {}", s));
                }
                Ok(LngLatBounds::from_edges(*west, *south, *east, *north))
            }
            _ => Err(format!("expected \"west,south,east,north\", got \"{}\"", s)),
        }
    }
}

fn parse_floats(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid number \"{}\": {}", part.trim(), e))
        })
        .collect()
}

/// Project a coordinate to normalized Web Mercator space, both axes in [0, 1].
pub fn project(point: &LatLng) -> (f64, f64) {
    let x = point.lng / 360.0 + 0.5;
    let sin = point.lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    (x, y.clamp(0.0, 1.0))
}

/// Inverse of [`project`]
pub fn unproject(x: f64, y: f64) -> LatLng {
    let lng = (x - 0.5) * 360.0;
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    let lat = 360.0 * y2.exp().atan() / PI - 90.0;
    LatLng::new(lat, lng)
}
