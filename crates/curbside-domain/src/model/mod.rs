//! Domain model types

pub mod cluster;
pub mod truck;

pub use cluster::{Cluster, ClusterId, MapFeature};
pub use truck::{Truck, TruckPoint};
