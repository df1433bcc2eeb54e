//! Domain services

pub mod cluster_index;
pub mod visible_set;

pub use cluster_index::{ClusterIndex, ClusterOptions};
pub use visible_set::{VisibleTruckSet, VisibleTruckStore, EMPTY_STATE_MESSAGE};
