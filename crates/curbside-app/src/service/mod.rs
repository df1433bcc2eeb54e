//! Application services

mod map_service;
mod query;

pub use map_service::{LocateReport, MapService};
pub use query::{ClusterExpansion, TruckFilter, TruckQueryService};
