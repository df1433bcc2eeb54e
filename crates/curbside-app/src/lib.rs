//! Application service layer - config, repositories, queries, map sessions

pub mod config;
pub mod replay;
pub mod repository;
pub mod service;

pub use config::{Config, ViewportSize};
pub use replay::{ReplayReport, ReplayScript, ReplayStep, StepRecord};
pub use service::{ClusterExpansion, LocateReport, MapService, TruckFilter, TruckQueryService};
