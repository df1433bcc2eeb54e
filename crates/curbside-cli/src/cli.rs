//! CLI definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use curbside_types::{LatLng, LngLatBounds, OutputFormat, PermissionState, Theme};

#[derive(Parser)]
#[command(name = "curbside")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Food truck map core: clustering, viewport filtering and location tracking")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Truck dataset (TOML, JSON or CSV). Uses config value or the built-in sample if not specified.
    #[arg(long, short = 'd', global = true)]
    pub data: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List trucks in the dataset
    Trucks {
        /// Only trucks that are open now
        #[arg(long)]
        open: bool,

        /// Filter by tag or cuisine (case-insensitive)
        #[arg(long, short = 't')]
        tag: Option<String>,

        /// Sort by distance from "lat,lng"
        #[arg(long, allow_hyphen_values = true)]
        near: Option<LatLng>,
    },

    /// Show one truck
    Show {
        /// Truck id
        id: String,
    },

    /// Clusters and single trucks rendered at a zoom level
    Clusters {
        /// Zoom level
        #[arg(long, short = 'z', default_value_t = 10.0)]
        zoom: f64,

        /// Viewport as "west,south,east,north". Whole world if not specified.
        #[arg(long, short = 'b', allow_hyphen_values = true)]
        bounds: Option<LngLatBounds>,
    },

    /// What clicking a cluster reveals: expansion zoom and children
    Expand {
        /// Cluster id from the clusters command
        cluster_id: u64,
    },

    /// Member trucks of a cluster
    Leaves {
        /// Cluster id from the clusters command
        cluster_id: u64,

        /// Maximum number of trucks
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,

        /// Trucks to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Trucks inside a viewport, as the list view shows them
    Visible {
        /// Viewport as "west,south,east,north". Full dataset if not specified.
        #[arg(long, short = 'b', allow_hyphen_values = true)]
        bounds: Option<LngLatBounds>,

        /// Sort by distance from "lat,lng"
        #[arg(long, allow_hyphen_values = true)]
        near: Option<LatLng>,
    },

    /// Press the locate control once on a headless map
    Locate {
        /// Permission answer (overrides config)
        #[arg(long)]
        permission: Option<PermissionState>,

        /// Device position as "lat,lng" (overrides config)
        #[arg(long, allow_hyphen_values = true)]
        at: Option<LatLng>,
    },

    /// Show or clear the saved camera
    Camera {
        /// Forget the saved camera
        #[arg(long)]
        clear: bool,
    },

    /// Replay a JSON interaction script against a headless map
    Replay {
        /// Path to script file
        script: PathBuf,
    },

    /// Configure settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set dataset file
        #[arg(long)]
        set_data: Option<PathBuf>,

        /// Use the built-in sample dataset
        #[arg(long)]
        clear_data: bool,

        /// Set store directory
        #[arg(long)]
        set_store_dir: Option<PathBuf>,

        /// Set basemap theme
        #[arg(long)]
        set_theme: Option<Theme>,

        /// Set viewport debounce in milliseconds
        #[arg(long)]
        set_debounce: Option<u64>,

        /// Set geolocation permission answer
        #[arg(long)]
        set_permission: Option<PermissionState>,

        /// Set device position as "lat,lng"
        #[arg(long, allow_hyphen_values = true)]
        set_position: Option<LatLng>,

        /// Reset to default configuration
        #[arg(long)]
        reset: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds_with_negative_longitudes() {
        let cli = Cli::try_parse_from([
            "curbside",
            "visible",
            "--bounds",
            "-122.30,37.79,-122.25,37.82",
        ])
        .unwrap();
        match cli.command {
            Commands::Visible { bounds, near } => {
                let bounds = bounds.unwrap();
                assert_eq!(bounds.west(), -122.30);
                assert_eq!(bounds.north(), 37.82);
                assert!(near.is_none());
            }
            _ => panic!("expected visible"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["curbside", "trucks", "--open", "-f", "json", "-v"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Trucks { open: true, .. }));
    }

    #[test]
    fn test_rejects_bad_position() {
        assert!(Cli::try_parse_from(["curbside", "locate", "--at", "91,0"]).is_err());
        let cli = Cli::try_parse_from(["curbside", "locate", "--at", "37.8,-122.27", "--permission", "denied"]).unwrap();
        match cli.command {
            Commands::Locate { permission, at } => {
                assert_eq!(permission, Some(PermissionState::Denied));
                assert_eq!(at, Some(LatLng::new(37.8, -122.27)));
            }
            _ => panic!("expected locate"),
        }
    }
}
