//! Command handlers

use std::path::PathBuf;

use curbside_app::config::Config;
use curbside_app::repository::{load_trucks, open_kv_store};
use curbside_app::{MapService, ReplayScript, TruckFilter, TruckQueryService};
use curbside_types::{Error, LatLng, LngLatBounds, OutputFormat, PermissionState, Result, Theme};

use crate::cli::{Cli, Commands};
use crate::output;

pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref data) = cli.data {
        config.data_path = Some(data.clone());
    }
    let output_format = cli.format.unwrap_or(config.output_format);
    tracing::debug!(data = ?config.data_path, format = %output_format, "configuration loaded");

    match cli.command {
        Commands::Trucks { open, tag, near } => {
            let filter = TruckFilter { open_only: open, tag };
            cmd_trucks(&config, output_format, &filter, near)
        }
        Commands::Show { id } => cmd_show(&config, output_format, &id),
        Commands::Clusters { zoom, bounds } => cmd_clusters(&config, output_format, zoom, bounds),
        Commands::Expand { cluster_id } => cmd_expand(&config, output_format, cluster_id),
        Commands::Leaves {
            cluster_id,
            limit,
            offset,
        } => cmd_leaves(&config, output_format, cluster_id, limit, offset),
        Commands::Visible { bounds, near } => cmd_visible(&config, output_format, bounds, near),
        Commands::Locate { permission, at } => cmd_locate(config, output_format, permission, at),
        Commands::Camera { clear } => cmd_camera(config, output_format, clear),
        Commands::Replay { script } => cmd_replay(config, output_format, script),
        Commands::Config {
            show,
            set_output,
            set_data,
            clear_data,
            set_store_dir,
            set_theme,
            set_debounce,
            set_permission,
            set_position,
            reset,
        } => cmd_config(ConfigChanges {
            show,
            set_output,
            set_data,
            clear_data,
            set_store_dir,
            set_theme,
            set_debounce,
            set_permission,
            set_position,
            reset,
        }),
    }
}

fn query_service(config: &Config) -> Result<TruckQueryService> {
    let trucks = load_trucks(config, None)?;
    TruckQueryService::new(trucks, config.map.cluster)
}

fn map_service(config: Config) -> Result<MapService> {
    let trucks = load_trucks(&config, None)?;
    let store = open_kv_store(&config)?;
    Ok(MapService::new(config, trucks, store))
}

/// Map sessions spawn their debounce and lookup tasks on this runtime
fn runtime() -> Result<tokio::runtime::Runtime> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime)
}

fn cmd_trucks(
    config: &Config,
    output_format: OutputFormat,
    filter: &TruckFilter,
    near: Option<LatLng>,
) -> Result<()> {
    let service = query_service(config)?;
    let trucks = service.list(filter);
    let rows: Vec<_> = match near {
        Some(origin) => {
            let mut rows: Vec<_> = trucks
                .into_iter()
                .map(|t| (t, Some(origin.distance_km(&t.coordinates))))
                .collect();
            rows.sort_by(|a, b| a.1.unwrap_or(0.0).total_cmp(&b.1.unwrap_or(0.0)));
            rows
        }
        None => trucks.into_iter().map(|t| (t, None)).collect(),
    };
    output::print_trucks(output_format, &rows)
}

fn cmd_show(config: &Config, output_format: OutputFormat, id: &str) -> Result<()> {
    let service = query_service(config)?;
    output::print_truck(output_format, service.show(id)?)
}

fn cmd_clusters(
    config: &Config,
    output_format: OutputFormat,
    zoom: f64,
    bounds: Option<LngLatBounds>,
) -> Result<()> {
    if !zoom.is_finite() || zoom < 0.0 {
        return Err(Error::InvalidArgument(format!("zoom must be a non-negative number, got {}", zoom)));
    }
    let service = query_service(config)?;
    let bounds = bounds.unwrap_or_else(LngLatBounds::world);
    let features = service.clusters(&bounds, zoom);
    output::print_features(output_format, &features, zoom)
}

fn cmd_expand(config: &Config, output_format: OutputFormat, cluster_id: u64) -> Result<()> {
    let service = query_service(config)?;
    output::print_expansion(output_format, &service.expand(cluster_id)?)
}

fn cmd_leaves(
    config: &Config,
    output_format: OutputFormat,
    cluster_id: u64,
    limit: usize,
    offset: usize,
) -> Result<()> {
    let service = query_service(config)?;
    let leaves = service.leaves(cluster_id, limit, offset)?;
    output::print_leaves(output_format, cluster_id, &leaves)
}

fn cmd_visible(
    config: &Config,
    output_format: OutputFormat,
    bounds: Option<LngLatBounds>,
    near: Option<LatLng>,
) -> Result<()> {
    let service = query_service(config)?;
    let visible = service.visible(bounds);
    output::print_visible(output_format, &visible, near)
}

fn cmd_locate(
    mut config: Config,
    output_format: OutputFormat,
    permission: Option<PermissionState>,
    at: Option<LatLng>,
) -> Result<()> {
    if let Some(permission) = permission {
        config.geolocation.permission = permission;
    }
    if at.is_some() {
        config.geolocation.position = at;
    }
    let service = map_service(config)?;
    let report = runtime()?.block_on(service.locate())?;
    output::print_locate(output_format, &report)
}

fn cmd_camera(config: Config, output_format: OutputFormat, clear: bool) -> Result<()> {
    let service = map_service(config)?;
    if clear {
        service.clear_camera()?;
        println!("Saved camera cleared");
        return Ok(());
    }
    output::print_camera(output_format, service.saved_camera()?)
}

fn cmd_replay(config: Config, output_format: OutputFormat, script: PathBuf) -> Result<()> {
    let script = ReplayScript::load(&script)?;
    let service = map_service(config)?;
    let report = runtime()?.block_on(service.replay(&script))?;
    output::print_replay(output_format, &report)
}

struct ConfigChanges {
    show: bool,
    set_output: Option<OutputFormat>,
    set_data: Option<PathBuf>,
    clear_data: bool,
    set_store_dir: Option<PathBuf>,
    set_theme: Option<Theme>,
    set_debounce: Option<u64>,
    set_permission: Option<PermissionState>,
    set_position: Option<LatLng>,
    reset: bool,
}

fn cmd_config(changes: ConfigChanges) -> Result<()> {
    if changes.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(output_format) = changes.set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(path) = changes.set_data {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        config.data_path = Some(path);
        modified = true;
    }

    if changes.clear_data {
        config.data_path = None;
        modified = true;
    }

    if let Some(dir) = changes.set_store_dir {
        config.store_dir = Some(dir);
        modified = true;
    }

    if let Some(theme) = changes.set_theme {
        config.theme = theme;
        modified = true;
    }

    if let Some(debounce_ms) = changes.set_debounce {
        config.map.debounce_ms = debounce_ms;
        modified = true;
    }

    if let Some(permission) = changes.set_permission {
        config.geolocation.permission = permission;
        modified = true;
    }

    if let Some(position) = changes.set_position {
        config.geolocation.position = Some(position);
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration saved");
    }

    if changes.show || !modified {
        println!("{}", config);
    }

    Ok(())
}
