//! Output formatting module

use serde::Serialize;

use curbside_app::{ClusterExpansion, LocateReport, ReplayReport};
use curbside_domain::service::VisibleTruckSet;
use curbside_domain::{MapFeature, Truck, TruckPoint};
use curbside_types::{CameraState, LatLng, OutputFormat, Result};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    println!("{}", content);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn open_label(is_open: bool) -> &'static str {
    if is_open {
        "Yes"
    } else {
        "No"
    }
}

#[derive(Serialize)]
struct TruckRow<'a> {
    #[serde(flatten)]
    truck: &'a Truck,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_km: Option<f64>,
}

pub fn print_trucks(output_format: OutputFormat, rows: &[(&Truck, Option<f64>)]) -> Result<()> {
    if output_format == OutputFormat::Json {
        let rows: Vec<TruckRow> = rows
            .iter()
            .map(|(truck, distance_km)| TruckRow {
                truck: *truck,
                distance_km: *distance_km,
            })
            .collect();
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No trucks found.");
        return Ok(());
    }

    let with_distance = rows.iter().any(|(_, d)| d.is_some());
    print!("{:<10} {:<28} {:<5} {:>6} {:<22}", "ID", "Name", "Open", "Rating", "Position");
    if with_distance {
        print!(" {:>9}", "Distance");
    }
    println!();
    println!("{}", "-".repeat(if with_distance { 85 } else { 75 }));

    for (truck, distance) in rows {
        print!(
            "{:<10} {:<28} {:<5} {:>6.1} {:<22}",
            truncate(&truck.id, 10),
            truncate(&truck.name, 28),
            open_label(truck.is_open),
            truck.rating,
            truck.coordinates.to_string()
        );
        if let Some(km) = distance {
            print!(" {:>6.2} km", km);
        }
        println!();
    }
    println!("\n{} trucks", rows.len());
    Ok(())
}

pub fn print_truck(output_format: OutputFormat, truck: &Truck) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(truck);
    }

    println!("\n{}", truck.name);
    println!("{}", "=".repeat(truck.name.chars().count().max(3)));
    println!("ID:          {}", truck.id);
    println!("Open:        {}", open_label(truck.is_open));
    println!("Rating:      {:.1}", truck.rating);
    println!("Position:    {}", truck.coordinates);
    if let Some(ref cuisine) = truck.cuisine {
        println!("Cuisine:     {}", cuisine);
    }
    if !truck.tags.is_empty() {
        println!("Tags:        {}", truck.tags.join(", "));
    }
    if let Some(ref description) = truck.description {
        println!("\n{}", description);
    }
    Ok(())
}

fn print_feature_table(features: &[MapFeature]) {
    println!("{:<8} {:<12} {:>6} {:<22} {}", "Kind", "ID", "Count", "Position", "Name");
    println!("{}", "-".repeat(75));
    for feature in features {
        match feature {
            MapFeature::Cluster(c) => println!(
                "{:<8} {:<12} {:>6} {:<22}",
                "cluster",
                c.id.to_string(),
                c.abbreviated_count(),
                c.centroid.to_string()
            ),
            MapFeature::Truck(t) => println!(
                "{:<8} {:<12} {:>6} {:<22} {}",
                "truck",
                truncate(&t.id, 12),
                1,
                t.coordinates.to_string(),
                t.name
            ),
        }
    }
}

pub fn print_features(output_format: OutputFormat, features: &[MapFeature], zoom: f64) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(features);
    }

    if features.is_empty() {
        println!("No features at zoom {}.", zoom);
        return Ok(());
    }

    let clusters = features.iter().filter(|f| f.as_cluster().is_some()).count();
    println!("\nZoom {}: {} clusters, {} single trucks\n", zoom, clusters, features.len() - clusters);
    print_feature_table(features);
    Ok(())
}

pub fn print_expansion(output_format: OutputFormat, expansion: &ClusterExpansion) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(expansion);
    }

    println!("\nCluster {}", expansion.cluster_id);
    println!("Expansion zoom: {}", expansion.expansion_zoom);
    println!("Children:       {}\n", expansion.children.len());
    print_feature_table(&expansion.children);
    Ok(())
}

pub fn print_leaves(output_format: OutputFormat, cluster_id: u64, leaves: &[TruckPoint]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(leaves);
    }

    if leaves.is_empty() {
        println!("No trucks in cluster {} at this offset.", cluster_id);
        return Ok(());
    }

    println!("{:<10} {:<28} {:<5} {:<22}", "ID", "Name", "Open", "Position");
    println!("{}", "-".repeat(68));
    for point in leaves {
        println!(
            "{:<10} {:<28} {:<5} {:<22}",
            truncate(&point.id, 10),
            truncate(&point.name, 28),
            open_label(point.is_open),
            point.coordinates.to_string()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct VisibleOutput<'a> {
    #[serde(flatten)]
    set: &'a VisibleTruckSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

pub fn print_visible(output_format: OutputFormat, visible: &VisibleTruckSet, near: Option<LatLng>) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&VisibleOutput {
            set: visible,
            message: visible.empty_state_message(),
        });
    }

    if let Some(message) = visible.empty_state_message() {
        println!("{}", message);
        return Ok(());
    }

    match visible.bounds {
        Some(bounds) => println!("\nViewport {}", bounds),
        None => println!("\nNo viewport set, showing all trucks"),
    }
    println!("{} of {} trucks visible\n", visible.len(), visible.total);

    let rows: Vec<(&Truck, Option<f64>)> = match near {
        Some(origin) => visible
            .sorted_by_distance(&origin)
            .into_iter()
            .map(|(t, d)| (t, Some(d)))
            .collect(),
        None => visible.trucks.iter().map(|t| (t, None)).collect(),
    };
    print_trucks(OutputFormat::Table, &rows)
}

pub fn print_locate(output_format: OutputFormat, report: &LocateReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(report);
    }

    println!("\nLocate Result");
    println!("=============");
    println!("Outcome:     {}", report.outcome);
    println!("State:       {:?}", report.state);
    println!("Button:      {:?}", report.button);
    if let Some(position) = report.marker {
        println!("Marker:      {}", position);
    }
    if let Some(camera) = report.camera {
        println!("Camera:      {}", camera);
    }
    println!(
        "Sharing:     {}",
        if report.stored.active { "active" } else { "inactive" }
    );
    Ok(())
}

pub fn print_camera(output_format: OutputFormat, camera: Option<CameraState>) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&camera);
    }

    match camera {
        Some(camera) => println!("Saved camera: {}", camera),
        None => println!("No saved camera."),
    }
    Ok(())
}

pub fn print_replay(output_format: OutputFormat, report: &ReplayReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(report);
    }

    println!("{:>4} {:<14} {:<28} {:>7}  {}", "#", "Action", "Camera", "Visible", "Note");
    println!("{}", "-".repeat(80));
    for step in &report.steps {
        println!(
            "{:>4} {:<14} {:<28} {:>7}  {}",
            step.index,
            step.action,
            step.camera.map(|c| c.to_string()).unwrap_or_default(),
            step.visible,
            step.note.as_deref().unwrap_or("")
        );
    }

    println!("\nTheme:       {}", report.theme);
    if let Some(camera) = report.camera {
        println!("Camera:      {}", camera);
    }
    println!("Transitions: {}", report.transitions.len());
    if report.selections.is_empty() {
        println!("Selected:    (none)");
    } else {
        println!("Selected:    {}", report.selections.join(", "));
    }
    match report.visible.empty_state_message() {
        Some(message) => println!("\n{}", message),
        None => println!("Visible:     {}", report.visible.ids().join(", ")),
    }
    Ok(())
}
