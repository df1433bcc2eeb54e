//! End-to-end runs of the curbside binary against a throwaway home directory

use std::path::Path;
use std::process::{Command, Output};

use tempfile::{tempdir, TempDir};

fn curbside(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_curbside"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run curbside")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(output: &Output) -> serde_json::Value {
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn home() -> TempDir {
    tempdir().unwrap()
}

#[test]
fn test_trucks_json_lists_sample() {
    let home = home();
    let trucks = json(&curbside(home.path(), &["trucks", "-f", "json"]));
    assert_eq!(trucks.as_array().unwrap().len(), 7);

    let open = json(&curbside(home.path(), &["trucks", "--open", "-f", "json"]));
    assert_eq!(open.as_array().unwrap().len(), 5);
}

#[test]
fn test_clusters_at_zoom_10() {
    let home = home();
    let features = json(&curbside(home.path(), &["clusters", "-z", "10", "-f", "json"]));
    let mut counts: Vec<u64> = features
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.get("point_count").and_then(|c| c.as_u64()).unwrap_or(1))
        .collect();
    counts.sort();
    assert_eq!(counts, vec![1, 2, 4]);
}

#[test]
fn test_visible_empty_area_message() {
    let home = home();
    let output = curbside(home.path(), &["visible", "--bounds", "0,0,1,1"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No food trucks in this area"));
}

#[test]
fn test_unknown_truck_fails() {
    let home = home();
    let output = curbside(home.path(), &["show", "nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: Truck not found: nope"));
}

#[test]
fn test_locate_saves_camera() {
    let home = home();
    let report = json(&curbside(
        home.path(),
        &["locate", "--at", "37.8044,-122.2712", "--permission", "granted", "-f", "json"],
    ));
    assert_eq!(report["state"]["state"], "located");
    assert_eq!(report["button"], "active");
    assert_eq!(report["stored"]["active"], true);

    let camera = json(&curbside(home.path(), &["camera", "-f", "json"]));
    assert_eq!(camera["zoom"], 14.0);

    let cleared = curbside(home.path(), &["camera", "--clear"]);
    assert!(cleared.status.success());
    let camera = json(&curbside(home.path(), &["camera", "-f", "json"]));
    assert!(camera.is_null());
}

#[test]
fn test_replay_script() {
    let home = home();
    let script = home.path().join("script.json");
    std::fs::write(
        &script,
        r#"{"steps": [
            {"action": "pan", "lat": 37.8716, "lng": -122.2727, "zoom": 15},
            {"action": "settle"},
            {"action": "click_truck", "id": "t7"}
        ]}"#,
    )
    .unwrap();
    let report = json(&curbside(home.path(), &["replay", script.to_str().unwrap(), "-f", "json"]));
    assert_eq!(report["selections"][0], "t7");
    assert_eq!(report["steps"].as_array().unwrap().len(), 3);
}

#[test]
fn test_config_set_and_show() {
    let home = home();
    let output = curbside(home.path(), &["config", "--set-theme", "dark", "--set-debounce", "250"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Configuration saved"));

    let shown = stdout(&curbside(home.path(), &["config", "--show"]));
    assert!(shown.contains("Theme:          dark"));
    assert!(shown.contains("Debounce:       250 ms"));
}

#[test]
fn test_dataset_override() {
    let home = home();
    let data = home.path().join("trucks.csv");
    std::fs::write(
        &data,
        "id,name,lat,lng,is_open\nx1,Solo Truck,40.0,-74.0,true\n",
    )
    .unwrap();
    let trucks = json(&curbside(home.path(), &["trucks", "--data", data.to_str().unwrap(), "-f", "json"]));
    assert_eq!(trucks.as_array().unwrap().len(), 1);
    assert_eq!(trucks[0]["id"], "x1");
}
