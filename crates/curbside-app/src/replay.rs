//! Scripted interaction replay against a headless map
//!
//! A script is a JSON file:
//!
//! ```json
//! {
//!   "deferred_style_load": false,
//!   "steps": [
//!     { "action": "pan", "lat": 37.79, "lng": -122.40, "zoom": 10 },
//!     { "action": "settle" },
//!     { "action": "click_cluster", "index": 0 },
//!     { "action": "settle" }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use curbside_domain::service::VisibleTruckSet;
use curbside_map::{CameraTransition, HeadlessSurface, MapSession};
use curbside_types::{CameraState, Error, LatLng, Result, Theme};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayStep {
    /// User gesture ending at a camera
    Pan { lat: f64, lng: f64, zoom: f64 },
    /// Wait for lookups, drain events and publish pending bounds
    Settle,
    /// Click the n-th rendered cluster, largest first
    ClickCluster {
        #[serde(default)]
        index: usize,
    },
    ClickTruck { id: String },
    Hover { layer: String, entered: bool },
    ToggleTheme,
    /// Finish a deferred style load
    StyleLoaded,
    Locate,
    Wait { ms: u64 },
}

impl ReplayStep {
    pub fn name(&self) -> &'static str {
        match self {
            ReplayStep::Pan { .. } => "pan",
            ReplayStep::Settle => "settle",
            ReplayStep::ClickCluster { .. } => "click_cluster",
            ReplayStep::ClickTruck { .. } => "click_truck",
            ReplayStep::Hover { .. } => "hover",
            ReplayStep::ToggleTheme => "toggle_theme",
            ReplayStep::StyleLoaded => "style_loaded",
            ReplayStep::Locate => "locate",
            ReplayStep::Wait { .. } => "wait",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Styles report loaded only on a `style_loaded` step
    #[serde(default)]
    pub deferred_style_load: bool,
    /// Starting theme; the configured theme when unset
    #[serde(default)]
    pub theme: Option<Theme>,
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// State after one step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub action: &'static str,
    pub camera: Option<CameraState>,
    /// Trucks in the published visible set
    pub visible: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepRecord>,
    /// Truck ids passed to the selection callback, in order
    pub selections: Vec<String>,
    pub transitions: Vec<CameraTransition>,
    pub theme: Theme,
    pub camera: Option<CameraState>,
    pub visible: VisibleTruckSet,
}

/// Run every step, then settle once more
pub async fn run(
    session: &mut MapSession<HeadlessSurface>,
    script: &ReplayScript,
    selections: &Arc<Mutex<Vec<String>>>,
) -> Result<ReplayReport> {
    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let note = run_step(session, step).await?;
        session.pump()?;
        tracing::debug!(index, action = step.name(), note = ?note, "replay step");
        steps.push(StepRecord {
            index,
            action: step.name(),
            camera: session.camera(),
            visible: session.visible().snapshot().len(),
            note,
        });
    }
    session.settle().await?;

    let transitions = session
        .with_surface(|s| s.transitions().to_vec())
        .unwrap_or_default();
    let selections = selections
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .clone();
    Ok(ReplayReport {
        steps,
        selections,
        transitions,
        theme: session.theme(),
        camera: session.camera(),
        visible: session.visible().snapshot(),
    })
}

async fn run_step(session: &mut MapSession<HeadlessSurface>, step: &ReplayStep) -> Result<Option<String>> {
    let note = match step {
        ReplayStep::Pan { lat, lng, zoom } => {
            let camera = CameraState::new(LatLng::new(*lat, *lng), *zoom);
            session.with_surface(|s| s.pan_to(camera));
            None
        }
        ReplayStep::Settle => {
            session.settle().await?;
            None
        }
        ReplayStep::ClickCluster { index } => {
            let mut clusters = session
                .with_surface(|s| s.rendered_clusters())
                .unwrap_or_default();
            clusters.sort_by(|a, b| b.point_count.cmp(&a.point_count).then(a.id.cmp(&b.id)));
            match clusters.get(*index) {
                Some(cluster) => {
                    let id = cluster.id;
                    let clicked = session.with_surface(|s| s.click_cluster(id)).unwrap_or(false);
                    Some(format!(
                        "cluster {} ({} trucks){}",
                        id,
                        cluster.point_count,
                        if clicked { "" } else { " not clickable" }
                    ))
                }
                None => Some(format!("no rendered cluster at index {}", index)),
            }
        }
        ReplayStep::ClickTruck { id } => {
            let clicked = session.with_surface(|s| s.click_truck(id)).unwrap_or(false);
            if clicked {
                None
            } else {
                Some(format!("truck {} is not rendered", id))
            }
        }
        ReplayStep::Hover { layer, entered } => {
            session.with_surface(|s| s.hover(layer, *entered));
            session
                .with_surface(|s| s.cursor())
                .map(|c| format!("cursor {:?}", c).to_lowercase())
        }
        ReplayStep::ToggleTheme => {
            let theme = session.toggle_theme()?;
            Some(format!("theme {}", theme))
        }
        ReplayStep::StyleLoaded => {
            let finished = session.with_surface(|s| s.finish_style_load()).unwrap_or(false);
            if finished {
                None
            } else {
                Some("no style load pending".to_string())
            }
        }
        ReplayStep::Locate => {
            let outcome = session.locate().await?;
            Some(outcome.to_string())
        }
        ReplayStep::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            None
        }
    };
    Ok(note)
}
