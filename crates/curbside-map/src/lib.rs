//! Map session runtime
//!
//! Wires the cluster index to a map surface: renders clusters and truck
//! markers, debounces viewport changes into the visible-truck store, and
//! tracks the user's location. The surface itself is a trait so a real map
//! library, or the bundled [`HeadlessSurface`], can sit behind it.

pub mod events;
pub mod headless;
pub mod location;
pub mod renderer;
pub mod session;
pub mod source;
pub mod style;
pub mod surface;
pub mod viewport;
pub mod visible;

#[cfg(test)]
mod test_support;

pub use events::{FeatureHit, MapEvent};
pub use headless::{HeadlessSurface, PlacedMarker, StyleLoadMode};
pub use location::{
    Geolocation, LocateButton, LocateOutcome, LocationState, TrackerSettings, UserLocationTracker,
};
pub use renderer::{ClickAction, ClusterRenderer, SelectionCallback};
pub use session::{MapConfig, MapSession, SessionDeps, StyleUrls};
pub use source::ClusterSource;
pub use style::{ClusterStyle, ClusterTier, MarkerPalette, Paint};
pub use surface::{
    CameraTransition, Cursor, EventKind, LayerPaint, LayerSpec, ListenerId, MapSurface, MarkerId,
    SurfaceHandle, TransitionKind, CLUSTER_COUNT_LAYER_ID, CLUSTER_LAYER_ID, POINT_LAYER_ID,
    TRUCK_SOURCE_ID,
};
pub use viewport::ViewportTracker;
pub use visible::VisibleTrucks;
