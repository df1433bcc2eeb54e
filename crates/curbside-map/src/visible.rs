//! Shared visible-truck store with change notification

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use curbside_domain::service::{VisibleTruckSet, VisibleTruckStore};
use curbside_domain::Truck;
use curbside_types::LngLatBounds;

/// Cloneable handle to the visible set.
///
/// The viewport tracker writes bounds; list views read snapshots or
/// subscribe and are woken only when the set actually changes.
#[derive(Debug, Clone)]
pub struct VisibleTrucks {
    store: Arc<Mutex<VisibleTruckStore>>,
    tx: Arc<watch::Sender<VisibleTruckSet>>,
}

impl VisibleTrucks {
    pub fn new(dataset: Vec<Truck>) -> Self {
        let store = VisibleTruckStore::new(dataset);
        let (tx, _) = watch::channel(store.visible().clone());
        Self {
            store: Arc::new(Mutex::new(store)),
            tx: Arc::new(tx),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VisibleTruckStore> {
        self.store.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Apply bounds and notify subscribers if the set changed
    pub fn set_bounds(&self, bounds: Option<LngLatBounds>) -> bool {
        let mut store = self.lock();
        if !store.set_bounds(bounds) {
            return false;
        }
        let visible = store.visible().clone();
        tracing::debug!(
            visible = visible.len(),
            total = visible.total,
            filtered = visible.is_filtered,
            "visible trucks updated"
        );
        self.tx.send_replace(visible);
        true
    }

    pub fn replace_dataset(&self, dataset: Vec<Truck>) {
        let mut store = self.lock();
        store.replace_dataset(dataset);
        self.tx.send_replace(store.visible().clone());
    }

    pub fn snapshot(&self) -> VisibleTruckSet {
        self.lock().visible().clone()
    }

    pub fn dataset(&self) -> Vec<Truck> {
        self.lock().dataset().to_vec()
    }

    pub fn bounds(&self) -> Option<LngLatBounds> {
        self.lock().bounds()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }

    pub fn subscribe(&self) -> watch::Receiver<VisibleTruckSet> {
        self.tx.subscribe()
    }
}
