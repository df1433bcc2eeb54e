//! Shared, rebuildable handle to the cluster index

use std::sync::{Arc, RwLock};

use curbside_domain::service::{ClusterIndex, ClusterOptions};
use curbside_domain::{ClusterId, TruckPoint};
use curbside_types::MapError;

/// The clustered point source.
///
/// Readers take a snapshot `Arc`; a rebuild swaps in a new index without
/// disturbing lookups already running against the old one.
#[derive(Debug, Clone, Default)]
pub struct ClusterSource {
    inner: Arc<RwLock<Option<Arc<ClusterIndex>>>>,
}

impl ClusterSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index from scratch and make it current
    pub fn rebuild<I>(&self, points: I, options: ClusterOptions) -> Result<Arc<ClusterIndex>, MapError>
    where
        I: IntoIterator<Item = TruckPoint>,
    {
        let index = Arc::new(ClusterIndex::build(points, options)?);
        let mut slot = self.inner.write().unwrap_or_else(|p| p.into_inner());
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    pub fn clear(&self) {
        let mut slot = self.inner.write().unwrap_or_else(|p| p.into_inner());
        *slot = None;
    }

    pub fn current(&self) -> Option<Arc<ClusterIndex>> {
        self.inner.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// Asynchronous expansion lookup, resolved against whatever index is
    /// current when the lookup runs
    pub async fn expansion_zoom(&self, cluster_id: ClusterId) -> Result<u8, MapError> {
        tokio::task::yield_now().await;
        let index = self.current().ok_or(MapError::IndexNotReady)?;
        index.expansion_zoom(cluster_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_trucks;
    use curbside_types::LngLatBounds;

    fn points() -> Vec<TruckPoint> {
        sample_trucks().iter().map(|t| t.to_point()).collect()
    }

    #[tokio::test]
    async fn test_lookup_before_build_is_not_ready() {
        let source = ClusterSource::new();
        assert!(!source.is_ready());
        let err = source.expansion_zoom(ClusterId::from_raw(33)).await.unwrap_err();
        assert!(matches!(err, MapError::IndexNotReady));
    }

    #[tokio::test]
    async fn test_expansion_lookup() {
        let source = ClusterSource::new();
        let index = source.rebuild(points(), ClusterOptions::default()).unwrap();
        let cluster = index
            .clusters(&LngLatBounds::world(), 10.0)
            .into_iter()
            .find_map(|f| f.as_cluster().cloned())
            .unwrap();
        let zoom = source.expansion_zoom(cluster.id).await.unwrap();
        assert_eq!(zoom, index.expansion_zoom(cluster.id).unwrap());
    }

    #[test]
    fn test_clones_share_the_index() {
        let source = ClusterSource::new();
        let other = source.clone();
        source.rebuild(points(), ClusterOptions::default()).unwrap();
        assert_eq!(other.current().unwrap().len(), 7);
        other.clear();
        assert!(!source.is_ready());
    }
}
