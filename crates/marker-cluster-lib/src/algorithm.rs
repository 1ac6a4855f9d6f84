//! The interface shared by all clustering algorithms

use crate::{ClusterError, ClusterItem, LatLngBounds, Result, StaticCluster};
use std::sync::Arc;

/// A mutable item collection that groups its items for a given zoom level
///
/// Items are identified by their `Arc` allocation. Adding an item that is
/// already present is a no-op and removing an absent one is silently ignored.
/// No operation here triggers a recluster by itself; callers decide when to ask
/// for [`ClusteringAlgorithm::clusters`].
pub trait ClusteringAlgorithm<T: ClusterItem + ?Sized>: Send {
    /// Add a batch of items, returning how many were new
    fn add_items(&mut self, items: Vec<Arc<T>>) -> Result<usize>;

    /// Add a single item, returning whether it was new
    fn add_item(&mut self, item: Arc<T>) -> Result<bool> {
        self.add_items(vec![item]).map(|added| added > 0)
    }

    /// Remove an item by identity, returning whether it was present
    fn remove_item(&mut self, item: &Arc<T>) -> bool;

    /// Remove a batch of items, returning how many were present
    fn remove_items(&mut self, items: &[Arc<T>]) -> usize {
        items.iter().filter(|item| self.remove_item(item)).count()
    }

    /// Remove every item
    fn clear_items(&mut self);

    /// Drop items whose position lies outside `bounds`, returning how many were dropped
    fn remove_items_not_in_bounds(&mut self, bounds: &LatLngBounds) -> usize;

    /// Compute a fresh set of clusters for `zoom`
    ///
    /// Every stored item appears in exactly one returned cluster. Fails on a
    /// non-finite zoom.
    fn clusters(&self, zoom: f64) -> Result<Vec<StaticCluster<T>>>;

    /// Number of stored items
    fn len(&self) -> usize;

    /// Check if no items are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reject zoom levels no camera can produce
pub(crate) fn check_zoom(zoom: f64) -> Result<()> {
    if zoom.is_finite() {
        Ok(())
    } else {
        Err(ClusterError::InvalidZoom(zoom))
    }
}
