//! Cluster snapshots produced by the algorithms

use crate::LatLng;
use std::fmt;
use std::sync::Arc;

/// An immutable group of items with a representative position
///
/// Each snapshot owns clones of the item `Arc`s, so it stays valid after the
/// algorithm that produced it is mutated or cleared.
pub struct StaticCluster<T: ?Sized> {
    position: LatLng,
    items: Vec<Arc<T>>,
}

impl<T: ?Sized> StaticCluster<T> {
    /// Create a cluster at `position` holding `items`
    pub fn new(position: LatLng, items: Vec<Arc<T>>) -> Self {
        Self { position, items }
    }

    /// Representative position of the cluster
    #[inline]
    pub fn position(&self) -> LatLng {
        self.position
    }

    /// Number of items in the cluster
    #[inline]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Items in the cluster
    #[inline]
    pub fn items(&self) -> &[Arc<T>] {
        &self.items
    }

    /// Take ownership of the items
    pub fn into_items(self) -> Vec<Arc<T>> {
        self.items
    }
}

impl<T: ?Sized> Clone for StaticCluster<T> {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            items: self.items.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for StaticCluster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCluster")
            .field("position", &self.position)
            .field("count", &self.items.len())
            .finish()
    }
}
