//! The item capability consumed by the clustering engine

use crate::LatLng;
use std::sync::Arc;

/// Anything with a position that can be clustered
///
/// The engine only ever calls [`ClusterItem::position`], once per item when the
/// item is added. Items are handed over as `Arc<T>` and identified by that
/// allocation, never by their coordinate, so two items at the same place stay
/// two items.
pub trait ClusterItem: Send + Sync {
    /// Position of the item
    fn position(&self) -> LatLng;
}

impl ClusterItem for LatLng {
    fn position(&self) -> LatLng {
        *self
    }
}

/// Identity of a shared item, derived from its `Arc` allocation
///
/// Stays unique for as long as the engine holds its clone of the `Arc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey(usize);

impl ItemKey {
    /// Key of the allocation behind `item`
    #[inline]
    pub fn of<T: ?Sized>(item: &Arc<T>) -> Self {
        Self(Arc::as_ptr(item) as *const () as usize)
    }
}
