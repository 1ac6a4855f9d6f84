//! Insertion-ordered arena of cluster items
//!
//! Every added item gets a stable [`ItemHandle`] that is never reused. The
//! spatial index stores handles instead of references back into caller data, and
//! iterating the store visits items in the order they were added, which is what
//! makes clustering reproducible for a given input sequence.

use crate::item::{ClusterItem, ItemKey};
use crate::LatLng;
use geo::Point;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Batches at least this large are projected on the rayon pool
const PARALLEL_PROJECTION_THRESHOLD: usize = 1024;

/// Stable handle of an item inside an [`ItemStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemHandle(u64);

/// An item together with its cached position and map plane projection
#[derive(Debug)]
pub struct QuadItem<T: ?Sized> {
    item: Arc<T>,
    position: LatLng,
    point: Point<f64>,
}

impl<T: ?Sized> QuadItem<T> {
    /// The caller's item
    #[inline]
    pub fn item(&self) -> &Arc<T> {
        &self.item
    }

    /// Position captured when the item was added
    #[inline]
    pub fn position(&self) -> LatLng {
        self.position
    }

    /// Position projected onto the map plane
    #[inline]
    pub fn point(&self) -> Point<f64> {
        self.point
    }
}

/// Arena of [`QuadItem`]s keyed by [`ItemHandle`]
#[derive(Debug)]
pub struct ItemStore<T: ?Sized> {
    items: BTreeMap<ItemHandle, QuadItem<T>>,
    handles: HashMap<ItemKey, ItemHandle>,
    next_handle: u64,
}

impl<T: ?Sized> Default for ItemStore<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            handles: HashMap::new(),
            next_handle: 0,
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem + ?Sized> ItemStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item whose position was already projected
    ///
    /// Returns `None` when the very same item is already stored.
    pub fn insert(&mut self, item: Arc<T>, position: LatLng, point: Point<f64>) -> Option<ItemHandle> {
        let key = ItemKey::of(&item);
        if self.handles.contains_key(&key) {
            return None;
        }

        let handle = ItemHandle(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(key, handle);
        self.items.insert(
            handle,
            QuadItem {
                item,
                position,
                point,
            },
        );
        Some(handle)
    }

    /// Remove an item by identity
    pub fn remove(&mut self, item: &Arc<T>) -> Option<(ItemHandle, QuadItem<T>)> {
        let handle = self.handles.remove(&ItemKey::of(item))?;
        self.items.remove(&handle).map(|quad_item| (handle, quad_item))
    }

    /// Remove an item by handle
    pub fn remove_handle(&mut self, handle: ItemHandle) -> Option<QuadItem<T>> {
        let quad_item = self.items.remove(&handle)?;
        self.handles.remove(&ItemKey::of(&quad_item.item));
        Some(quad_item)
    }

    /// Look up an item by handle
    #[inline]
    pub fn get(&self, handle: ItemHandle) -> Option<&QuadItem<T>> {
        self.items.get(&handle)
    }

    /// Handle of a stored item
    #[inline]
    pub fn handle_of(&self, item: &Arc<T>) -> Option<ItemHandle> {
        self.handles.get(&ItemKey::of(item)).copied()
    }

    /// Check if the very same item is stored
    #[inline]
    pub fn contains(&self, item: &Arc<T>) -> bool {
        self.handles.contains_key(&ItemKey::of(item))
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ItemHandle, &QuadItem<T>)> + '_ {
        self.items.iter().map(|(handle, quad_item)| (*handle, quad_item))
    }

    /// Handles of items matching `predicate`, in insertion order
    pub fn handles_where(&self, mut predicate: impl FnMut(&QuadItem<T>) -> bool) -> Vec<ItemHandle> {
        self.items
            .iter()
            .filter(|(_, quad_item)| predicate(quad_item))
            .map(|(handle, _)| *handle)
            .collect()
    }

    /// Number of stored items
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every item
    ///
    /// Handles keep increasing afterwards, so stale handles never alias new items.
    pub fn clear(&mut self) {
        self.items.clear();
        self.handles.clear();
    }
}

/// Read and project the position of each item
///
/// Large batches run on the rayon pool; the output order matches the input.
pub fn project_positions<T: ClusterItem + ?Sized>(items: &[Arc<T>]) -> Vec<(LatLng, Point<f64>)> {
    #[cfg(feature = "profiling")]
    profiling::scope!("store::project_positions");

    let project = |item: &Arc<T>| {
        let position = item.position();
        (position, position.to_map_point())
    };

    if items.len() >= PARALLEL_PROJECTION_THRESHOLD {
        items.par_iter().map(project).collect()
    } else {
        items.iter().map(project).collect()
    }
}
