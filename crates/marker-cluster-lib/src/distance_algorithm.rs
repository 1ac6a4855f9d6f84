//! Non-hierarchical distance based clustering
//!
//! A greedy single pass over the items in insertion order. Each item that is
//! not yet part of a cluster becomes a seed: every unclaimed item inside the
//! square window of half-width `radius` around the seed joins its cluster, and
//! claimed items are never looked at again. The window is axis aligned on the
//! map plane, so the effective metric is the Chebyshev distance between
//! projected points.
//!
//! The radius is given in screen points and converted to map units for the
//! requested zoom, so clusters split apart as the user zooms in.

use crate::algorithm::{ClusteringAlgorithm, check_zoom};
use crate::geometry::square_around;
use crate::quadtree::{PointQuadtree, QuadtreeConfig};
use crate::store::{ItemHandle, ItemStore, project_positions};
use crate::{ClusterError, ClusterItem, LatLngBounds, Result, StaticCluster, utils};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default clustering distance, in screen points
pub const DEFAULT_MAX_DISTANCE_AT_ZOOM: f64 = 100.0;

/// Configuration for [`NonHierarchicalDistanceBasedAlgorithm`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceAlgorithmConfig {
    /// Maximum separation, in screen points, of items merged into one cluster
    pub max_distance_at_zoom: f64,
    /// Split parameters of the spatial index
    pub quadtree: QuadtreeConfig,
}

impl Default for DistanceAlgorithmConfig {
    fn default() -> Self {
        Self {
            max_distance_at_zoom: DEFAULT_MAX_DISTANCE_AT_ZOOM,
            quadtree: QuadtreeConfig::default(),
        }
    }
}

impl DistanceAlgorithmConfig {
    fn validate(&self) -> Result<()> {
        if !self.max_distance_at_zoom.is_finite() || self.max_distance_at_zoom < 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "max_distance_at_zoom must be finite and non-negative, got {}",
                self.max_distance_at_zoom
            )));
        }
        if self.quadtree.max_elements == 0 {
            return Err(ClusterError::InvalidConfig(
                "quadtree max_elements must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Greedy distance based clustering backed by a point quadtree
#[derive(Debug)]
pub struct NonHierarchicalDistanceBasedAlgorithm<T: ?Sized> {
    store: ItemStore<T>,
    quadtree: PointQuadtree<ItemHandle>,
    config: DistanceAlgorithmConfig,
}

impl<T: ClusterItem + ?Sized> Default for NonHierarchicalDistanceBasedAlgorithm<T> {
    fn default() -> Self {
        let config = DistanceAlgorithmConfig::default();
        Self {
            store: ItemStore::new(),
            quadtree: PointQuadtree::map_plane(config.quadtree),
            config,
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem + ?Sized> NonHierarchicalDistanceBasedAlgorithm<T> {
    /// Create an empty algorithm, validating the configuration
    pub fn new(config: DistanceAlgorithmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: ItemStore::new(),
            quadtree: PointQuadtree::map_plane(config.quadtree),
            config,
        })
    }

    /// Active configuration
    #[inline]
    pub fn config(&self) -> &DistanceAlgorithmConfig {
        &self.config
    }

    /// The spatial index over the stored items
    #[inline]
    pub fn quadtree(&self) -> &PointQuadtree<ItemHandle> {
        &self.quadtree
    }

    /// Compact the spatial index after heavy removal churn
    pub fn rebuild_index(&mut self) {
        self.quadtree.rebuild();
    }

    /// Search radius in map plane units at `zoom`
    pub fn radius_at_zoom(&self, zoom: f64) -> f64 {
        (self.config.max_distance_at_zoom * utils::map_units_per_point(zoom)).min(utils::MAP_PLANE_WIDTH)
    }

    fn remove_handle(&mut self, handle: ItemHandle) -> bool {
        match self.store.remove_handle(handle) {
            Some(quad_item) => {
                let removed = self.quadtree.remove(quad_item.point(), handle);
                debug_assert!(removed, "stored item missing from the quadtree");
                true
            }
            None => false,
        }
    }

    fn singletons(&self) -> Vec<StaticCluster<T>> {
        self.store
            .iter()
            .map(|(_, quad_item)| StaticCluster::new(quad_item.position(), vec![quad_item.item().clone()]))
            .collect()
    }
}

impl<T: ClusterItem + ?Sized> ClusteringAlgorithm<T> for NonHierarchicalDistanceBasedAlgorithm<T> {
    fn add_items(&mut self, items: Vec<Arc<T>>) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("distance_algorithm::add_items");

        let projected = project_positions(&items);
        let mut added = 0;
        for (item, (position, point)) in items.into_iter().zip(projected) {
            let Some(handle) = self.store.insert(item, position, point) else {
                continue;
            };
            if let Err(err) = self.quadtree.insert(point, handle) {
                self.store.remove_handle(handle);
                return Err(err);
            }
            added += 1;
        }

        tracing::debug!(added, total = self.store.len(), "distance algorithm items added");
        Ok(added)
    }

    fn remove_item(&mut self, item: &Arc<T>) -> bool {
        match self.store.handle_of(item) {
            Some(handle) => self.remove_handle(handle),
            None => false,
        }
    }

    fn clear_items(&mut self) {
        self.store.clear();
        self.quadtree.clear();
        tracing::debug!("distance algorithm cleared");
    }

    fn remove_items_not_in_bounds(&mut self, bounds: &LatLngBounds) -> usize {
        let outside = self.store.handles_where(|quad_item| !bounds.contains(&quad_item.position()));
        let removed = outside.into_iter().filter(|handle| self.remove_handle(*handle)).count();
        tracing::debug!(removed, remaining = self.store.len(), "removed items outside bounds");
        removed
    }

    fn clusters(&self, zoom: f64) -> Result<Vec<StaticCluster<T>>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("distance_algorithm::clusters");

        check_zoom(zoom)?;
        if self.config.max_distance_at_zoom == 0.0 {
            return Ok(self.singletons());
        }

        let radius = self.radius_at_zoom(zoom);
        let mut assigned: HashSet<ItemHandle> = HashSet::with_capacity(self.store.len());
        let mut clusters = Vec::new();

        for (seed_handle, seed) in self.store.iter() {
            if assigned.contains(&seed_handle) {
                continue;
            }

            let window = square_around(seed.point(), radius)?;
            let mut members: SmallVec<[ItemHandle; 8]> = SmallVec::new();
            members.push(seed_handle);
            assigned.insert(seed_handle);
            for handle in self.quadtree.search(window)? {
                if assigned.insert(handle) {
                    members.push(handle);
                }
            }

            let items = members
                .iter()
                .filter_map(|handle| self.store.get(*handle))
                .map(|quad_item| quad_item.item().clone())
                .collect();
            clusters.push(StaticCluster::new(seed.position(), items));
        }

        debug_assert_eq!(assigned.len(), self.store.len());
        debug_assert_eq!(
            clusters.iter().map(StaticCluster::count).sum::<usize>(),
            self.store.len()
        );

        tracing::debug!(
            zoom,
            radius,
            items = self.store.len(),
            clusters = clusters.len(),
            "distance clustering done"
        );
        Ok(clusters)
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}
