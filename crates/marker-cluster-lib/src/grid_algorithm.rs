//! Grid based clustering
//!
//! The map plane is cut into square cells of a fixed on-screen size and every
//! non-empty cell becomes one cluster positioned at the cell center. Cheap and
//! stable, but items on opposite sides of a cell edge never merge.

use crate::algorithm::{ClusteringAlgorithm, check_zoom};
use crate::store::{ItemStore, project_positions};
use crate::{ClusterError, ClusterItem, LatLng, LatLngBounds, Result, StaticCluster, utils};
use geo::Point;
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default cell edge, in screen points
pub const DEFAULT_CELL_SIZE_POINTS: f64 = 100.0;

/// Upper bound on cells per axis, keeps indices well inside `u64`
const MAX_CELLS_PER_AXIS: f64 = (1u64 << 31) as f64;

/// Stores at least this large compute cell indices on the rayon pool
const PARALLEL_CELL_THRESHOLD: usize = 1024;

/// Configuration for [`GridBasedClusterAlgorithm`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridAlgorithmConfig {
    /// Edge length of a grid cell, in screen points
    pub cell_size_points: f64,
}

impl Default for GridAlgorithmConfig {
    fn default() -> Self {
        Self {
            cell_size_points: DEFAULT_CELL_SIZE_POINTS,
        }
    }
}

/// Grid based clustering over an insertion ordered item store
#[derive(Debug)]
pub struct GridBasedClusterAlgorithm<T: ?Sized> {
    store: ItemStore<T>,
    config: GridAlgorithmConfig,
}

impl<T: ClusterItem + ?Sized> Default for GridBasedClusterAlgorithm<T> {
    fn default() -> Self {
        Self {
            store: ItemStore::new(),
            config: GridAlgorithmConfig::default(),
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem + ?Sized> GridBasedClusterAlgorithm<T> {
    /// Create an empty algorithm, validating the configuration
    pub fn new(config: GridAlgorithmConfig) -> Result<Self> {
        if !config.cell_size_points.is_finite() || config.cell_size_points <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "cell_size_points must be finite and positive, got {}",
                config.cell_size_points
            )));
        }
        Ok(Self {
            store: ItemStore::new(),
            config,
        })
    }

    /// Active configuration
    #[inline]
    pub fn config(&self) -> &GridAlgorithmConfig {
        &self.config
    }

    /// Number of cells along each axis at `zoom`
    pub fn cells_per_axis(&self, zoom: f64) -> u64 {
        let cells = (utils::WORLD_SIZE_POINTS * 2f64.powf(zoom) / self.config.cell_size_points).ceil();
        cells.clamp(1.0, MAX_CELLS_PER_AXIS) as u64
    }
}

/// Column and row of the cell holding `point`
#[inline(always)]
fn cell_of(point: Point<f64>, cells: u64) -> (u64, u64) {
    let n = cells as f64;
    let index = |v: f64| ((n * (1.0 + v) / 2.0).floor().max(0.0) as u64).min(cells - 1);
    (index(point.x()), index(point.y()))
}

/// Geometric center of a cell, back on the globe
fn cell_center(col: u64, row: u64, cells: u64) -> Result<LatLng> {
    let n = cells as f64;
    let center = |i: u64| (i as f64 + 0.5) * utils::MAP_PLANE_WIDTH / n + utils::MAP_PLANE_MIN;
    LatLng::from_map_point(Point::new(center(col), center(row)))
}

impl<T: ClusterItem + ?Sized> ClusteringAlgorithm<T> for GridBasedClusterAlgorithm<T> {
    fn add_items(&mut self, items: Vec<Arc<T>>) -> Result<usize> {
        let projected = project_positions(&items);
        let added = items
            .into_iter()
            .zip(projected)
            .filter_map(|(item, (position, point))| self.store.insert(item, position, point))
            .count();
        tracing::debug!(added, total = self.store.len(), "grid algorithm items added");
        Ok(added)
    }

    fn remove_item(&mut self, item: &Arc<T>) -> bool {
        self.store.remove(item).is_some()
    }

    fn clear_items(&mut self) {
        self.store.clear();
        tracing::debug!("grid algorithm cleared");
    }

    fn remove_items_not_in_bounds(&mut self, bounds: &LatLngBounds) -> usize {
        let outside = self.store.handles_where(|quad_item| !bounds.contains(&quad_item.position()));
        let removed = outside
            .into_iter()
            .filter(|handle| self.store.remove_handle(*handle).is_some())
            .count();
        tracing::debug!(removed, remaining = self.store.len(), "removed items outside bounds");
        removed
    }

    fn clusters(&self, zoom: f64) -> Result<Vec<StaticCluster<T>>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("grid_algorithm::clusters");

        check_zoom(zoom)?;
        let cells = self.cells_per_axis(zoom);

        let points: Vec<Point<f64>> = self.store.iter().map(|(_, quad_item)| quad_item.point()).collect();
        let cell_ids: Vec<(u64, u64)> = if points.len() >= PARALLEL_CELL_THRESHOLD {
            points.par_iter().map(|p| cell_of(*p, cells)).collect()
        } else {
            points.iter().map(|p| cell_of(*p, cells)).collect()
        };

        let mut slots: HashMap<(u64, u64), usize> = HashMap::new();
        let mut buckets: Vec<((u64, u64), Vec<Arc<T>>)> = Vec::new();
        for ((_, quad_item), cell) in self.store.iter().zip(cell_ids) {
            match slots.entry(cell) {
                Entry::Occupied(slot) => buckets[*slot.get()].1.push(quad_item.item().clone()),
                Entry::Vacant(slot) => {
                    slot.insert(buckets.len());
                    buckets.push((cell, vec![quad_item.item().clone()]));
                }
            }
        }

        let clusters = buckets
            .into_iter()
            .map(|((col, row), items)| Ok(StaticCluster::new(cell_center(col, row, cells)?, items)))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            zoom,
            cells,
            items = self.store.len(),
            clusters = clusters.len(),
            "grid clustering done"
        );
        Ok(clusters)
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(lat: f64, lng: f64) -> Arc<LatLng> {
        Arc::new(LatLng::new(lat, lng).unwrap())
    }

    fn algorithm() -> GridBasedClusterAlgorithm<LatLng> {
        GridBasedClusterAlgorithm::default()
    }

    #[test]
    fn test_invalid_config_rejected() {
        for cell_size_points in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let config = GridAlgorithmConfig { cell_size_points };
            assert!(matches!(
                GridBasedClusterAlgorithm::<LatLng>::new(config),
                Err(ClusterError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_cells_per_axis() {
        let algo = algorithm();
        // ceil(256 / 100)
        assert_eq!(algo.cells_per_axis(0.0), 3);
        // ceil(256 * 8 / 100)
        assert_eq!(algo.cells_per_axis(3.0), 21);
        assert_eq!(algo.cells_per_axis(-20.0), 1);
        assert_eq!(algo.cells_per_axis(200.0), 1u64 << 31);
    }

    #[test]
    fn test_cell_of_edges_clamp() {
        assert_eq!(cell_of(Point::new(-1.0, -1.0), 4), (0, 0));
        assert_eq!(cell_of(Point::new(1.0, 1.0), 4), (3, 3));
        assert_eq!(cell_of(Point::new(0.0, -0.5), 4), (2, 1));
    }

    #[test]
    fn test_cell_center_inverts_cell_of() {
        let cells = 21;
        for (col, row) in [(0, 0), (10, 3), (20, 20)] {
            let center = cell_center(col, row, cells).unwrap();
            assert_eq!(cell_of(center.to_map_point(), cells), (col, row));
        }
    }

    #[test]
    fn test_empty_gives_no_clusters() {
        assert!(algorithm().clusters(4.0).unwrap().is_empty());
    }

    #[test]
    fn test_same_cell_merges() {
        let mut algo = algorithm();
        let a = item(10.0, 10.0);
        let b = item(10.01, 10.01);
        let c = item(-40.0, -120.0);
        algo.add_items(vec![a, b, c.clone()]).unwrap();

        let clusters = algo.clusters(2.0).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].count(), 2);
        assert!(Arc::ptr_eq(&clusters[1].items()[0], &c));
    }

    #[test]
    fn test_cluster_position_is_cell_center() {
        let mut algo = algorithm();
        algo.add_item(item(10.0, 10.0)).unwrap();
        let zoom = 2.0;
        let cells = algo.cells_per_axis(zoom);
        let (col, row) = cell_of(item(10.0, 10.0).to_map_point(), cells);

        let clusters = algo.clusters(zoom).unwrap();
        assert_eq!(clusters[0].position(), cell_center(col, row, cells).unwrap());
    }

    #[test]
    fn test_first_seen_order() {
        let mut algo = algorithm();
        let far_east = item(0.0, 170.0);
        let far_west = item(0.0, -170.0);
        algo.add_items(vec![far_east.clone(), far_west.clone(), item(0.0, 169.9)])
            .unwrap();
        let clusters = algo.clusters(3.0).unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(Arc::ptr_eq(&clusters[0].items()[0], &far_east));
        assert_eq!(clusters[0].count(), 2);
        assert!(Arc::ptr_eq(&clusters[1].items()[0], &far_west));
    }

    #[test]
    fn test_partition_with_many_items() {
        let mut algo = algorithm();
        let items: Vec<_> = (0..3000)
            .map(|i| item(((i * 7) % 160) as f64 - 80.0, ((i * 13) % 340) as f64 - 170.0))
            .collect();
        algo.add_items(items.clone()).unwrap();

        for zoom in [0.0, 4.0, 12.0] {
            let clusters = algo.clusters(zoom).unwrap();
            assert_eq!(clusters.iter().map(|c| c.count()).sum::<usize>(), items.len());
        }
    }

    #[test]
    fn test_mutations() {
        let mut algo = algorithm();
        let a = item(1.0, 1.0);
        let b = item(5.0, 5.0);
        assert!(algo.add_item(a.clone()).unwrap());
        assert!(!algo.add_item(a.clone()).unwrap());
        algo.add_item(b.clone()).unwrap();

        let bounds = LatLngBounds::new(0.0, 0.0, 2.0, 2.0).unwrap();
        assert_eq!(algo.remove_items_not_in_bounds(&bounds), 1);
        assert!(algo.remove_item(&a));
        assert!(!algo.remove_item(&b));
        assert!(algo.is_empty());

        algo.add_item(b).unwrap();
        algo.clear_items();
        assert!(algo.clusters(10.0).unwrap().is_empty());
    }
}
