//! Property tests for the clustering algorithms

use marker_cluster_lib::{
    ClusteringAlgorithm, DistanceAlgorithmConfig, GridBasedClusterAlgorithm, LatLng, LatLngBounds,
    NonHierarchicalDistanceBasedAlgorithm, PointQuadtree, checked_rect, utils,
};
use quickcheck::{QuickCheck, TestResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;

/// Map raw grid coordinates into a small box so that clusters actually form
fn markers(raw: &[(u16, u16)]) -> Vec<Arc<LatLng>> {
    raw.iter()
        .map(|(a, b)| {
            let lat = 40.0 + (*a as f64 / u16::MAX as f64) * 2.0;
            let lng = 10.0 + (*b as f64 / u16::MAX as f64) * 2.0;
            Arc::new(LatLng::new(lat, lng).unwrap())
        })
        .collect()
}

fn zoom_of(z: u8) -> f64 {
    (z % 20) as f64
}

fn algorithms() -> Vec<Box<dyn ClusteringAlgorithm<LatLng>>> {
    vec![
        Box::new(NonHierarchicalDistanceBasedAlgorithm::<LatLng>::default()),
        Box::new(GridBasedClusterAlgorithm::<LatLng>::default()),
    ]
}

fn key(item: &Arc<LatLng>) -> usize {
    Arc::as_ptr(item) as usize
}

#[test]
fn test_clusters_partition_the_items() {
    fn prop(raw: Vec<(u16, u16)>, z: u8) -> TestResult {
        let items = markers(&raw);
        let expected: HashSet<usize> = items.iter().map(key).collect();

        for mut algorithm in algorithms() {
            algorithm.add_items(items.clone()).unwrap();
            let clusters = algorithm.clusters(zoom_of(z)).unwrap();

            let mut seen = HashSet::new();
            for cluster in &clusters {
                if cluster.count() == 0 {
                    return TestResult::failed();
                }
                for item in cluster.items() {
                    // Disjoint
                    if !seen.insert(key(item)) {
                        return TestResult::failed();
                    }
                }
            }
            // Complete
            if seen != expected {
                return TestResult::failed();
            }
        }
        TestResult::passed()
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Vec<(u16, u16)>, u8) -> TestResult);
}

#[test]
fn test_distance_seeds_are_separated() {
    fn prop(raw: Vec<(u16, u16)>, z: u8) -> TestResult {
        let zoom = zoom_of(z);
        let mut algorithm = NonHierarchicalDistanceBasedAlgorithm::<LatLng>::default();
        algorithm.add_items(markers(&raw)).unwrap();
        let radius = algorithm.radius_at_zoom(zoom);
        let clusters = algorithm.clusters(zoom).unwrap();

        // Same closed window arithmetic as the clustering pass
        let within = |p: geo::Point<f64>, seed: geo::Point<f64>| {
            let window = checked_rect(
                seed.x() - radius,
                seed.y() - radius,
                seed.x() + radius,
                seed.y() + radius,
            )
            .unwrap();
            p.x() >= window.min().x
                && p.x() <= window.max().x
                && p.y() >= window.min().y
                && p.y() <= window.max().y
        };

        for (i, cluster) in clusters.iter().enumerate() {
            let seed = cluster.position().to_map_point();
            // Every member lies within its own seed's window
            if !cluster.items().iter().all(|item| within(item.to_map_point(), seed)) {
                return TestResult::failed();
            }
            // No later seed lies within an earlier seed's window
            for later in &clusters[i + 1..] {
                if within(later.position().to_map_point(), seed) {
                    return TestResult::failed();
                }
            }
        }
        TestResult::passed()
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Vec<(u16, u16)>, u8) -> TestResult);
}

#[test]
fn test_clusters_are_idempotent() {
    fn prop(raw: Vec<(u16, u16)>, z: u8) -> bool {
        let items = markers(&raw);
        algorithms().into_iter().all(|mut algorithm| {
            algorithm.add_items(items.clone()).unwrap();
            let first = algorithm.clusters(zoom_of(z)).unwrap();
            let second = algorithm.clusters(zoom_of(z)).unwrap();
            first.len() == second.len()
                && first.iter().zip(&second).all(|(a, b)| {
                    a.position() == b.position()
                        && a.items().iter().map(key).eq(b.items().iter().map(key))
                })
        })
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<(u16, u16)>, u8) -> bool);
}

#[test]
fn test_clear_leaves_nothing() {
    fn prop(raw: Vec<(u16, u16)>, z: u8) -> bool {
        let items = markers(&raw);
        algorithms().into_iter().all(|mut algorithm| {
            algorithm.add_items(items.clone()).unwrap();
            algorithm.clear_items();
            algorithm.is_empty() && algorithm.clusters(zoom_of(z)).unwrap().is_empty()
        })
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<(u16, u16)>, u8) -> bool);
}

#[test]
fn test_bounds_removal_keeps_exactly_inside() {
    fn prop(raw: Vec<(u16, u16)>, corner: (u16, u16)) -> bool {
        let items = markers(&raw);
        let lat = 40.0 + (corner.0 as f64 / u16::MAX as f64) * 2.0;
        let lng = 10.0 + (corner.1 as f64 / u16::MAX as f64) * 2.0;
        let bounds = LatLngBounds::new(40.0, 10.0, lat, lng).unwrap();
        let expected: HashSet<usize> = items
            .iter()
            .filter(|item| bounds.contains(item))
            .map(key)
            .collect();

        algorithms().into_iter().all(|mut algorithm| {
            algorithm.add_items(items.clone()).unwrap();
            let removed = algorithm.remove_items_not_in_bounds(&bounds);
            let kept: HashSet<usize> = algorithm
                .clusters(0.0)
                .unwrap()
                .iter()
                .flat_map(|c| c.items().iter().map(key))
                .collect();
            removed == items.len() - expected.len() && kept == expected
        })
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<(u16, u16)>, (u16, u16)) -> bool);
}

#[test]
fn test_two_nearby_and_one_distant() {
    let a = Arc::new(LatLng::new(0.0, 0.0).unwrap());
    let b = Arc::new(LatLng::new(0.0, 0.0001).unwrap());
    let c = Arc::new(LatLng::new(10.0, 10.0).unwrap());

    let mut algorithm = NonHierarchicalDistanceBasedAlgorithm::<LatLng>::default();
    algorithm.add_items(vec![a.clone(), b.clone(), c.clone()]).unwrap();

    let clusters = algorithm.clusters(10.0).unwrap();
    assert_eq!(clusters.len(), 2);
    let first: HashSet<usize> = clusters[0].items().iter().map(key).collect();
    assert_eq!(first, HashSet::from([key(&a), key(&b)]));
    assert_eq!(clusters[1].items().iter().map(key).collect::<Vec<_>>(), vec![key(&c)]);
}

#[test]
fn test_zero_threshold_gives_singletons() {
    let mut rng = StdRng::seed_from_u64(42);
    let items: Vec<_> = (0..1000)
        .map(|_| {
            Arc::new(LatLng::new(rng.gen_range(45.0..46.0), rng.gen_range(7.0..8.0)).unwrap())
        })
        .collect();

    let config = DistanceAlgorithmConfig {
        max_distance_at_zoom: 0.0,
        ..Default::default()
    };
    let mut algorithm = NonHierarchicalDistanceBasedAlgorithm::<LatLng>::new(config).unwrap();
    assert_eq!(algorithm.add_items(items).unwrap(), 1000);

    for zoom in [0.0, 5.0, 15.0] {
        let clusters = algorithm.clusters(zoom).unwrap();
        assert_eq!(clusters.len(), 1000);
        assert!(clusters.iter().all(|c| c.count() == 1));
    }
}

#[test]
fn test_index_whole_domain_search_is_order_independent() {
    let mut rng = StdRng::seed_from_u64(7);
    let points: Vec<_> = (0..2000)
        .map(|_| {
            LatLng::new(rng.gen_range(-85.0..85.0), rng.gen_range(-180.0..180.0))
                .unwrap()
                .to_map_point()
        })
        .collect();
    let whole = checked_rect(
        utils::MAP_PLANE_MIN,
        utils::MAP_PLANE_MIN,
        utils::MAP_PLANE_MAX,
        utils::MAP_PLANE_MAX,
    )
    .unwrap();

    let mut shuffled: Vec<usize> = (0..points.len()).collect();
    shuffled.shuffle(&mut rng);

    for order in [(0..points.len()).collect::<Vec<_>>(), shuffled] {
        let mut tree = PointQuadtree::map_plane(Default::default());
        for i in order {
            tree.insert(points[i], i).unwrap();
        }
        let mut found = tree.search(whole).unwrap();
        found.sort_unstable();
        assert_eq!(found, (0..points.len()).collect::<Vec<_>>());
    }
}
