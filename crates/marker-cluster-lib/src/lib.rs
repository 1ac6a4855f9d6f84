//! Marker Cluster Library - Spatial Clustering of Map Markers
//!
//! This library groups a large, changing set of geo-located items into clusters
//! that stay readable at any zoom level, fast enough to be recomputed on every
//! camera movement of an interactive map.
//!
//! # Architecture
//!
//! - **[`PointQuadtree`]**: Bounded point quadtree used for range queries
//! - **[`ClusterItem`]**: The capability callers implement for their markers
//! - **[`ClusteringAlgorithm`]**: Common interface of the clustering strategies
//! - **[`NonHierarchicalDistanceBasedAlgorithm`]**: Greedy radius based clustering
//! - **[`GridBasedClusterAlgorithm`]**: Fixed screen-size grid clustering
//! - **[`ClusterManager`]**: Ties items, the active algorithm and a renderer together
//!
//! # Performance Characteristics
//!
//! - **Insert/Remove**: O(D) per item where D=tree depth
//! - **Distance clustering**: one range query per emitted cluster, O(S×(log N + K))
//! - **Grid clustering**: O(N), no index

mod algorithm;
mod cluster;
mod distance_algorithm;
mod geometry;
mod grid_algorithm;
mod item;
mod manager;
pub mod quadtree;
pub mod store;
pub mod utils;

// Public API exports
pub use algorithm::ClusteringAlgorithm;
pub use cluster::StaticCluster;
pub use distance_algorithm::{
    DEFAULT_MAX_DISTANCE_AT_ZOOM, DistanceAlgorithmConfig, NonHierarchicalDistanceBasedAlgorithm,
};
pub use geometry::{LatLng, LatLngBounds, checked_rect};
pub use grid_algorithm::{DEFAULT_CELL_SIZE_POINTS, GridAlgorithmConfig, GridBasedClusterAlgorithm};
pub use item::{ClusterItem, ItemKey};
pub use manager::{CameraChange, CameraPosition, ClusterManager, ClusterRenderer, ClusterRequest};
pub use quadtree::{PointQuadtree, QuadtreeConfig};

/// Error types for the clustering engine
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Coordinate out of range: latitude {latitude}, longitude {longitude}")]
    CoordinateOutOfRange { latitude: f64, longitude: f64 },

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Point ({x}, {y}) lies outside the index bounds")]
    OutsideIndexBounds { x: f64, y: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid zoom level: {0}")]
    InvalidZoom(f64),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
