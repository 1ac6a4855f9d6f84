//! Orchestration between items, the active algorithm and a renderer
//!
//! The manager never clusters on its own: mutations only touch the algorithm,
//! and the host asks for a new clustering either directly with
//! [`ClusterManager::cluster`] or through the request tickets, which lets a host
//! debounce bursts of camera changes with whatever timer it already has.

use crate::{ClusterItem, ClusteringAlgorithm, LatLngBounds, Result, StaticCluster};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Consumer of computed clusters
pub trait ClusterRenderer<T: ?Sized> {
    /// Replace whatever is displayed with `clusters`
    fn render_clusters(&mut self, clusters: &[StaticCluster<T>]);

    /// Called when the camera moved without changing the integral zoom
    fn update(&mut self) {}
}

/// Zoom and visible area of the map camera
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraPosition {
    pub zoom: f64,
    pub visible_bounds: Option<LatLngBounds>,
}

impl CameraPosition {
    pub fn new(zoom: f64) -> Self {
        Self {
            zoom,
            visible_bounds: None,
        }
    }

    pub fn with_visible_bounds(mut self, bounds: LatLngBounds) -> Self {
        self.visible_bounds = Some(bounds);
        self
    }

    /// Zoom level clusters are computed for, `zoom` rounded half up
    #[inline]
    pub fn integral_zoom(&self) -> f64 {
        (self.zoom + 0.5).floor()
    }
}

impl Default for CameraPosition {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Outcome of [`ClusterManager::set_camera`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraChange {
    /// The integral zoom differs from the last clustering, a recluster is due
    ZoomChanged,
    /// Same integral zoom, the renderer was told to update
    Panned,
}

/// Ticket returned by [`ClusterManager::request_cluster`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterRequest(u64);

/// Drives one clustering algorithm and hands its output to a renderer
pub struct ClusterManager<T: ClusterItem + ?Sized> {
    algorithm: Box<dyn ClusteringAlgorithm<T>>,
    renderer: Box<dyn ClusterRenderer<T>>,
    camera: CameraPosition,
    last_rendered: Option<CameraPosition>,
    request_count: u64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem + ?Sized> ClusterManager<T> {
    pub fn new(algorithm: Box<dyn ClusteringAlgorithm<T>>, renderer: Box<dyn ClusterRenderer<T>>) -> Self {
        Self {
            algorithm,
            renderer,
            camera: CameraPosition::default(),
            last_rendered: None,
            request_count: 0,
        }
    }

    /// Add an item, returning whether it was new
    pub fn add_item(&mut self, item: Arc<T>) -> Result<bool> {
        self.algorithm.add_item(item)
    }

    /// Add a batch of items, returning how many were new
    pub fn add_items(&mut self, items: Vec<Arc<T>>) -> Result<usize> {
        self.algorithm.add_items(items)
    }

    /// Remove an item, returning whether it was present
    pub fn remove_item(&mut self, item: &Arc<T>) -> bool {
        self.algorithm.remove_item(item)
    }

    /// Remove every item
    pub fn clear_items(&mut self) {
        self.algorithm.clear_items();
    }

    /// Drop items outside `bounds`, returning how many were dropped
    pub fn remove_items_not_in_bounds(&mut self, bounds: &LatLngBounds) -> usize {
        self.algorithm.remove_items_not_in_bounds(bounds)
    }

    /// Drop items outside the camera's visible bounds, if the camera has any
    pub fn remove_items_outside_visible_bounds(&mut self) -> usize {
        match self.camera.visible_bounds {
            Some(bounds) => self.algorithm.remove_items_not_in_bounds(&bounds),
            None => 0,
        }
    }

    /// Cluster at the camera's integral zoom and render the result
    ///
    /// Returns the number of clusters rendered.
    pub fn cluster(&mut self) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("manager::cluster");

        let zoom = self.camera.integral_zoom();
        let clusters = self.algorithm.clusters(zoom)?;
        self.renderer.render_clusters(&clusters);
        self.last_rendered = Some(self.camera);

        tracing::debug!(zoom, clusters = clusters.len(), "clusters rendered");
        Ok(clusters.len())
    }

    /// Record a camera move
    ///
    /// The renderer is only updated in place when the integral zoom is the one
    /// last clustered for; otherwise the caller should request a recluster.
    pub fn set_camera(&mut self, camera: CameraPosition) -> CameraChange {
        self.camera = camera;
        let same_zoom = self
            .last_rendered
            .is_some_and(|last| last.integral_zoom() == camera.integral_zoom());
        if same_zoom {
            self.renderer.update();
            CameraChange::Panned
        } else {
            tracing::trace!(zoom = camera.zoom, "integral zoom changed");
            CameraChange::ZoomChanged
        }
    }

    /// Issue a ticket for a deferred recluster
    ///
    /// Issuing a new ticket supersedes every earlier one.
    pub fn request_cluster(&mut self) -> ClusterRequest {
        self.request_count += 1;
        ClusterRequest(self.request_count)
    }

    /// Recluster if `request` is still the latest ticket
    ///
    /// Returns `false` without touching anything for a superseded ticket.
    pub fn fulfil_request(&mut self, request: ClusterRequest) -> Result<bool> {
        if request.0 != self.request_count {
            tracing::trace!(ticket = request.0, latest = self.request_count, "stale cluster request");
            return Ok(false);
        }
        self.cluster()?;
        Ok(true)
    }

    /// The active algorithm
    pub fn algorithm(&self) -> &dyn ClusteringAlgorithm<T> {
        self.algorithm.as_ref()
    }

    /// Current camera
    pub fn camera(&self) -> CameraPosition {
        self.camera
    }

    /// Camera of the last completed clustering
    pub fn last_rendered_camera(&self) -> Option<CameraPosition> {
        self.last_rendered
    }

    /// Number of tickets issued so far
    pub fn pending_request_count(&self) -> u64 {
        self.request_count
    }
}

impl<T: ClusterItem + ?Sized> fmt::Debug for ClusterManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterManager")
            .field("items", &self.algorithm.len())
            .field("camera", &self.camera)
            .field("last_rendered", &self.last_rendered)
            .field("request_count", &self.request_count)
            .finish()
    }
}
