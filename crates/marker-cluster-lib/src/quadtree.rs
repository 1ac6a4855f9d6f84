//! Point quadtree spatial index
//!
//! A bounded quadtree over points of the map plane. Leaves hold up to
//! [`QuadtreeConfig::max_elements`] entries; inserting into a full leaf splits it
//! into four equal quadrants and redistributes its entries. Removal never merges
//! children back, so deletes stay O(depth); call [`PointQuadtree::rebuild`] to
//! compact a tree that has seen heavy churn.
//!
//! Past [`QuadtreeConfig::max_depth`] a leaf keeps growing instead of splitting,
//! which bounds the depth when many points share a coordinate.

use crate::geometry::{rect_contains, rects_intersect};
use crate::{ClusterError, Result, utils};
use geo::{Coord, Point, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default bucket capacity of a leaf
pub const DEFAULT_MAX_ELEMENTS: usize = 64;

/// Default maximum depth of the quadtree
pub const DEFAULT_MAX_DEPTH: u32 = 30;

/// Tuning knobs for [`PointQuadtree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadtreeConfig {
    /// Number of entries a leaf holds before it splits
    pub max_elements: usize,
    /// Depth below which leaves are allowed to split (root is 0)
    pub max_depth: u32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_elements: DEFAULT_MAX_ELEMENTS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A point stored in the tree together with its payload
#[derive(Debug, Clone, Copy)]
struct QuadEntry<T> {
    point: Point<f64>,
    payload: T,
}

/// Root container for the point quadtree
#[derive(Debug, Clone)]
pub struct PointQuadtree<T> {
    root: QuadtreeNode<T>,
    /// Closed bounds accepted by this tree
    bounds: Rect<f64>,
    config: QuadtreeConfig,
    count: usize,
}

/// A single node of the quadtree
#[derive(Debug, Clone)]
struct QuadtreeNode<T> {
    bounding_box: Rect<f64>,
    /// Depth level in the tree (0 = root)
    level: u32,
    /// Entries of a leaf; always empty once the node is subdivided
    entries: Vec<QuadEntry<T>>,
    /// Child nodes (NW, NE, SW, SE) if subdivided
    children: Option<Box<[QuadtreeNode<T>; 4]>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: Copy + PartialEq> PointQuadtree<T> {
    /// Create an empty tree accepting points inside `bounds`
    pub fn new(bounds: Rect<f64>) -> Self {
        Self::with_config(bounds, QuadtreeConfig::default())
    }

    /// Create an empty tree with explicit split parameters
    pub fn with_config(bounds: Rect<f64>, config: QuadtreeConfig) -> Self {
        Self {
            root: QuadtreeNode::new(bounds, 0),
            bounds,
            config,
            count: 0,
        }
    }

    /// Create an empty tree covering the whole map plane
    pub fn map_plane(config: QuadtreeConfig) -> Self {
        let bounds = Rect::new(
            Coord {
                x: utils::MAP_PLANE_MIN,
                y: utils::MAP_PLANE_MIN,
            },
            Coord {
                x: utils::MAP_PLANE_MAX,
                y: utils::MAP_PLANE_MAX,
            },
        );
        Self::with_config(bounds, config)
    }

    /// Insert a point with its payload
    ///
    /// Fails when the point is not finite or lies outside the tree bounds.
    pub fn insert(&mut self, point: Point<f64>, payload: T) -> Result<()> {
        if !rect_contains(&self.bounds, point) {
            return Err(ClusterError::OutsideIndexBounds {
                x: point.x(),
                y: point.y(),
            });
        }

        self.root.insert(QuadEntry { point, payload }, &self.config);
        self.count += 1;
        Ok(())
    }

    /// Remove the entry carrying `payload` at `point`
    ///
    /// Returns `false` and leaves the tree untouched when there is no such entry.
    pub fn remove(&mut self, point: Point<f64>, payload: T) -> bool {
        if !rect_contains(&self.bounds, point) {
            return false;
        }

        let removed = self.root.remove(point, payload);
        if removed {
            self.count -= 1;
        }
        removed
    }

    /// Delete every entry
    pub fn clear(&mut self) {
        self.root = QuadtreeNode::new(self.bounds, 0);
        self.count = 0;
    }

    /// Collect the payloads of all entries inside the closed rectangle
    ///
    /// The result order is unspecified. Fails when a corner of `rect` is not
    /// finite.
    pub fn search(&self, rect: Rect<f64>) -> Result<Vec<T>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("quadtree::search");

        let (min, max) = (rect.min(), rect.max());
        if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
            return Err(ClusterError::InvalidBounds(format!(
                "search rectangle ({}, {}) - ({}, {}) is not finite",
                min.x, min.y, max.x, max.y
            )));
        }

        let mut results = Vec::new();
        self.root.search(&rect, &mut results);
        Ok(results)
    }

    /// Number of entries in the tree
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if the tree holds no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Closed bounds accepted by this tree
    #[inline]
    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Split parameters of this tree
    #[inline]
    pub fn config(&self) -> &QuadtreeConfig {
        &self.config
    }

    /// Depth of the deepest node (0 for a lone root)
    pub fn depth(&self) -> u32 {
        self.root.depth()
    }

    /// Number of nodes, internal and leaf
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Re-insert every entry into a fresh root
    ///
    /// Drops the empty subtrees left behind by removals.
    pub fn rebuild(&mut self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("quadtree::rebuild");

        let nodes_before = self.node_count();
        let mut entries = Vec::with_capacity(self.count);
        let old_root = std::mem::replace(&mut self.root, QuadtreeNode::new(self.bounds, 0));
        old_root.drain_into(&mut entries);

        for entry in entries {
            self.root.insert(entry, &self.config);
        }
        tracing::debug!(
            entries = self.count,
            nodes_before,
            nodes_after = self.node_count(),
            "quadtree rebuilt"
        );
    }
}

impl<T: Copy + PartialEq> QuadtreeNode<T> {
    fn new(bounding_box: Rect<f64>, level: u32) -> Self {
        Self {
            bounding_box,
            level,
            entries: Vec::new(),
            children: None,
        }
    }

    /// Subdivide this node into 4 children and move the entries down
    fn subdivide(&mut self, config: &QuadtreeConfig) {
        if self.children.is_some() {
            return;
        }

        let min = self.bounding_box.min();
        let max = self.bounding_box.max();
        let mid_x = (min.x + max.x) / 2.0;
        let mid_y = (min.y + max.y) / 2.0;

        let child_level = self.level + 1;

        let nw = QuadtreeNode::new(
            Rect::new(Coord { x: min.x, y: mid_y }, Coord { x: mid_x, y: max.y }),
            child_level,
        );
        let ne = QuadtreeNode::new(
            Rect::new(Coord { x: mid_x, y: mid_y }, Coord { x: max.x, y: max.y }),
            child_level,
        );
        let sw = QuadtreeNode::new(
            Rect::new(Coord { x: min.x, y: min.y }, Coord { x: mid_x, y: mid_y }),
            child_level,
        );
        let se = QuadtreeNode::new(
            Rect::new(Coord { x: mid_x, y: min.y }, Coord { x: max.x, y: mid_y }),
            child_level,
        );

        let mut children = Box::new([nw, ne, sw, se]);
        for entry in self.entries.drain(..) {
            let quadrant = quadrant_of(&self.bounding_box, entry.point);
            children[quadrant].insert(entry, config);
        }
        self.entries = Vec::new();
        self.children = Some(children);
    }

    fn insert(&mut self, entry: QuadEntry<T>, config: &QuadtreeConfig) {
        if self.children.is_none() {
            if self.entries.len() < config.max_elements || self.level >= config.max_depth {
                self.entries.push(entry);
                return;
            }
            self.subdivide(config);
        }

        let quadrant = quadrant_of(&self.bounding_box, entry.point);
        if let Some(children) = self.children.as_mut() {
            children[quadrant].insert(entry, config);
        }
    }

    fn remove(&mut self, point: Point<f64>, payload: T) -> bool {
        let quadrant = quadrant_of(&self.bounding_box, point);
        match self.children.as_mut() {
            Some(children) => children[quadrant].remove(point, payload),
            None => match self.entries.iter().position(|e| e.payload == payload) {
                Some(index) => {
                    self.entries.swap_remove(index);
                    true
                }
                None => false,
            },
        }
    }

    /// Query this node and its children for entries inside `rect`
    fn search(&self, rect: &Rect<f64>, results: &mut Vec<T>) {
        if !rects_intersect(&self.bounding_box, rect) {
            return;
        }

        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.search(rect, results);
                }
            }
            None => results.extend(
                self.entries
                    .iter()
                    .filter(|entry| rect_contains(rect, entry.point))
                    .map(|entry| entry.payload),
            ),
        }
    }

    fn drain_into(self, out: &mut Vec<QuadEntry<T>>) {
        out.extend(self.entries);
        if let Some(children) = self.children {
            for child in *children {
                child.drain_into(out);
            }
        }
    }

    fn depth(&self) -> u32 {
        match &self.children {
            Some(children) => children.iter().map(|c| c.depth()).max().unwrap_or(self.level),
            None => self.level,
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(|c| c.node_count()).sum())
    }
}

/// Index of the child quadrant (NW, NE, SW, SE) that owns `point`
///
/// Points on a midline belong to the south/west side.
#[inline(always)]
fn quadrant_of(bounding_box: &Rect<f64>, point: Point<f64>) -> usize {
    let center = bounding_box.center();
    let north = point.y() > center.y;
    let east = point.x() > center.x;
    match (north, east) {
        (true, false) => 0,
        (true, true) => 1,
        (false, false) => 2,
        (false, true) => 3,
    }
}
