use crate::input::MapMarker;
use marker_cluster_lib::{ClusterRenderer, StaticCluster};

/// Summary of one render pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSummary {
    pub clusters: usize,
    pub items: usize,
    pub singletons: usize,
    pub largest: usize,
}

/// Renderer that logs what it is given instead of drawing it
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    top: usize,
    last: Option<RenderSummary>,
    updates: usize,
}

impl LoggingRenderer {
    /// Log the `top` largest clusters of each pass
    pub fn new(top: usize) -> Self {
        Self {
            top,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn last_summary(&self) -> Option<&RenderSummary> {
        self.last.as_ref()
    }

    #[cfg(test)]
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl ClusterRenderer<MapMarker> for LoggingRenderer {
    fn render_clusters(&mut self, clusters: &[StaticCluster<MapMarker>]) {
        let summary = RenderSummary {
            clusters: clusters.len(),
            items: clusters.iter().map(StaticCluster::count).sum(),
            singletons: clusters.iter().filter(|c| c.count() == 1).count(),
            largest: clusters.iter().map(StaticCluster::count).max().unwrap_or(0),
        };
        tracing::info!(
            clusters = summary.clusters,
            items = summary.items,
            singletons = summary.singletons,
            largest = summary.largest,
            unchanged = self.last.as_ref() == Some(&summary),
            "rendered"
        );

        let mut by_size: Vec<&StaticCluster<MapMarker>> = clusters.iter().collect();
        by_size.sort_by(|a, b| b.count().cmp(&a.count()));
        for cluster in by_size.into_iter().take(self.top) {
            let position = cluster.position();
            tracing::info!(
                count = cluster.count(),
                latitude = position.latitude(),
                longitude = position.longitude(),
                "  cluster"
            );
        }

        self.last = Some(summary);
    }

    fn update(&mut self) {
        self.updates += 1;
        tracing::debug!(updates = self.updates, "renderer update");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_cluster_lib::LatLng;
    use std::sync::Arc;

    fn marker(id: usize, lat: f64, lon: f64) -> Arc<MapMarker> {
        Arc::new(MapMarker {
            id,
            position: LatLng::new(lat, lon).unwrap(),
        })
    }

    #[test]
    fn test_render_summary() {
        let mut renderer = LoggingRenderer::new(2);
        let position = LatLng::new(0.0, 0.0).unwrap();
        let clusters = vec![
            StaticCluster::new(position, vec![marker(0, 0.0, 0.0), marker(1, 0.0, 0.1)]),
            StaticCluster::new(position, vec![marker(2, 5.0, 5.0)]),
        ];
        renderer.render_clusters(&clusters);

        let summary = renderer.last_summary().unwrap();
        assert_eq!(summary.clusters, 2);
        assert_eq!(summary.items, 3);
        assert_eq!(summary.singletons, 1);
        assert_eq!(summary.largest, 2);

        renderer.update();
        assert_eq!(renderer.updates(), 1);
    }

    #[test]
    fn test_render_empty() {
        let mut renderer = LoggingRenderer::new(5);
        renderer.render_clusters(&[]);
        assert_eq!(renderer.last_summary(), Some(&RenderSummary::default()));
    }

    #[test]
    fn test_rerender_keeps_summary_and_counts_updates() {
        let mut renderer = LoggingRenderer::new(1);
        let clusters = vec![StaticCluster::new(
            LatLng::new(1.0, 1.0).unwrap(),
            vec![marker(0, 1.0, 1.0)],
        )];
        renderer.render_clusters(&clusters);
        let first = renderer.last_summary().cloned();
        renderer.update();
        renderer.render_clusters(&clusters);
        renderer.update();

        assert_eq!(renderer.last_summary().cloned(), first);
        assert_eq!(renderer.updates(), 2);
    }
}
