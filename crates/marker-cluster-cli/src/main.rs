//! Marker Cluster CLI
//!
//! Loads points from a CSV file (or generates a seeded random scatter), feeds
//! them to a [`ClusterManager`] and clusters them at every zoom level of the
//! requested range, logging a summary per level.

mod input;
mod logging;
mod renderer;
mod settings;

use clap::Parser;
use input::MapMarker;
use marker_cluster_lib::{
    CameraChange, CameraPosition, ClusterError, ClusterManager, ClusteringAlgorithm,
    DistanceAlgorithmConfig, GridAlgorithmConfig, GridBasedClusterAlgorithm, LatLngBounds,
    NonHierarchicalDistanceBasedAlgorithm,
};
use renderer::LoggingRenderer;
use settings::{AlgorithmKind, Settings};
use std::fs::File;
use std::time::Instant;

/// Error types for the command line driver
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Clustering error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("No points to cluster")]
    EmptyInput,
}

fn main() {
    let settings = Settings::parse();
    logging::setup_logging();

    if let Err(err) = run(&settings) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn build_algorithm(settings: &Settings) -> Result<Box<dyn ClusteringAlgorithm<MapMarker>>, CliError> {
    Ok(match settings.algorithm {
        AlgorithmKind::Distance => {
            let config = DistanceAlgorithmConfig {
                max_distance_at_zoom: settings.distance,
                ..Default::default()
            };
            Box::new(NonHierarchicalDistanceBasedAlgorithm::<MapMarker>::new(config)?)
        }
        AlgorithmKind::Grid => {
            let config = GridAlgorithmConfig {
                cell_size_points: settings.distance,
            };
            Box::new(GridBasedClusterAlgorithm::<MapMarker>::new(config)?)
        }
    })
}

fn visible_bounds(settings: &Settings) -> Result<Option<LatLngBounds>, CliError> {
    match settings.bounds.as_deref() {
        Some(&[min_lat, min_lng, max_lat, max_lng]) => {
            Ok(Some(LatLngBounds::new(min_lat, min_lng, max_lat, max_lng)?))
        }
        _ => Ok(None),
    }
}

fn run(settings: &Settings) -> Result<(), CliError> {
    let markers = match &settings.input {
        Some(path) => {
            tracing::info!(path = %path.display(), "reading points");
            input::read_markers(File::open(path)?)?
        }
        None => {
            tracing::info!(count = settings.random_points, seed = settings.seed, "generating points");
            input::random_markers(settings.random_points, settings.seed)
        }
    };
    if markers.is_empty() {
        return Err(CliError::EmptyInput);
    }

    let algorithm = build_algorithm(settings)?;
    let mut manager = ClusterManager::new(algorithm, Box::new(LoggingRenderer::new(settings.top)));

    let start = Instant::now();
    let added = manager.add_items(markers)?;
    tracing::info!(added, elapsed = ?start.elapsed(), algorithm = ?settings.algorithm, "points indexed");

    let bounds = visible_bounds(settings)?;
    if let Some(bounds) = bounds {
        manager.set_camera(CameraPosition::new(settings.min_zoom as f64).with_visible_bounds(bounds));
        let removed = manager.remove_items_outside_visible_bounds();
        tracing::info!(removed, remaining = manager.algorithm().len(), "applied bounds filter");
    }

    for zoom in settings.min_zoom..=settings.max_zoom {
        let mut camera = CameraPosition::new(zoom as f64);
        camera.visible_bounds = bounds;
        if manager.set_camera(camera) == CameraChange::Panned {
            continue;
        }

        let request = manager.request_cluster();
        let start = Instant::now();
        manager.fulfil_request(request)?;
        tracing::info!(zoom, elapsed = ?start.elapsed(), "zoom level clustered");
    }

    tracing::debug!(?manager, "done");
    Ok(())
}
