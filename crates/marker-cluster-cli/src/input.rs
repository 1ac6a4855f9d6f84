//! Point sources: CSV files and a seeded random scatter

use crate::CliError;
use csv::ReaderBuilder;
use marker_cluster_lib::{ClusterItem, LatLng};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Read;
use std::sync::Arc;

/// A point loaded by the CLI
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    /// Row number in the input, or generation index
    pub id: usize,
    pub position: LatLng,
}

impl ClusterItem for MapMarker {
    fn position(&self) -> LatLng {
        self.position
    }
}

/// Read `latitude,longitude` rows, skipping a header line if present
///
/// Rows that are malformed or out of range are logged and skipped.
pub fn read_markers<R: Read>(reader: R) -> Result<Vec<Arc<MapMarker>>, CliError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut markers = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let lat = record.get(0).map(str::parse::<f64>);
        let lon = record.get(1).map(str::parse::<f64>);

        let (Some(Ok(lat)), Some(Ok(lon))) = (lat, lon) else {
            // A first row that does not parse is a header
            if row > 0 {
                tracing::warn!(row, ?record, "skipping malformed row");
            }
            continue;
        };

        match LatLng::new(lat, lon) {
            Ok(position) => markers.push(Arc::new(MapMarker { id: row, position })),
            Err(err) => tracing::warn!(row, %err, "skipping row"),
        }
    }

    tracing::debug!(count = markers.len(), "markers read");
    Ok(markers)
}

/// Generate `count` markers clumped around a few random centers
pub fn random_markers(count: usize, seed: u64) -> Vec<Arc<MapMarker>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers: Vec<(f64, f64)> = (0..8)
        .map(|_| (rng.gen_range(-60.0..60.0), rng.gen_range(-170.0..170.0)))
        .collect();

    (0..count)
        .filter_map(|id| {
            let (lat, lon) = centers[id % centers.len()];
            let spread = if id % 4 == 0 { 10.0 } else { 0.5 };
            let lat = (lat + rng.gen_range(-spread..spread)).clamp(-90.0, 90.0);
            let lon = (lon + rng.gen_range(-spread..spread)).clamp(-180.0, 180.0);
            LatLng::new(lat, lon)
                .ok()
                .map(|position| Arc::new(MapMarker { id, position }))
        })
        .collect()
}
