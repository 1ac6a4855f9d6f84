use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Clustering strategy selectable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    /// Greedy radius based clustering over a quadtree
    Distance,
    /// Fixed screen-size grid cells
    Grid,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Marker Cluster - Group geo-located points into clusters over a range of zoom levels
pub struct Settings {
    /// CSV file with `latitude,longitude` rows (an optional header is skipped)
    #[clap(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Number of random points to generate when no input file is given
    #[clap(short = 'n', long, default_value = "10000")]
    pub random_points: usize,

    /// Seed for the random point generator
    #[clap(long, default_value = "42")]
    pub seed: u64,

    /// Clustering algorithm
    #[clap(short, long, value_enum, default_value = "distance")]
    pub algorithm: AlgorithmKind,

    /// Clustering distance (distance algorithm) or cell size (grid algorithm), in screen points
    #[clap(short, long, default_value = "100.0", allow_negative_numbers = true)]
    pub distance: f64,

    /// First zoom level to cluster at
    #[clap(long, default_value = "0")]
    pub min_zoom: u32,

    /// Last zoom level to cluster at
    #[clap(long, default_value = "12")]
    pub max_zoom: u32,

    /// Drop points outside MIN_LAT MIN_LNG MAX_LAT MAX_LNG before clustering
    #[clap(
        long,
        num_args = 4,
        value_names = ["MIN_LAT", "MIN_LNG", "MAX_LAT", "MAX_LNG"],
        allow_negative_numbers = true
    )]
    pub bounds: Option<Vec<f64>>,

    /// Number of largest clusters to log per zoom level
    #[clap(long, default_value = "3")]
    pub top: usize,
}
