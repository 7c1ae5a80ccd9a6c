// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use tileroute::{Algorithm, Decompressor, GraphNode, MapStore, Point, SearchOptions};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct MapLoadError(PathBuf, #[source] tileroute::Error);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no node close to the {0} position")]
    NoNearbyNode(&'static str),

    #[error("no street labelled {0:?}")]
    UnknownStreet(String),

    #[error("no route between the given positions")]
    NoRoute,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Greedy,
    AStar,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(a: AlgorithmArg) -> Self {
        match a {
            AlgorithmArg::Greedy => Algorithm::Greedy,
            AlgorithmArg::AStar => Algorithm::AStar,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    Raw,
    Zlib,
    Bzip2,
}

impl CompressionArg {
    fn decompressor(self) -> &'static dyn Decompressor {
        match self {
            CompressionArg::Raw => &tileroute::Raw,
            CompressionArg::Zlib => &tileroute::Zlib,
            CompressionArg::Bzip2 => &tileroute::Bzip2,
        }
    }
}

#[derive(Parser)]
struct Cli {
    /// The path to the map file
    map_file: PathBuf,

    /// Longitude of the start point
    start_lon: f64,

    /// Latitude of the start point
    start_lat: f64,

    /// Longitude of the end point
    #[arg(required_unless_present = "street")]
    end_lon: Option<f64>,

    /// Latitude of the end point
    #[arg(required_unless_present = "street")]
    end_lat: Option<f64>,

    /// Search algorithm
    #[arg(short, long, value_enum, default_value = "a-star")]
    algorithm: AlgorithmArg,

    /// Maximum number of search steps
    #[arg(long, default_value_t = tileroute::DEFAULT_STEP_LIMIT)]
    step_limit: usize,

    /// Route to the first way of the street with this label, instead of the end point
    #[arg(long, conflicts_with_all = ["end_lon", "end_lat"])]
    street: Option<String>,

    /// Compression of street catalog blocks
    #[arg(long, value_enum, default_value = "zlib")]
    compression: CompressionArg,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    colog::default_builder()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let map = load_map(&cli.map_file)?;

    let start = map
        .nearest_node(Point::new(cli.start_lon, cli.start_lat))
        .ok_or(CliError::NoNearbyNode("start"))?;

    let end = match (&cli.street, cli.end_lon, cli.end_lat) {
        (Some(label), _, _) => street_entrance(&map, label, cli.compression.decompressor())?,
        (None, Some(lon), Some(lat)) => map
            .nearest_node(Point::new(lon, lat))
            .ok_or(CliError::NoNearbyNode("end"))?,
        _ => return Err(CliError::NoNearbyNode("end").into()),
    };

    let options = SearchOptions {
        step_limit: cli.step_limit,
        ..Default::default()
    };

    let Some(path) = tileroute::find_path(&map, start, end, cli.algorithm.into(), &options)? else {
        return Err(CliError::NoRoute.into());
    };
    log::info!("route found: {} nodes, length {:.6}°", path.len(), path.length());

    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{}},");

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut points = path.travel_order().into_iter().peekable();
    while let Some(p) = points.next() {
        let suffix = if points.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", p.x, p.y, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");

    Ok(())
}

fn load_map<P: AsRef<Path>>(path: P) -> Result<MapStore, MapLoadError> {
    match MapStore::open(path.as_ref()) {
        Ok(map) => {
            log::debug!(
                "loaded {}: {} tiles, {} ways",
                path.as_ref().display(),
                map.tiles_count(),
                map.total_ways(),
            );
            Ok(map)
        }
        Err(e) => Err(MapLoadError(PathBuf::from(path.as_ref()), e)),
    }
}

/// Returns the first endpoint of the first way of a street.
fn street_entrance(
    map: &MapStore,
    label: &str,
    decompressor: &dyn Decompressor,
) -> Result<GraphNode, Box<dyn Error>> {
    let street = map
        .streets()
        .find(label, decompressor)?
        .ok_or_else(|| CliError::UnknownStreet(label.to_string()))?;
    let &way = street
        .ways
        .first()
        .ok_or_else(|| CliError::UnknownStreet(label.to_string()))?;
    let (entrance, _) = map.way(way)?;
    Ok(entrance)
}
