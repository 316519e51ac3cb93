use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

mod api;
mod config;
mod domain;
mod geometry;
mod grid;
mod osm;
mod output;
mod pipeline;

use api::osrm::{OsrmClient, OsrmClientConfig};
use api::{fetch_boundary, fetch_water};
use config::FileConfig;
use geometry::WaterMask;
use grid::{BoundingBox, Grid, GridPoint};
use osm::parse_water;
use output::{RenderOptions, render_heatmap, write_csv};
use pipeline::{AnnotatedGrid, fetch_travel_times};

/// Generate travel-time heat-maps from OSRM routing data
///
/// Examples:
///   # Driving times across Shanghai from a fixed origin
///   timemap -p "Shanghai, China" --origin-lat 31.1986 --origin-lon 121.4327 \
///       --lat-min 30.7 --lat-max 31.35 --lon-min 121.18 --lon-max 121.86
///
///   # Coarser grid against a remote OSRM instance
///   timemap -p "Berlin, Germany" --origin-lat 52.52 --origin-lon 13.405 \
///       --lat-min 52.3 --lat-max 52.7 --lon-min 13.1 --lon-max 13.8 \
///       --step 0.005 --osrm-url http://osrm.example.com:5000
///
///   # Use a config file
///   timemap --config shanghai.toml
#[derive(Parser, Debug)]
#[command(name = "timemap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches timemap.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Place name for the boundary and water lookup (e.g. "Shanghai, China")
    #[arg(short = 'p', long)]
    place: Option<String>,

    /// Origin latitude
    #[arg(long, allow_hyphen_values = true)]
    origin_lat: Option<f64>,

    /// Origin longitude
    #[arg(long, allow_hyphen_values = true)]
    origin_lon: Option<f64>,

    /// Southern edge of the destination grid
    #[arg(long, allow_hyphen_values = true)]
    lat_min: Option<f64>,

    /// Northern edge of the destination grid
    #[arg(long, allow_hyphen_values = true)]
    lat_max: Option<f64>,

    /// Western edge of the destination grid
    #[arg(long, allow_hyphen_values = true)]
    lon_min: Option<f64>,

    /// Eastern edge of the destination grid
    #[arg(long, allow_hyphen_values = true)]
    lon_max: Option<f64>,

    /// Grid step in degrees (default 0.001)
    #[arg(long)]
    step: Option<f64>,

    /// OSRM base URL (default http://localhost:5000)
    #[arg(long)]
    osrm_url: Option<String>,

    /// OSRM routing profile (default driving)
    #[arg(long)]
    profile: Option<String>,

    /// Maximum destinations per table request (default 99)
    #[arg(long)]
    batch_size: Option<usize>,

    /// OSRM request timeout in seconds (default 30)
    #[arg(long)]
    timeout: Option<u64>,

    /// Drop points slower than this many seconds (default 9000)
    #[arg(long)]
    max_time: Option<f64>,

    /// Color scale floor in seconds (default 0)
    #[arg(long)]
    color_min: Option<f64>,

    /// Color scale ceiling in seconds (default 3600)
    #[arg(long)]
    color_max: Option<f64>,

    /// Map title (defaults to the origin coordinates)
    #[arg(long)]
    title: Option<String>,

    /// Output CSV path (defaults to {place}_times.csv)
    #[arg(short = 'o', long)]
    output_csv: Option<PathBuf>,

    /// Output PNG path (defaults to {place}_times.png)
    #[arg(long)]
    output_png: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context(format!("Failed to read config file: {:?}", config_path))?;
            Some(toml::from_str(&contents).context("Failed to parse config file")?)
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load()
    };

    let place = args
        .place
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.place.clone()));
    let origin_lat = args
        .origin_lat
        .or_else(|| file_config.as_ref().and_then(|c| c.origin_lat));
    let origin_lon = args
        .origin_lon
        .or_else(|| file_config.as_ref().and_then(|c| c.origin_lon));
    let lat_min = args
        .lat_min
        .or_else(|| file_config.as_ref().and_then(|c| c.lat_min));
    let lat_max = args
        .lat_max
        .or_else(|| file_config.as_ref().and_then(|c| c.lat_max));
    let lon_min = args
        .lon_min
        .or_else(|| file_config.as_ref().and_then(|c| c.lon_min));
    let lon_max = args
        .lon_max
        .or_else(|| file_config.as_ref().and_then(|c| c.lon_max));
    let step = args
        .step
        .unwrap_or_else(|| file_config.as_ref().map(|c| c.step).unwrap_or(0.001));
    let osrm_url = args.osrm_url.clone().unwrap_or_else(|| {
        file_config
            .as_ref()
            .map(|c| c.osrm_url.clone())
            .unwrap_or_else(|| "http://localhost:5000".to_string())
    });
    let profile = args.profile.clone().unwrap_or_else(|| {
        file_config
            .as_ref()
            .map(|c| c.profile.clone())
            .unwrap_or_else(|| "driving".to_string())
    });
    let batch_size = args
        .batch_size
        .unwrap_or_else(|| file_config.as_ref().map(|c| c.batch_size).unwrap_or(99));
    let osrm_timeout_secs = args.timeout.unwrap_or_else(|| {
        file_config
            .as_ref()
            .map(|c| c.osrm_timeout_secs)
            .unwrap_or(30)
    });
    let max_time_sec = args
        .max_time
        .unwrap_or_else(|| file_config.as_ref().map(|c| c.max_time_sec).unwrap_or(9000.0));
    let color_min = args
        .color_min
        .unwrap_or_else(|| file_config.as_ref().map(|c| c.color_min).unwrap_or(0.0));
    let color_max = args
        .color_max
        .unwrap_or_else(|| file_config.as_ref().map(|c| c.color_max).unwrap_or(3600.0));
    let title = args
        .title
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.title.clone()));
    let output_csv = args
        .output_csv
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output_csv.clone()));
    let output_png = args
        .output_png
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output_png.clone()));
    let verbose = args.verbose || file_config.as_ref().map(|c| c.verbose).unwrap_or(false);

    let overpass_config = file_config
        .as_ref()
        .and_then(|c| c.overpass.clone())
        .unwrap_or_default();

    let Some(place) = place else {
        bail!("Must provide --place/-p (or set place in the config file)");
    };
    let (Some(origin_lat), Some(origin_lon)) = (origin_lat, origin_lon) else {
        bail!("Must provide --origin-lat and --origin-lon");
    };
    let (Some(lat_min), Some(lat_max), Some(lon_min), Some(lon_max)) =
        (lat_min, lat_max, lon_min, lon_max)
    else {
        bail!("Must provide all four grid bounds: --lat-min, --lat-max, --lon-min, --lon-max");
    };
    if batch_size == 0 {
        bail!("--batch-size must be at least 1");
    }

    println!("timemap - Travel Time Heat-Map Generator");
    println!("========================================");
    println!();

    let slug = place_slug(&place);
    let output_csv = output_csv.unwrap_or_else(|| PathBuf::from(format!("{}_times.csv", slug)));
    let output_png = output_png.unwrap_or_else(|| PathBuf::from(format!("{}_times.png", slug)));
    let title = title.unwrap_or_else(|| {
        format!("Travel time from ({:.4}, {:.4})", origin_lat, origin_lon)
    });

    if verbose {
        println!("Configuration:");
        println!("  Place: {}", place);
        println!("  Origin: ({:.4}, {:.4})", origin_lat, origin_lon);
        println!(
            "  Bounds: lat {}..{}, lon {}..{}",
            lat_min, lat_max, lon_min, lon_max
        );
        println!("  Step: {}", step);
        println!("  OSRM: {} ({})", osrm_url, profile);
        println!("  Batch size: {}", batch_size);
        println!("  Max time: {}s", max_time_sec);
        println!("  Color range: {}..{}s", color_min, color_max);
        println!("  Output CSV: {}", output_csv.display());
        println!("  Output PNG: {}", output_png.display());
        println!("  Overpass mirrors: {}", overpass_config.urls.len());
        println!();
    }

    let bounds = BoundingBox::new(lat_min, lat_max, lon_min, lon_max);
    let grid = Grid::generate(bounds, step).context("Failed to generate destination grid")?;
    println!(
        "Grid: {} points ({} lat x {} lon at step {})",
        grid.len(),
        grid.num_lats(),
        grid.num_lons(),
        step
    );

    let client = OsrmClient::new(OsrmClientConfig {
        base_url: osrm_url.clone(),
        profile: profile.clone(),
        timeout: Duration::from_secs(osrm_timeout_secs),
    })
    .context("Failed to build OSRM client")?;

    let origin = GridPoint {
        lon: origin_lon,
        lat: origin_lat,
    };
    let total_batches = grid.len().div_ceil(batch_size);

    println!(
        "Querying travel times ({} batches of up to {} points)...",
        total_batches, batch_size
    );
    let start = Instant::now();
    let pb = ProgressBar::new(total_batches as u64);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.green/white} {pos}/{len} batches [{elapsed_precise}]")
            .unwrap(),
    );
    let cancel = AtomicBool::new(false);
    let times = fetch_travel_times(
        &client,
        origin,
        &grid,
        batch_size,
        |completed, _total| pb.set_position(completed as u64),
        &cancel,
    )
    .context("Travel time sweep failed")?;
    pb.finish();
    let reachable = times.iter().filter(|t| t.is_some()).count();
    println!(
        "Fetched {} durations ({} reachable) [{:.1}s]",
        times.len(),
        reachable,
        start.elapsed().as_secs_f32()
    );

    let spinner = create_spinner("Geocoding study area boundary...");
    let start = Instant::now();
    let (display_name, boundary) =
        fetch_boundary(&place).context("Failed to geocode study area")?;
    spinner.finish_with_message(format!(
        "Boundary: {} [{:.1}s]",
        display_name,
        start.elapsed().as_secs_f32()
    ));

    let spinner = create_spinner("Fetching water features...");
    let start = Instant::now();
    let water_response =
        fetch_water(&bounds, &overpass_config).context("Failed to fetch water data")?;
    spinner.finish_with_message(format!(
        "Fetched {} water elements [{:.1}s]",
        water_response.elements.len(),
        start.elapsed().as_secs_f32()
    ));

    let rings = parse_water(&water_response);
    let features: Vec<_> = rings
        .iter()
        .filter(|ring| ring.is_valid())
        .map(|ring| ring.to_polygon())
        .collect();
    if verbose {
        println!("  Parsed {} water rings", features.len());
    }

    let spinner = create_spinner("Classifying grid points against water...");
    let start = Instant::now();
    let mask = WaterMask::new(features, &boundary);
    let on_land = mask.classify(&grid);
    spinner.finish_with_message(format!(
        "Water mask: {} polygons after clipping [{:.1}s]",
        mask.len(),
        start.elapsed().as_secs_f32()
    ));

    let annotated =
        AnnotatedGrid::new(grid, times, on_land).context("Grid columns out of alignment")?;
    let retained = annotated.retained(max_time_sec);
    println!(
        "Retained {} of {} points ({} on land)",
        retained.len(),
        annotated.len(),
        annotated.land_count()
    );
    if retained.is_empty() {
        bail!("No points survived the land/time filter; check the origin and bounds");
    }

    write_csv(&output_csv, &retained).context("Failed to write CSV dataset")?;
    println!("Dataset: {}", output_csv.display());

    let options = RenderOptions {
        color_min,
        color_max,
        ..RenderOptions::default()
    };
    render_heatmap(&output_png, &retained, &options).context("Failed to render heat-map")?;
    println!("Heat-map: {} ({})", output_png.display(), title);

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

/// File-name stem derived from the place query, e.g. "Shanghai, China" ->
/// "shanghai".
fn place_slug(place: &str) -> String {
    place
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
