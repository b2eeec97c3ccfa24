use clap::Parser;
use geo::geometry::Coord;
use std::path::PathBuf;

/// Compute and render the terrain visible from a point.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Directory containing NASADEM hgt tiles.
    #[arg(short, long)]
    pub tile_dir: PathBuf,

    /// Viewer latitude, in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Viewer longitude, in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,

    /// Eye height above ground, in meters.
    #[arg(long, default_value_t = 1.8)]
    pub height: f64,

    /// Facing direction, in degrees clockwise from north.
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub azimuth: f64,

    /// Full width of the field of view, in degrees.
    #[arg(short, long, default_value_t = 120.0)]
    pub fov: f64,

    /// Farthest distance to analyze, in meters.
    #[arg(short, long, default_value_t = 10_000.0)]
    pub radius: f64,

    /// Ground distance between grid cells, in meters.
    #[arg(long, default_value_t = 30.0)]
    pub resolution: f64,

    /// Blend the four surrounding samples along rays instead of using
    /// the nearest cell.
    #[arg(long, default_value_t = false)]
    pub bilinear: bool,

    /// Account for earth curvature.
    #[arg(short, long, default_value_t = false)]
    pub earth_curve: bool,

    /// Atmospheric refraction coefficient (used with --earth-curve).
    #[arg(long, default_value_t = viewshed::DEFAULT_REFRACTION)]
    pub refraction: f64,

    /// Load tiles into memory instead of memory mapping them.
    #[arg(long, default_value_t = false)]
    pub in_mem: bool,

    /// Hillshade light direction, in degrees clockwise from north.
    #[arg(long, default_value_t = 315.0)]
    pub light_azimuth: f64,

    /// Hillshade light angle above the horizon, in degrees.
    #[arg(long, default_value_t = 45.0)]
    pub light_altitude: f64,

    /// Hillshade vertical exaggeration.
    #[arg(long, default_value_t = 1.0)]
    pub exaggeration: f64,

    /// Image output path (PNG). Previews in the terminal if omitted,
    /// unless --json is set.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print an analysis summary to stdout as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Log debug output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Returns the viewer position (`x` is longitude, `y` latitude).
    pub fn position(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }

    /// Returns true if the result should be drawn in the terminal.
    ///
    /// Stdout carries only the summary when `--json` is set.
    pub fn wants_preview(&self) -> bool {
        self.out.is_none() && !self.json
    }
}
