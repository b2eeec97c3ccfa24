mod error;
mod options;
mod preview;
mod render;

use anyhow::Error as AnyError;
use clap::Parser;
use log::{error, info};
use options::Cli;
use render::{render, RenderConfig};
use serde::Serialize;
use std::{path::PathBuf, process::ExitCode};
use viewshed::{
    ElevationSource, GridGeometry, Interpolation, TileMode, Tiles, Viewpoint, VisibilityGrid,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AnyError> {
    let position = cli.position();
    viewshed::validate(position, cli.height, cli.azimuth, cli.fov)?;

    let tile_mode = if cli.in_mem {
        TileMode::InMem
    } else {
        TileMode::MemMap
    };
    let tiles = Tiles::new(cli.tile_dir.clone(), tile_mode)?;
    let geometry = GridGeometry::around(position, cli.radius, cli.resolution)?;
    let grid = tiles.fetch(&geometry)?;

    let viewpoint = Viewpoint::resolve(&grid, position, cli.height, cli.azimuth, cli.fov)?;
    let visibility = VisibilityGrid::builder()
        .max_radius(cli.radius)
        .interpolation(if cli.bilinear {
            Interpolation::Bilinear
        } else {
            Interpolation::Nearest
        })
        .earth_curve(cli.earth_curve)
        .refraction(cli.refraction)
        .build(&grid, &viewpoint)?;

    let (rows, cols) = grid.dimensions();
    info!(
        "{} of {} cells visible from ({}, {})",
        visibility.count_visible(),
        rows * cols,
        position.y,
        position.x
    );

    match &cli.out {
        Some(out) => {
            let config = RenderConfig {
                light_azimuth_deg: cli.light_azimuth,
                light_altitude_deg: cli.light_altitude,
                z_factor: cli.exaggeration,
                ..RenderConfig::default()
            };
            render(&grid, &visibility, &config)?.save(out)?;
            info!("wrote {}", out.display());
        }
        None if cli.wants_preview() => preview::preview(&visibility),
        None => (),
    }

    if cli.json {
        let summary = Summary::new(&cli, &grid, &viewpoint, &visibility);
        println!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}

#[derive(Serialize)]
struct Summary {
    location: [f64; 2],
    height_m: f64,
    eye_elevation_m: f64,
    azimuth_deg: f64,
    fov_deg: f64,
    radius_m: f64,
    resolution_m: [f64; 2],
    rows: usize,
    cols: usize,
    visible_cells: usize,
    visible_area_km2: f64,
    out: Option<PathBuf>,
}

impl Summary {
    #[allow(clippy::cast_precision_loss)]
    fn new(
        cli: &Cli,
        grid: &viewshed::ElevationGrid,
        viewpoint: &Viewpoint,
        visibility: &VisibilityGrid,
    ) -> Self {
        let (rows, cols) = grid.dimensions();
        let (res_x, res_y) = grid.resolution();
        let visible_cells = visibility.count_visible();
        Self {
            location: [viewpoint.position().x, viewpoint.position().y],
            height_m: viewpoint.height_m(),
            eye_elevation_m: viewpoint.eye_elevation_m(),
            azimuth_deg: viewpoint.sector().azimuth_deg(),
            fov_deg: viewpoint.sector().fov_deg(),
            radius_m: cli.radius,
            resolution_m: [res_x, res_y],
            rows,
            cols,
            visible_cells,
            visible_area_km2: visible_cells as f64 * res_x * res_y / 1e6,
            out: cli.out.clone(),
        }
    }
}
