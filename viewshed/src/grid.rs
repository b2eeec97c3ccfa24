//! Elevation grids and their placement on the globe.
//!
//! Grids are north-up: row 0 is the northernmost row and column 0
//! the westernmost column. Geographic coordinates are mapped to cells
//! with a local equirectangular projection anchored at the grid's
//! origin, which is accurate over the few tens of kilometers a
//! viewshed covers.

use crate::{math::MEAN_EARTH_RADIUS, GridError};
use geo::geometry::{Coord, Rect};
use std::f64::consts::PI;

/// Meters per degree of latitude.
const METERS_PER_DEG: f64 = MEAN_EARTH_RADIUS * PI / 180.0;

/// Largest number of cells a grid may hold.
pub const MAX_CELLS: usize = 1 << 26;

/// How elevation is sampled between cell centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Use the sample of the nearest cell.
    #[default]
    Nearest,

    /// Blend the four surrounding samples.
    Bilinear,
}

/// Placement of a grid: where it is, how big it is, and how far apart
/// its cells are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Center of the north-west most cell (`x` is longitude, `y`
    /// latitude).
    origin: Coord<f64>,

    /// Ground distance between adjacent cell centers, as (east,
    /// north) meters.
    resolution: (f64, f64),

    rows: usize,

    cols: usize,
}

impl GridGeometry {
    pub fn new(
        origin: Coord<f64>,
        resolution: (f64, f64),
        rows: usize,
        cols: usize,
    ) -> Result<Self, GridError> {
        for res in [resolution.0, resolution.1] {
            if !(res.is_finite() && res > 0.0) {
                return Err(GridError::Resolution(res));
            }
        }
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty);
        }
        if rows.checked_mul(cols).map_or(true, |cells| cells > MAX_CELLS) {
            return Err(GridError::TooLarge { rows, cols });
        }
        if !(origin.y.is_finite() && origin.y.abs() < 90.0) {
            return Err(GridError::Extent(origin.y));
        }
        Ok(Self {
            origin,
            resolution,
            rows,
            cols,
        })
    }

    /// Returns a square geometry with `center` on its middle cell,
    /// reaching at least `radius_m` in every cardinal direction.
    pub fn around(center: Coord<f64>, radius_m: f64, resolution_m: f64) -> Result<Self, GridError> {
        if !(resolution_m.is_finite() && resolution_m > 0.0) {
            return Err(GridError::Resolution(resolution_m));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let half = (radius_m.max(0.0) / resolution_m).ceil() as usize;
        #[allow(clippy::cast_precision_loss)]
        let reach_m = half as f64 * resolution_m;
        let origin_lat = center.y + reach_m / METERS_PER_DEG;
        if !(origin_lat.abs() < 90.0 && (center.y - reach_m / METERS_PER_DEG).abs() < 90.0) {
            return Err(GridError::Extent(origin_lat));
        }
        let origin = Coord {
            x: center.x - reach_m / lon_meters_per_deg(origin_lat),
            y: origin_lat,
        };
        let side = 2 * half + 1;
        Self::new(origin, (resolution_m, resolution_m), side, side)
    }

    /// Returns the geometry whose cells cover `bounds`, starting at
    /// its north-west corner.
    pub fn covering(bounds: Rect<f64>, resolution_m: f64) -> Result<Self, GridError> {
        if !(resolution_m.is_finite() && resolution_m > 0.0) {
            return Err(GridError::Resolution(resolution_m));
        }
        let (min, max) = (bounds.min(), bounds.max());
        let origin = Coord { x: min.x, y: max.y };
        let height_m = (max.y - min.y) * METERS_PER_DEG;
        let width_m = (max.x - min.x) * lon_meters_per_deg(origin.y);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (rows, cols) = (
            (height_m / resolution_m).floor() as usize + 1,
            (width_m / resolution_m).floor() as usize + 1,
        );
        Self::new(origin, (resolution_m, resolution_m), rows, cols)
    }

    pub fn origin(&self) -> Coord<f64> {
        self.origin
    }

    /// Returns (east, north) meters per cell.
    pub fn resolution(&self) -> (f64, f64) {
        self.resolution
    }

    /// Returns (rows, cols).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the (row, col) of the cell nearest to `coord`.
    pub fn latlon_to_cell(&self, coord: Coord<f64>) -> Result<(usize, usize), GridError> {
        let row = ((self.origin.y - coord.y) * METERS_PER_DEG / self.resolution.1).round();
        let col =
            ((coord.x - self.origin.x) * lon_meters_per_deg(self.origin.y) / self.resolution.0)
                .round();
        if !(row.is_finite() && col.is_finite()) {
            return Err(GridError::Coord {
                lat: coord.y,
                lon: coord.x,
            });
        }
        #[allow(clippy::cast_possible_truncation)]
        let (row, col) = (row as isize, col as isize);
        self.checked(row, col)
    }

    /// Returns the center of cell (`row`, `col`).
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_to_latlon(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: self.origin.x
                + col as f64 * self.resolution.0 / lon_meters_per_deg(self.origin.y),
            y: self.origin.y - row as f64 * self.resolution.1 / METERS_PER_DEG,
        }
    }

    fn checked(&self, row: isize, col: isize) -> Result<(usize, usize), GridError> {
        match (usize::try_from(row), usize::try_from(col)) {
            (Ok(r), Ok(c)) if r < self.rows && c < self.cols => Ok((r, c)),
            _ => Err(GridError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            }),
        }
    }
}

fn lon_meters_per_deg(lat: f64) -> f64 {
    METERS_PER_DEG * lat.to_radians().cos()
}

/// An immutable rectangle of elevation samples, in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    geometry: GridGeometry,

    /// Row-major samples, north row first.
    samples: Box<[f64]>,
}

impl ElevationGrid {
    /// Returns a grid built from a list of rows, north row first.
    pub fn new(
        origin: Coord<f64>,
        resolution: (f64, f64),
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, GridError> {
        let cols = rows.first().map_or(0, Vec::len);
        for (row, samples) in rows.iter().enumerate() {
            if samples.len() != cols {
                return Err(GridError::Ragged {
                    row,
                    len: samples.len(),
                    expected: cols,
                });
            }
        }
        let geometry = GridGeometry::new(origin, resolution, rows.len(), cols)?;
        Self::from_samples(geometry, rows.into_iter().flatten().collect())
    }

    /// Returns a grid of `geometry` over row-major `samples`.
    pub fn from_samples(geometry: GridGeometry, samples: Vec<f64>) -> Result<Self, GridError> {
        let (rows, cols) = geometry.dimensions();
        if samples.len() != rows * cols {
            return Err(GridError::Len {
                len: samples.len(),
                expected: rows * cols,
            });
        }
        if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
            return Err(GridError::Sample {
                row: idx / cols,
                col: idx % cols,
            });
        }
        Ok(Self {
            geometry,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Returns a grid of `geometry` whose samples are `f(row, col)`.
    pub fn from_fn<F>(geometry: GridGeometry, mut f: F) -> Result<Self, GridError>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let (rows, cols) = geometry.dimensions();
        let samples = (0..rows * cols).map(|idx| f(idx / cols, idx % cols)).collect();
        Self::from_samples(geometry, samples)
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Returns (rows, cols).
    pub fn dimensions(&self) -> (usize, usize) {
        self.geometry.dimensions()
    }

    /// Returns (east, north) meters per cell.
    pub fn resolution(&self) -> (f64, f64) {
        self.geometry.resolution()
    }

    pub fn origin(&self) -> Coord<f64> {
        self.geometry.origin()
    }

    /// See [`GridGeometry::latlon_to_cell`].
    pub fn latlon_to_cell(&self, coord: Coord<f64>) -> Result<(usize, usize), GridError> {
        self.geometry.latlon_to_cell(coord)
    }

    /// See [`GridGeometry::cell_to_latlon`].
    pub fn cell_to_latlon(&self, row: usize, col: usize) -> Coord<f64> {
        self.geometry.cell_to_latlon(row, col)
    }

    /// Returns the sample at (`row`, `col`).
    pub fn elevation_at(&self, row: usize, col: usize) -> Result<f64, GridError> {
        #[allow(clippy::cast_possible_wrap)]
        let err = GridError::OutOfBounds {
            row: row as isize,
            col: col as isize,
            rows: self.geometry.rows,
            cols: self.geometry.cols,
        };
        self.get(row, col).ok_or(err)
    }

    /// Returns the sample at (`row`, `col`), if any.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let (rows, cols) = self.dimensions();
        (row < rows && col < cols).then(|| self.samples[row * cols + col])
    }

    /// Returns the bilinear blend of the samples around the fractional
    /// cell position (`row`, `col`), or `None` outside the grid.
    ///
    /// At whole-number positions this is exactly the stored sample.
    pub fn sample(&self, row: f64, col: f64) -> Option<f64> {
        let (rows, cols) = self.dimensions();
        #[allow(clippy::cast_precision_loss)]
        let (last_row, last_col) = ((rows - 1) as f64, (cols - 1) as f64);
        if !((0.0..=last_row).contains(&row) && (0.0..=last_col).contains(&col)) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (r0, c0) = (row.floor() as usize, col.floor() as usize);
        let (r1, c1) = ((r0 + 1).min(rows - 1), (c0 + 1).min(cols - 1));
        #[allow(clippy::cast_precision_loss)]
        let (fr, fc) = (row - r0 as f64, col - c0 as f64);
        let at = |r: usize, c: usize| self.samples[r * cols + c];
        let north = at(r0, c0) + (at(r0, c1) - at(r0, c0)) * fc;
        let south = at(r1, c0) + (at(r1, c1) - at(r1, c0)) * fc;
        Some(north + (south - north) * fr)
    }

    /// Returns the lowest sample.
    pub fn min_elevation(&self) -> f64 {
        self.samples.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Returns the highest sample.
    pub fn max_elevation(&self) -> f64 {
        self.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}
