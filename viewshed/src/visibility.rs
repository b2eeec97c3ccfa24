use crate::{
    math::{bearing_deg, elevation_angle, Curvature},
    ElevationGrid, GridError, Interpolation, Ray, Viewpoint, ViewshedError,
};
use log::debug;
use rayon::prelude::*;

/// Default atmospheric refraction coefficient.
pub const DEFAULT_REFRACTION: f64 = 0.13;

/// Which cells of an elevation grid can be seen from a viewpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityGrid {
    rows: usize,
    cols: usize,

    /// Row-major flags, north row first.
    cells: Box<[bool]>,
}

impl VisibilityGrid {
    pub fn builder() -> VisibilityBuilder {
        VisibilityBuilder {
            max_radius_m: None,
            interpolation: Interpolation::Nearest,
            earth_curve: false,
            refraction: DEFAULT_REFRACTION,
        }
    }

    /// Returns a grid from row-major `cells`, north row first.
    pub fn new(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty);
        }
        if cells.len() != rows * cols {
            return Err(GridError::Len {
                len: cells.len(),
                expected: rows * cols,
            });
        }
        Ok(Self {
            rows,
            cols,
            cells: cells.into_boxed_slice(),
        })
    }

    /// Returns (rows, cols).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns true if (`row`, `col`) is inside the grid and visible.
    pub fn is_visible(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    /// Returns the number of visible cells.
    pub fn count_visible(&self) -> usize {
        self.cells.iter().filter(|visible| **visible).count()
    }

    /// Returns the row-major visibility flags.
    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// Returns an iterator over the (row, col) of every visible cell.
    pub fn visible_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, visible)| **visible)
            .map(|(idx, _)| (idx / self.cols, idx % self.cols))
    }
}

/// Private API.
impl VisibilityGrid {
    fn hidden(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols].into_boxed_slice(),
        }
    }

    fn mark(&mut self, row: usize, col: usize) {
        self.cells[row * self.cols + col] = true;
    }

    /// Combines two partial results; a cell seen by either stays seen.
    fn union(mut self, other: Self) -> Self {
        for (cell, seen) in self.cells.iter_mut().zip(other.cells.iter()) {
            *cell |= *seen;
        }
        self
    }
}

pub struct VisibilityBuilder {
    /// Farthest distance from the viewer to analyze (meters, defaults
    /// to the grid's edge).
    max_radius_m: Option<f64>,

    /// How terrain is sampled along rays (defaults to nearest cell).
    interpolation: Interpolation,

    /// Account for earth curvature (defaults to false).
    earth_curve: bool,

    /// Refraction coefficient used with `earth_curve` (defaults to
    /// 0.13).
    refraction: f64,
}

impl VisibilityBuilder {
    /// Farthest distance from the viewer to analyze (meters, defaults
    /// to the grid's edge).
    #[must_use]
    pub fn max_radius(mut self, meters: f64) -> Self {
        self.max_radius_m = Some(meters);
        self
    }

    /// How terrain is sampled along rays (defaults to nearest cell).
    #[must_use]
    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Account for earth curvature (defaults to false).
    #[must_use]
    pub fn earth_curve(mut self, earth_curve: bool) -> Self {
        self.earth_curve = earth_curve;
        self
    }

    /// Refraction coefficient used with `earth_curve` (defaults to
    /// 0.13; has no effect if `earth_curve` is `false`).
    #[must_use]
    pub fn refraction(mut self, coefficient: f64) -> Self {
        self.refraction = coefficient;
        self
    }

    /// Returns the cells of `grid` visible from `viewpoint`.
    pub fn build(
        &self,
        grid: &ElevationGrid,
        viewpoint: &Viewpoint,
    ) -> Result<VisibilityGrid, ViewshedError> {
        if let Some(max_radius_m) = self.max_radius_m {
            if !(max_radius_m.is_finite() && max_radius_m > 0.0) {
                return Err(ViewshedError::Validation {
                    field: "max_radius",
                    value: max_radius_m,
                });
            }
        }
        if !(0.0..1.0).contains(&self.refraction) {
            return Err(ViewshedError::Validation {
                field: "refraction",
                value: self.refraction,
            });
        }
        let (rows, cols) = grid.dimensions();
        let (row, col) = viewpoint.cell();
        grid.elevation_at(row, col)?;

        let sweep = Sweep {
            grid,
            viewpoint,
            max_radius_m: self.max_radius_m,
            interpolation: self.interpolation,
            curvature: if self.earth_curve {
                Curvature::Earth {
                    refraction: self.refraction,
                }
            } else {
                Curvature::Flat
            },
        };

        let now = std::time::Instant::now();
        let rays = sweep.rays();
        let mut visibility = rays
            .par_iter()
            .fold(
                || VisibilityGrid::hidden(rows, cols),
                |mut partial, ray| {
                    sweep.cast(ray, &mut partial);
                    partial
                },
            )
            .reduce(|| VisibilityGrid::hidden(rows, cols), VisibilityGrid::union);
        visibility.mark(row, col);

        debug!(
            "viewshed; rays: {}, visible: {}/{}, exec: {:?}",
            rays.len(),
            visibility.count_visible(),
            rows * cols,
            now.elapsed()
        );

        Ok(visibility)
    }
}

/// Per-analysis state shared read-only by every ray.
struct Sweep<'a> {
    grid: &'a ElevationGrid,
    viewpoint: &'a Viewpoint,
    max_radius_m: Option<f64>,
    interpolation: Interpolation,
    curvature: Curvature,
}

impl<'a> Sweep<'a> {
    /// Returns the half-size, in cells, of the square to sweep.
    fn radius_cells(&self) -> usize {
        let (rows, cols) = self.grid.dimensions();
        let (row, col) = self.viewpoint.cell();
        let to_edge = row.max(rows - 1 - row).max(col).max(cols - 1 - col);
        match self.max_radius_m {
            Some(max_radius_m) => {
                let (res_x, res_y) = self.grid.resolution();
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let limit = (max_radius_m / res_x.min(res_y)).ceil() as usize;
                to_edge.min(limit)
            }
            None => to_edge,
        }
    }

    /// Returns the rays aimed within the viewer's sector.
    ///
    /// The sector is widened by a little over the angle between
    /// neighbouring perimeter rays so that cells sitting exactly on an
    /// edge are still reached; each cell's own bearing decides whether
    /// it is inside.
    fn rays(&self) -> Vec<Ray> {
        let radius = self.radius_cells();
        let resolution @ (res_x, res_y) = self.grid.resolution();
        let sector = self.viewpoint.sector();
        let rays = Ray::perimeter(radius, resolution);
        if sector.is_full() || rays.is_empty() {
            return rays;
        }
        #[allow(clippy::cast_precision_loss)]
        let margin_deg = (2.0 * res_x.max(res_y) / res_x.min(res_y) / radius as f64)
            .atan()
            .to_degrees();
        let widened = sector.widened(margin_deg);
        rays.into_iter()
            .filter(|ray| widened.contains(ray.bearing_deg))
            .collect()
    }

    /// Marches `ray` outward, marking the cells it sees.
    #[allow(clippy::cast_precision_loss)]
    fn cast(&self, ray: &Ray, visibility: &mut VisibilityGrid) {
        let (rows, cols) = self.grid.dimensions();
        let (row0, col0) = self.viewpoint.cell();
        let (res_x, res_y) = self.grid.resolution();
        let eye_m = self.viewpoint.eye_elevation_m();
        let sector = self.viewpoint.sector();
        let mut horizon = f64::NEG_INFINITY;

        for step in ray.steps() {
            let (drow, dcol) = step.cell;
            let (Some(row), Some(col)) = (
                row0.checked_add_signed(drow).filter(|r| *r < rows),
                col0.checked_add_signed(dcol).filter(|c| *c < cols),
            ) else {
                break;
            };

            let (east_m, north_m) = (dcol as f64 * res_x, -drow as f64 * res_y);
            let cell_distance_m = east_m.hypot(north_m);
            if self.max_radius_m.is_some_and(|max| cell_distance_m > max) {
                break;
            }

            let (sample, distance_m) = match self.interpolation {
                Interpolation::Nearest => (self.grid.get(row, col), cell_distance_m),
                Interpolation::Bilinear => {
                    // The rounded cell is inside the grid but the exact
                    // position may lie up to half a cell past its edge.
                    let (frow, fcol) = step.exact;
                    let (last_row, last_col) = ((rows - 1) as f64, (cols - 1) as f64);
                    (
                        self.grid.sample(
                            (row0 as f64 + frow).clamp(0.0, last_row),
                            (col0 as f64 + fcol).clamp(0.0, last_col),
                        ),
                        (fcol * res_x).hypot(frow * res_y),
                    )
                }
            };
            let Some(sample) = sample else {
                break;
            };

            let angle = elevation_angle(
                eye_m,
                distance_m,
                sample + self.curvature.correction(distance_m),
            );
            if angle >= horizon && sector.contains(bearing_deg(east_m, north_m)) {
                visibility.mark(row, col);
            }
            horizon = horizon.max(angle);
        }
    }
}
