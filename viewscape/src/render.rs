//! Hillshaded terrain with a visibility overlay.

use crate::error::RenderError;
use plotters::prelude::*;
use std::path::Path;
use viewshed::{ElevationGrid, VisibilityGrid};

/// Hypsometric colour stops, low to high.
const RAMP: [(f64, [u8; 3]); 5] = [
    (0.0, [56, 128, 64]),
    (0.35, [160, 190, 90]),
    (0.6, [200, 170, 110]),
    (0.85, [140, 110, 80]),
    (1.0, [250, 250, 250]),
];

/// Fraction of a base colour kept in full shadow.
const AMBIENT: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Direction light comes from, in degrees clockwise from north.
    pub light_azimuth_deg: f64,

    /// Light angle above the horizon, in degrees.
    pub light_altitude_deg: f64,

    /// Vertical exaggeration applied before shading.
    pub z_factor: f64,

    /// Colour painted over visible cells.
    pub overlay: [u8; 3],

    /// Opacity of `overlay`, in `[0, 1]`.
    pub overlay_alpha: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            light_azimuth_deg: 315.0,
            light_altitude_deg: 45.0,
            z_factor: 1.0,
            overlay: [0, 204, 0],
            overlay_alpha: 0.5,
        }
    }
}

/// An RGB raster, one pixel per grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl Image {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel at (`x`, `y`), counted from the top-left.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Encodes this image to `path`, creating missing parent
    /// directories. The format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                path: parent.to_owned(),
                source,
            })?;
        }
        let encode_err = |e: &dyn std::fmt::Display| RenderError::Encode {
            path: path.to_owned(),
            msg: e.to_string(),
        };
        let area = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        for (idx, [r, g, b]) in self.pixels.iter().copied().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let (x, y) = (
                (idx % self.width as usize) as i32,
                (idx / self.width as usize) as i32,
            );
            area.draw_pixel((x, y), &RGBColor(r, g, b))
                .map_err(|e| encode_err(&e))?;
        }
        area.present().map_err(|e| encode_err(&e))?;
        Ok(())
    }
}

/// Returns a hillshaded rendering of `grid` with `visibility` painted
/// over it.
pub fn render(
    grid: &ElevationGrid,
    visibility: &VisibilityGrid,
    config: &RenderConfig,
) -> Result<Image, RenderError> {
    let (rows, cols) = grid.dimensions();
    let (vis_rows, vis_cols) = visibility.dimensions();
    if (rows, cols) != (vis_rows, vis_cols) {
        return Err(RenderError::Shape {
            rows,
            cols,
            vis_rows,
            vis_cols,
        });
    }
    let (Ok(width), Ok(height)) = (u32::try_from(cols), u32::try_from(rows)) else {
        return Err(RenderError::Size(cols, rows));
    };

    let (low, high) = (grid.min_elevation(), grid.max_elevation());
    let shades = hillshade(grid, config);
    let alpha = config.overlay_alpha.clamp(0.0, 1.0);
    let pixels = shades
        .iter()
        .zip(visibility.as_slice())
        .enumerate()
        .map(|(idx, (shade, visible))| {
            let elevation = grid.get(idx / cols, idx % cols).unwrap_or(low);
            let t = if high > low {
                (elevation - low) / (high - low)
            } else {
                0.5
            };
            let base = ramp(t).map(|c| c * (AMBIENT + (1.0 - AMBIENT) * shade));
            let rgb = if *visible {
                let mut blended = base;
                for (c, o) in blended.iter_mut().zip(config.overlay) {
                    *c = (1.0 - alpha) * *c + alpha * f64::from(o);
                }
                blended
            } else {
                base
            };
            rgb.map(to_channel)
        })
        .collect();

    Ok(Image {
        width,
        height,
        pixels,
    })
}

/// Returns the illumination of every cell, in `[0, 1]`, row-major.
///
/// Gradients use Horn's 3x3 kernel with neighbours clamped at the
/// grid's edges.
fn hillshade(grid: &ElevationGrid, config: &RenderConfig) -> Vec<f64> {
    let (rows, cols) = grid.dimensions();
    let (res_x, res_y) = grid.resolution();
    let zenith = (90.0 - config.light_altitude_deg).to_radians();
    let azimuth = (360.0 - config.light_azimuth_deg + 90.0).rem_euclid(360.0).to_radians();

    let at = |row: usize, col: usize, drow: isize, dcol: isize| {
        let r = row.saturating_add_signed(drow).min(rows - 1);
        let c = col.saturating_add_signed(dcol).min(cols - 1);
        grid.get(r, c).unwrap_or_default()
    };

    (0..rows * cols)
        .map(|idx| {
            let (row, col) = (idx / cols, idx % cols);
            let z = |drow, dcol| at(row, col, drow, dcol);
            let (a, b, c) = (z(-1, -1), z(-1, 0), z(-1, 1));
            let (d, f) = (z(0, -1), z(0, 1));
            let (g, h, i) = (z(1, -1), z(1, 0), z(1, 1));
            let dzdx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * res_x);
            let dzdy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / (8.0 * res_y);
            let slope = (config.z_factor * dzdx.hypot(dzdy)).atan();
            let mut aspect = dzdy.atan2(-dzdx);
            if aspect < 0.0 {
                aspect += 2.0 * std::f64::consts::PI;
            }
            let shade = zenith.cos() * slope.cos()
                + zenith.sin() * slope.sin() * (azimuth - aspect).cos();
            shade.clamp(0.0, 1.0)
        })
        .collect()
}

/// Returns the ramp colour at `t` in `[0, 1]`.
fn ramp(t: f64) -> [f64; 3] {
    let t = t.clamp(0.0, 1.0);
    let upper = RAMP.iter().position(|(stop, _)| *stop >= t).unwrap_or(RAMP.len() - 1);
    let (t1, c1) = RAMP[upper];
    let (t0, c0) = RAMP[upper.saturating_sub(1)];
    let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
    [0, 1, 2].map(|i| f64::from(c0[i]) + (f64::from(c1[i]) - f64::from(c0[i])) * f)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::{hillshade, ramp, render, RenderConfig};
    use crate::error::RenderError;
    use approx::assert_relative_eq;
    use geo::geometry::Coord;
    use tempfile::TempDir;
    use viewshed::{ElevationGrid, GridGeometry, VisibilityGrid};

    const ORIGIN: Coord = Coord { x: 8.0, y: 46.5 };

    fn grid_of<F: FnMut(usize, usize) -> f64>(rows: usize, cols: usize, f: F) -> ElevationGrid {
        let geometry = GridGeometry::new(ORIGIN, (30.0, 30.0), rows, cols).unwrap();
        ElevationGrid::from_fn(geometry, f).unwrap()
    }

    fn all(rows: usize, cols: usize, visible: bool) -> VisibilityGrid {
        VisibilityGrid::new(rows, cols, vec![visible; rows * cols]).unwrap()
    }

    #[test]
    fn test_ramp_stops() {
        assert_eq!(ramp(0.0), [56.0, 128.0, 64.0]);
        assert_eq!(ramp(1.0), [250.0, 250.0, 250.0]);
        assert_eq!(ramp(0.6), [200.0, 170.0, 110.0]);
        let mid = ramp(0.175);
        assert_relative_eq!(mid[0], 108.0);
    }

    #[test]
    fn test_flat_terrain_shades_uniformly() {
        let grid = grid_of(6, 7, |_, _| 420.0);
        let config = RenderConfig::default();
        let shades = hillshade(&grid, &config);
        for shade in shades {
            assert_relative_eq!(shade, 45f64.to_radians().sin(), epsilon = 1e-12);
        }
        let image = render(&grid, &all(6, 7, false), &config).unwrap();
        let first = image.pixel(0, 0).unwrap();
        for y in 0..6 {
            for x in 0..7 {
                assert_eq!(image.pixel(x, y), Some(first));
            }
        }
    }

    #[test]
    fn test_slope_facing_light_is_brighter() {
        // Light comes from the north-west by default.
        let config = RenderConfig::default();
        let west_facing = grid_of(5, 5, |_, col| col as f64 * 20.0);
        let east_facing = grid_of(5, 5, |_, col| 100.0 - col as f64 * 20.0);
        let flat = hillshade(&grid_of(5, 5, |_, _| 0.0), &config)[12];
        let lit = hillshade(&west_facing, &config)[12];
        let shadowed = hillshade(&east_facing, &config)[12];
        assert!(lit > flat);
        assert!(flat > shadowed);
    }

    #[test]
    fn test_overlay() {
        let grid = grid_of(4, 4, |row, col| (row * 4 + col) as f64 * 10.0);
        let config = RenderConfig::default();
        let terrain = render(&grid, &all(4, 4, false), &config).unwrap();
        let tinted = render(&grid, &all(4, 4, true), &config).unwrap();
        assert_eq!((tinted.width(), tinted.height()), (4, 4));
        for y in 0..4 {
            for x in 0..4 {
                let base = terrain.pixel(x, y).unwrap();
                let over = tinted.pixel(x, y).unwrap();
                for i in 0..3 {
                    let expected = 0.5 * f64::from(base[i]) + 0.5 * f64::from(config.overlay[i]);
                    assert!((f64::from(over[i]) - expected).abs() <= 1.0);
                }
                assert_ne!(base, over);
            }
        }
    }

    #[test]
    fn test_partial_overlay() {
        let grid = grid_of(2, 2, |_, _| 5.0);
        let visibility = VisibilityGrid::new(2, 2, vec![true, false, false, false]).unwrap();
        let image = render(&grid, &visibility, &RenderConfig::default()).unwrap();
        assert_ne!(image.pixel(0, 0), image.pixel(1, 0));
        assert_eq!(image.pixel(1, 0), image.pixel(1, 1));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn test_shape_mismatch() {
        let grid = grid_of(3, 4, |_, _| 0.0);
        assert!(matches!(
            render(&grid, &all(4, 3, true), &RenderConfig::default()),
            Err(RenderError::Shape {
                rows: 3,
                cols: 4,
                vis_rows: 4,
                vis_cols: 3
            })
        ));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("view.png");
        let grid = grid_of(8, 9, |row, col| (row + col) as f64);
        let image = render(&grid, &all(8, 9, true), &RenderConfig::default()).unwrap();
        image.save(&path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
