//! Rays swept outward from the viewer's cell.
//!
//! Offsets are (rows south, cols east) relative to the viewer. A ray
//! is aimed at one cell on the perimeter of the square of half-size
//! `R` around the viewer and steps one cell along its major axis at a
//! time, so its `R` steps visit one cell per row (or column) of the
//! square. Aiming one ray at every perimeter cell visits every cell of
//! the square at least once.

use crate::math::bearing_deg;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Compass bearing, in degrees clockwise from north.
    pub bearing_deg: f64,

    /// Perimeter cell offset this ray is aimed at.
    pub target: (isize, isize),
}

impl Ray {
    /// Returns a ray toward `target` on a grid with (east, north)
    /// `resolution` meters per cell.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(target: (isize, isize), resolution: (f64, f64)) -> Self {
        let (drow, dcol) = target;
        Self {
            bearing_deg: bearing_deg(dcol as f64 * resolution.0, -drow as f64 * resolution.1),
            target,
        }
    }

    /// Returns the `8 * radius` rays aimed at the perimeter of the
    /// square of half-size `radius`, ordered by bearing.
    #[allow(clippy::cast_possible_wrap)]
    pub fn perimeter(radius: usize, resolution: (f64, f64)) -> Vec<Self> {
        let r = radius as isize;
        let mut rays = Vec::with_capacity(8 * radius);
        if r == 0 {
            return rays;
        }
        for d in -r..=r {
            rays.push(Self::new((-r, d), resolution));
            rays.push(Self::new((r, d), resolution));
        }
        for d in (-r + 1)..r {
            rays.push(Self::new((d, -r), resolution));
            rays.push(Self::new((d, r), resolution));
        }
        rays.sort_by(|a, b| a.bearing_deg.total_cmp(&b.bearing_deg));
        rays
    }

    /// Returns an iterator over this ray's steps, nearest first.
    pub fn steps(&self) -> RaySteps {
        let (drow, dcol) = self.target;
        RaySteps {
            target: self.target,
            len: drow.unsigned_abs().max(dcol.unsigned_abs()),
            current: 0,
        }
    }
}

/// One step along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayStep {
    /// Offset of the cell nearest to the ray at this step.
    pub cell: (isize, isize),

    /// Exact fractional offset of the ray at this step.
    pub exact: (f64, f64),
}

pub struct RaySteps {
    target: (isize, isize),
    len: usize,
    current: usize,
}

impl Iterator for RaySteps {
    type Item = RayStep;

    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    fn next(&mut self) -> Option<RayStep> {
        if self.current >= self.len {
            return None;
        }
        self.current += 1;
        let (i, len) = (self.current as isize, self.len as f64);
        let (trow, tcol) = self.target;
        let exact = ((i * trow) as f64 / len, (i * tcol) as f64 / len);
        #[allow(clippy::cast_possible_truncation)]
        let cell = if tcol.abs() >= trow.abs() {
            (exact.0.round() as isize, i * tcol.signum())
        } else {
            (i * trow.signum(), exact.1.round() as isize)
        };
        Some(RayStep { cell, exact })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RaySteps {}

#[cfg(test)]
mod tests {
    use super::Ray;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    const SQUARE: (f64, f64) = (30.0, 30.0);

    #[test]
    fn test_perimeter_count_and_order() {
        assert!(Ray::perimeter(0, SQUARE).is_empty());
        for radius in 1..6 {
            let rays = Ray::perimeter(radius, SQUARE);
            assert_eq!(rays.len(), 8 * radius);
            assert!(rays
                .windows(2)
                .all(|w| w[0].bearing_deg <= w[1].bearing_deg));
        }
        let rays = Ray::perimeter(3, SQUARE);
        assert_eq!(rays[0].target, (-3, 0));
        assert_relative_eq!(rays[0].bearing_deg, 0.0);
    }

    #[test]
    fn test_compass_targets() {
        assert_relative_eq!(Ray::new((0, 4), SQUARE).bearing_deg, 90.0);
        assert_relative_eq!(Ray::new((4, 0), SQUARE).bearing_deg, 180.0);
        assert_relative_eq!(Ray::new((0, -4), SQUARE).bearing_deg, 270.0);
        assert_relative_eq!(Ray::new((-4, 4), SQUARE).bearing_deg, 45.0, epsilon = 1e-12);
        // Cells twice as tall as wide pull the diagonal toward north.
        assert!(Ray::new((-4, 4), (30.0, 60.0)).bearing_deg < 45.0);
    }

    #[test]
    fn test_steps() {
        let ray = Ray::new((-2, 4), SQUARE);
        let steps = ray.steps();
        assert_eq!(steps.len(), 4);
        let cells: Vec<_> = steps.map(|step| step.cell).collect();
        assert_eq!(cells, vec![(-1, 1), (-1, 2), (-2, 3), (-2, 4)]);

        let steep = Ray::new((5, -1), SQUARE);
        let cells: Vec<_> = steep.steps().map(|step| step.cell).collect();
        assert_eq!(cells, vec![(1, 0), (2, 0), (3, -1), (4, -1), (5, -1)]);
        let last = steep.steps().last().unwrap();
        assert_eq!(last.exact, (5.0, -1.0));
    }

    #[test]
    fn test_perimeter_rays_cover_square() {
        for radius in 1..12_isize {
            let mut seen = HashSet::new();
            for ray in Ray::perimeter(radius.unsigned_abs(), SQUARE) {
                seen.extend(ray.steps().map(|step| step.cell));
            }
            for drow in -radius..=radius {
                for dcol in -radius..=radius {
                    if (drow, dcol) != (0, 0) {
                        assert!(seen.contains(&(drow, dcol)), "{drow},{dcol} @ {radius}");
                    }
                }
            }
        }
    }
}
