use crate::{math::normalize_deg, ElevationGrid, ViewshedError};
use geo::geometry::Coord;

/// Slack, in degrees, allowed when testing a bearing against a sector
/// edge.
const EDGE_TOLERANCE_DEG: f64 = 1e-9;

/// A viewer placed on an elevation grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    /// Viewer location (`x` is longitude, `y` latitude).
    position: Coord<f64>,

    /// Eye height above ground, in meters.
    height_m: f64,

    /// Grid (row, col) the viewer stands on.
    cell: (usize, usize),

    /// Ground elevation at `cell` plus `height_m`.
    eye_elevation_m: f64,

    /// Bearings the viewer is looking across.
    sector: Sector,
}

impl Viewpoint {
    /// Returns a viewpoint for a viewer at `position` standing
    /// `height_m` above the ground of `grid`, facing `azimuth_deg`
    /// with a field of view `fov_deg` wide.
    pub fn resolve(
        grid: &ElevationGrid,
        position: Coord<f64>,
        height_m: f64,
        azimuth_deg: f64,
        fov_deg: f64,
    ) -> Result<Self, ViewshedError> {
        validate(position, height_m, azimuth_deg, fov_deg)?;
        let cell @ (row, col) =
            grid.latlon_to_cell(position)
                .map_err(|_| ViewshedError::ViewpointOutside {
                    lat: position.y,
                    lon: position.x,
                })?;
        let eye_elevation_m = grid.elevation_at(row, col)? + height_m;
        Ok(Self {
            position,
            height_m,
            cell,
            eye_elevation_m,
            sector: Sector::new(azimuth_deg, fov_deg),
        })
    }

    pub fn position(&self) -> Coord<f64> {
        self.position
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    /// Returns the (row, col) the viewer stands on.
    pub fn cell(&self) -> (usize, usize) {
        self.cell
    }

    /// Returns the absolute elevation of the viewer's eye.
    pub fn eye_elevation_m(&self) -> f64 {
        self.eye_elevation_m
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }
}

/// Checks raw viewer parameters without needing a grid.
pub fn validate(
    position: Coord<f64>,
    height_m: f64,
    azimuth_deg: f64,
    fov_deg: f64,
) -> Result<(), ViewshedError> {
    let checks = [
        ("latitude", position.y, (-90.0..=90.0).contains(&position.y)),
        ("longitude", position.x, (-180.0..=180.0).contains(&position.x)),
        ("height", height_m, height_m.is_finite() && height_m >= 0.0),
        ("azimuth", azimuth_deg, azimuth_deg.is_finite()),
        ("fov", fov_deg, fov_deg > 0.0 && fov_deg <= 360.0),
    ];
    match checks.into_iter().find(|(_, _, ok)| !ok) {
        Some((field, value, _)) => Err(ViewshedError::Validation { field, value }),
        None => Ok(()),
    }
}

/// The range of compass bearings `azimuth ± fov/2`, wrapping through
/// north where needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    /// Center bearing, in `[0, 360)`.
    azimuth_deg: f64,

    /// Full angular width, in `(0, 360]`.
    fov_deg: f64,
}

impl Sector {
    pub fn new(azimuth_deg: f64, fov_deg: f64) -> Self {
        Self {
            azimuth_deg: normalize_deg(azimuth_deg),
            fov_deg: fov_deg.min(360.0),
        }
    }

    pub fn azimuth_deg(&self) -> f64 {
        self.azimuth_deg
    }

    pub fn fov_deg(&self) -> f64 {
        self.fov_deg
    }

    /// Returns the counter-clockwise edge.
    pub fn start_deg(&self) -> f64 {
        normalize_deg(self.azimuth_deg - self.fov_deg / 2.0)
    }

    /// Returns the clockwise edge.
    pub fn end_deg(&self) -> f64 {
        normalize_deg(self.azimuth_deg + self.fov_deg / 2.0)
    }

    pub fn is_full(&self) -> bool {
        self.fov_deg >= 360.0
    }

    /// Returns true if `bearing_deg` lies in this sector, edges
    /// included.
    pub fn contains(&self, bearing_deg: f64) -> bool {
        if self.is_full() {
            return true;
        }
        let from_start = normalize_deg(bearing_deg - self.start_deg());
        from_start <= self.fov_deg + EDGE_TOLERANCE_DEG || from_start >= 360.0 - EDGE_TOLERANCE_DEG
    }

    /// Returns this sector grown by `margin_deg` on both sides.
    #[must_use]
    pub fn widened(&self, margin_deg: f64) -> Self {
        Self::new(self.azimuth_deg, self.fov_deg + 2.0 * margin_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::{validate, Coord, Sector, Viewpoint};
    use crate::{ElevationGrid, GridGeometry, ViewshedError};
    use approx::assert_relative_eq;

    const CENTER: Coord = Coord { x: 8.0, y: 46.5 };

    fn hill() -> ElevationGrid {
        let geometry = GridGeometry::around(CENTER, 300.0, 30.0).unwrap();
        ElevationGrid::from_fn(geometry, |row, col| 500.0 + (row * col) as f64).unwrap()
    }

    fn invalid_field(result: Result<(), ViewshedError>) -> Option<&'static str> {
        match result {
            Err(ViewshedError::Validation { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validation() {
        assert!(validate(CENTER, 1.8, 0.0, 120.0).is_ok());
        assert!(validate(CENTER, 0.0, -720.0, 360.0).is_ok());
        let north_of_pole = Coord { x: 0.0, y: 90.5 };
        assert_eq!(
            invalid_field(validate(north_of_pole, 1.8, 0.0, 120.0)),
            Some("latitude")
        );
        let antimeridian = Coord { x: -180.1, y: 0.0 };
        assert_eq!(
            invalid_field(validate(antimeridian, 1.8, 0.0, 120.0)),
            Some("longitude")
        );
        assert_eq!(
            invalid_field(validate(CENTER, -0.1, 0.0, 120.0)),
            Some("height")
        );
        assert_eq!(
            invalid_field(validate(CENTER, 1.8, f64::NAN, 120.0)),
            Some("azimuth")
        );
        assert_eq!(
            invalid_field(validate(CENTER, 1.8, 0.0, 0.0)),
            Some("fov")
        );
        assert_eq!(
            invalid_field(validate(CENTER, 1.8, 0.0, 360.5)),
            Some("fov")
        );
    }

    #[test]
    fn test_validation_reports_value() {
        let err = validate(CENTER, 1.8, 0.0, 400.0).unwrap_err();
        assert_eq!(err.to_string(), "invalid fov 400");
    }

    #[test]
    fn test_resolve() {
        let grid = hill();
        let viewpoint = Viewpoint::resolve(&grid, CENTER, 1.8, 450.0, 90.0).unwrap();
        assert_eq!(viewpoint.cell(), (10, 10));
        assert_relative_eq!(viewpoint.eye_elevation_m(), 601.8);
        assert_relative_eq!(viewpoint.sector().azimuth_deg(), 90.0);
        assert_relative_eq!(viewpoint.sector().start_deg(), 45.0);
        assert_relative_eq!(viewpoint.sector().end_deg(), 135.0);
    }

    #[test]
    fn test_resolve_outside_grid() {
        let grid = hill();
        let elsewhere = Coord { x: 9.0, y: 46.5 };
        assert!(matches!(
            Viewpoint::resolve(&grid, elsewhere, 1.8, 0.0, 90.0),
            Err(ViewshedError::ViewpointOutside { .. })
        ));
    }

    #[test]
    fn test_sector_edges_are_inclusive() {
        let sector = Sector::new(90.0, 90.0);
        assert!(sector.contains(45.0));
        assert!(sector.contains(135.0));
        assert!(sector.contains(90.0));
        assert!(!sector.contains(44.999));
        assert!(!sector.contains(135.001));
        assert!(!sector.contains(270.0));
    }

    #[test]
    fn test_sector_wraps_north() {
        let sector = Sector::new(350.0, 40.0);
        assert_relative_eq!(sector.start_deg(), 330.0);
        assert_relative_eq!(sector.end_deg(), 10.0);
        assert!(sector.contains(0.0));
        assert!(sector.contains(359.0));
        assert!(sector.contains(10.0));
        assert!(!sector.contains(11.0));
        assert!(!sector.contains(180.0));
    }

    #[test]
    fn test_full_and_widened() {
        assert!(Sector::new(0.0, 360.0).contains(123.4));
        let widened = Sector::new(0.0, 20.0).widened(5.0);
        assert!(widened.contains(15.0));
        assert!(!widened.contains(15.1));
        assert!(Sector::new(0.0, 350.0).widened(10.0).is_full());
    }
}
