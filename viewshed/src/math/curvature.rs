use super::MEAN_EARTH_RADIUS;

/// Adjustment applied to terrain samples before their elevation
/// angle is taken.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Curvature {
    /// Treat the surface as a plane.
    #[default]
    Flat,

    /// Drop terrain below the viewer's horizontal plane by the earth's
    /// curvature, reduced by the atmospheric refraction coefficient.
    Earth { refraction: f64 },
}

impl Curvature {
    /// Returns the meters to add to a sample `distance_m` from the
    /// viewer.
    pub fn correction(self, distance_m: f64) -> f64 {
        match self {
            Self::Flat => 0.0,
            Self::Earth { refraction } => {
                -(distance_m * distance_m) * (1.0 - refraction) / (2.0 * MEAN_EARTH_RADIUS)
            }
        }
    }
}
