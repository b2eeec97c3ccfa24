mod bearing;
mod curvature;
mod elevation_angle;

pub use {
    bearing::{bearing_deg, normalize_deg},
    curvature::Curvature,
    elevation_angle::elevation_angle,
};

/// Mean earth radius in meters.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;
