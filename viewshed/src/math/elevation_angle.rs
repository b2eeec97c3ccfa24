use num_traits::Float;

/// Returns the up/down angle (in radians) from an eye at
/// `eye_elev_m` to a point `distance_m` away at `target_elev_m`.
pub fn elevation_angle<T: Float>(eye_elev_m: T, distance_m: T, target_elev_m: T) -> T {
    (target_elev_m - eye_elev_m).atan2(distance_m)
}
