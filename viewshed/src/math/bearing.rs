/// Wraps `deg` into `[0, 360)`.
pub fn normalize_deg(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Returns the compass bearing (degrees clockwise from north) of a
/// displacement of `east_m` and `north_m`.
pub fn bearing_deg(east_m: f64, north_m: f64) -> f64 {
    normalize_deg(east_m.atan2(north_m).to_degrees())
}
