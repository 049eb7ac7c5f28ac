/// Web Mercator cannot represent the poles; map cameras clamp to this latitude.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// Wraps a longitude into `[-180, 180)`.
pub fn wrap_longitude(lon: f64) -> f64 {
    if !lon.is_finite() {
        return lon;
    }
    if (-180.0..180.0).contains(&lon) {
        return lon;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
}

#[cfg(test)]
mod tests {
    use super::{MAX_MERCATOR_LAT, clamp_latitude, wrap_longitude};

    #[test]
    fn wraps_longitude() {
        assert_eq!(wrap_longitude(-122.4), -122.4);
        assert!((wrap_longitude(190.0) - -170.0).abs() < 1e-9);
        assert!((wrap_longitude(-190.0) - 170.0).abs() < 1e-9);
        assert_eq!(wrap_longitude(180.0), -180.0);
    }

    #[test]
    fn clamps_latitude() {
        assert_eq!(clamp_latitude(89.0), MAX_MERCATOR_LAT);
        assert_eq!(clamp_latitude(37.77), 37.77);
    }
}
