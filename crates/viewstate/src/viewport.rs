use foundation::geo::{clamp_latitude, wrap_longitude};
use serde::{Deserialize, Serialize};

/// Free-floating map camera.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub pitch: f64,
}

impl Default for Viewport {
    /// Contiguous United States.
    fn default() -> Self {
        Self {
            latitude: 39.8283,
            longitude: -98.5795,
            zoom: 3.5,
            bearing: 0.0,
            pitch: 0.0,
        }
    }
}

impl Viewport {
    pub fn new(longitude: f64, latitude: f64, zoom: f64) -> Self {
        Self {
            latitude,
            longitude,
            zoom,
            ..Self::default()
        }
    }

    /// Wraps longitude, clamps latitude to Web Mercator and keeps zoom `>= 0`.
    pub fn normalized(self) -> Self {
        Self {
            latitude: clamp_latitude(self.latitude),
            longitude: wrap_longitude(self.longitude),
            zoom: self.zoom.max(0.0),
            bearing: self.bearing.rem_euclid(360.0),
            pitch: self.pitch.clamp(0.0, 85.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Viewport;

    #[test]
    fn normalizes_camera() {
        let v = Viewport {
            latitude: 91.0,
            longitude: 200.0,
            zoom: -1.0,
            bearing: -90.0,
            pitch: 120.0,
        }
        .normalized();
        assert!(v.latitude < 86.0);
        assert!((v.longitude - -160.0).abs() < 1e-9);
        assert_eq!(v.zoom, 0.0);
        assert_eq!(v.bearing, 270.0);
        assert_eq!(v.pitch, 85.0);
    }

    #[test]
    fn bearing_and_pitch_default_when_absent() {
        let v: Viewport =
            serde_json::from_str(r#"{"latitude":37.7,"longitude":-122.4,"zoom":9}"#).unwrap();
        assert_eq!(v.bearing, 0.0);
        assert_eq!(v.pitch, 0.0);
    }
}
