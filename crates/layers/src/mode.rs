use serde::Serialize;
use tracing::debug;

/// Zoom level at which the renderer switches data delivery.
pub const ZOOM_THRESHOLD: f64 = 6.0;

/// How choropleth polygons reach the screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Client-side polygon layer fed from the full lookup table (`zoom <= 6`).
    Detail,
    /// Server-delivered vector tiles, colored client-side (`zoom > 6`).
    Overview,
}

impl RenderMode {
    /// Mode for a zoom value. Non-finite zooms are never `<= 6` and read as overview.
    pub fn for_zoom(zoom: f64) -> Self {
        if zoom <= ZOOM_THRESHOLD {
            RenderMode::Detail
        } else {
            RenderMode::Overview
        }
    }
}

/// Re-evaluates the mode on every viewport change.
///
/// There is deliberately no hysteresis band: a zoom oscillating around the
/// threshold toggles the mode on every update.
#[derive(Debug, Default, Clone)]
pub struct ModeTracker {
    mode: Option<RenderMode>,
    transitions: u64,
}

impl ModeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<RenderMode> {
        self.mode
    }

    /// Number of mode changes after the first evaluation.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Returns the new mode when it differs from the previous one.
    pub fn update(&mut self, zoom: f64) -> Option<RenderMode> {
        let next = RenderMode::for_zoom(zoom);
        match self.mode.replace(next) {
            Some(prev) if prev == next => None,
            Some(prev) => {
                self.transitions += 1;
                debug!("render mode {prev:?} -> {next:?} at zoom {zoom}");
                Some(next)
            }
            None => Some(next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ModeTracker, RenderMode, ZOOM_THRESHOLD};

    #[test]
    fn threshold_is_inclusive_for_detail() {
        for z in [0.0, 3.5, 5.999, 6.0] {
            assert_eq!(RenderMode::for_zoom(z), RenderMode::Detail, "{z}");
        }
        for z in [6.000_001, 7.0, 14.0, 22.0] {
            assert_eq!(RenderMode::for_zoom(z), RenderMode::Overview, "{z}");
        }
        assert_eq!(RenderMode::for_zoom(f64::NAN), RenderMode::Overview);
    }

    #[test]
    fn zoom_sweep_matches_rule() {
        let mut z = -1.0;
        while z < 24.0 {
            let want = if z <= ZOOM_THRESHOLD {
                RenderMode::Detail
            } else {
                RenderMode::Overview
            };
            assert_eq!(RenderMode::for_zoom(z), want);
            z += 0.125;
        }
    }

    #[test]
    fn oscillation_toggles_every_update() {
        let mut t = ModeTracker::new();
        assert_eq!(t.update(5.9), Some(RenderMode::Detail));
        assert_eq!(t.update(5.95), None);
        for i in 0..10 {
            let z = if i % 2 == 0 { 6.01 } else { 5.99 };
            assert!(t.update(z).is_some());
        }
        assert_eq!(t.transitions(), 10);
        assert_eq!(t.mode(), Some(RenderMode::Detail));
    }
}
