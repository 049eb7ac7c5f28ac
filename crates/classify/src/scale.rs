use std::fmt;
use std::str::FromStr;

use foundation::precision::approx_eq;
use rgb::RGB8;
use serde::{Deserialize, Serialize};

/// Binning strategy, toggled by the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    /// Equal-width bins over the domain.
    #[default]
    Quantize,
    /// Equal-population bins over the observed values.
    Quantile,
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleType::Quantize => f.write_str("quantize"),
            ScaleType::Quantile => f.write_str("quantile"),
        }
    }
}

impl FromStr for ScaleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quantize" => Ok(ScaleType::Quantize),
            "quantile" => Ok(ScaleType::Quantile),
            other => Err(format!("unknown scale type: {other:?}")),
        }
    }
}

/// Maps numbers onto palette colors.
///
/// Both quantize and quantile scales reduce to a sorted threshold list:
/// a value falls into bin `i` where `i` is the number of thresholds `<= value`.
/// Values below the first threshold land in bin 0, values above the last in
/// the last bin.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    /// Every input maps to the same color.
    Constant { color: RGB8 },
    /// Invariant: `colors.len() == thresholds.len() + 1`, thresholds ascending.
    Threshold {
        thresholds: Vec<f64>,
        colors: Vec<RGB8>,
    },
}

impl Scale {
    pub fn constant(color: RGB8) -> Self {
        Scale::Constant { color }
    }

    /// Builds a threshold scale, collapsing to one bin when `thresholds` is empty.
    pub fn threshold(thresholds: Vec<f64>, palette: &[RGB8]) -> Self {
        let bins = (thresholds.len() + 1).min(palette.len());
        Scale::Threshold {
            thresholds: thresholds.into_iter().take(bins.saturating_sub(1)).collect(),
            colors: palette[..bins].to_vec(),
        }
    }

    pub fn bin_count(&self) -> usize {
        match self {
            Scale::Constant { .. } => 1,
            Scale::Threshold { colors, .. } => colors.len(),
        }
    }

    /// Bin index of `value`. NaN falls into bin 0.
    pub fn bin(&self, value: f64) -> usize {
        match self {
            Scale::Constant { .. } => 0,
            Scale::Threshold { thresholds, .. } => {
                if value.is_nan() {
                    return 0;
                }
                thresholds.partition_point(|t| *t <= value)
            }
        }
    }

    pub fn color(&self, value: f64) -> RGB8 {
        match self {
            Scale::Constant { color } => *color,
            Scale::Threshold { colors, .. } => colors[self.bin(value).min(colors.len() - 1)],
        }
    }

    /// Color for a possibly missing value; missing values use the first color.
    pub fn color_for(&self, value: Option<f64>) -> RGB8 {
        match value {
            Some(v) => self.color(v),
            None => self.color(f64::NAN),
        }
    }

    pub fn thresholds(&self) -> &[f64] {
        match self {
            Scale::Constant { .. } => &[],
            Scale::Threshold { thresholds, .. } => thresholds,
        }
    }
}

/// Thresholds splitting `[lo, hi]` into `bins` equal-width intervals.
///
/// A degenerate domain (`lo == hi`) yields no thresholds: a single bin.
pub fn quantize_thresholds(lo: f64, hi: f64, bins: usize) -> Vec<f64> {
    if bins < 2 || approx_eq(lo, hi) || !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    let step = (hi - lo) / bins as f64;
    (1..bins).map(|i| lo + step * i as f64).collect()
}

/// Quantile thresholds of `sorted` (ascending, finite) for `bins` bins.
///
/// Uses linear interpolation between closest ranks (the R-7 method). A sample
/// with a single distinct value yields no thresholds.
pub fn quantile_thresholds(sorted: &[f64], bins: usize) -> Vec<f64> {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    if bins < 2 || approx_eq(*first, *last) {
        return Vec::new();
    }
    (1..bins)
        .map(|i| quantile_sorted(sorted, i as f64 / bins as f64))
        .collect()
}

/// R-7 quantile of an ascending, non-empty slice.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
