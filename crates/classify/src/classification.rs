use foundation::precision::sorted_finite;
use rgb::RGB8;
use tracing::debug;

use crate::breaks::break_labels;
use crate::palette::{PALETTE_LEN, Palette};
use crate::scale::{Scale, ScaleType, quantile_thresholds, quantize_thresholds};

/// Result of classifying one column.
///
/// `colors` and `breaks` are the legend: always the same length, one entry per
/// bin actually used by `scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub scale_type: ScaleType,
    pub palette: Palette,
    pub is_ratio: bool,
    pub domain: (f64, f64),
    pub scale: Scale,
    pub colors: Vec<RGB8>,
    pub breaks: Vec<String>,
    /// Number of usable (non-null, finite) values the scale was built from.
    pub sample_size: usize,
}

impl Classification {
    pub fn color_for(&self, value: Option<f64>) -> RGB8 {
        self.scale.color_for(value)
    }

    pub fn legend(&self) -> impl Iterator<Item = (RGB8, &str)> + '_ {
        self.colors
            .iter()
            .copied()
            .zip(self.breaks.iter().map(String::as_str))
    }
}

/// A column is a ratio when every usable value lies in `[0, 1]`.
///
/// Null, NaN and infinite entries are ignored; a column without usable values
/// is vacuously a ratio.
pub fn is_ratio(values: &[Option<f64>]) -> bool {
    values
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .all(|v| (0.0..=1.0).contains(v))
}

/// Builds the scale, legend colors and break labels for one column.
///
/// Deterministic in its inputs. Never fails: an empty or all-null column yields
/// a constant scale (everything maps to the palette's first color) with no
/// breaks, and a single distinct value collapses to one bin.
pub fn classify(values: &[Option<f64>], scale_type: ScaleType, palette: Palette) -> Classification {
    let sorted = sorted_finite(values.iter().flatten().copied());
    let ratio = is_ratio(values);

    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        debug!("no usable values, using a constant scale");
        return Classification {
            scale_type,
            palette,
            is_ratio: ratio,
            domain: (0.0, 1.0),
            scale: Scale::constant(palette.first()),
            colors: Vec::new(),
            breaks: Vec::new(),
            sample_size: 0,
        };
    };

    let domain = if ratio { (0.0, 1.0) } else { (min, max) };
    // A ratio column is binned over the fixed [0, 1] domain whatever the
    // scale type; quantiles of a uniform domain are its equal-width cuts.
    let thresholds = match scale_type {
        ScaleType::Quantile if !ratio => quantile_thresholds(&sorted, PALETTE_LEN),
        _ => quantize_thresholds(domain.0, domain.1, PALETTE_LEN),
    };
    let scale = Scale::threshold(thresholds, palette.colors());

    let edges: Vec<f64> = if scale.bin_count() == 1 {
        vec![min]
    } else {
        std::iter::once(domain.0)
            .chain(scale.thresholds().iter().copied())
            .chain(std::iter::once(domain.1))
            .collect()
    };
    let breaks = break_labels(&edges, ratio);
    let colors = palette.colors()[..scale.bin_count()].to_vec();

    debug!(
        "classified {} values: {scale_type}, ratio={ratio}, {} bins",
        sorted.len(),
        colors.len()
    );

    Classification {
        scale_type,
        palette,
        is_ratio: ratio,
        domain,
        scale,
        colors,
        breaks,
        sample_size: sorted.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, is_ratio};
    use crate::palette::Palette;
    use crate::scale::{Scale, ScaleType};
    use pretty_assertions::assert_eq;

    #[test]
    fn ratio_columns_use_unit_domain() {
        let values = vec![Some(0.1), Some(0.35), None, Some(0.4)];
        assert!(is_ratio(&values));
        for scale_type in [ScaleType::Quantize, ScaleType::Quantile] {
            let c = classify(&values, scale_type, Palette::Blues);
            assert!(c.is_ratio);
            assert_eq!(c.domain, (0.0, 1.0));
            assert!(c.breaks.iter().all(|b| b.contains('%')));
        }
    }

    #[test]
    fn ratio_quantize_thresholds_are_fixed() {
        let c = classify(&[Some(0.1), Some(0.2)], ScaleType::Quantize, Palette::Blues);
        assert_eq!(c.scale.thresholds().len(), 4);
        assert!((c.scale.thresholds()[0] - 0.2).abs() < 1e-12);
        assert_eq!(c.breaks[0], "0% - 20%");
    }

    #[test]
    fn ratio_quantile_ignores_data_spread() {
        let values: Vec<Option<f64>> = [0.10, 0.12, 0.14, 0.16, 0.18].map(Some).to_vec();
        let c = classify(&values, ScaleType::Quantile, Palette::Blues);
        assert!(c.is_ratio);
        let thresholds = c.scale.thresholds();
        assert_eq!(thresholds.len(), 4);
        for (t, want) in thresholds.iter().zip([0.2, 0.4, 0.6, 0.8]) {
            assert!((t - want).abs() < 1e-12, "{thresholds:?}");
        }
        assert_eq!(c.breaks.first().map(String::as_str), Some("0% - 20%"));
        assert_eq!(c.breaks.last().map(String::as_str), Some("80% - 100%"));
        assert_eq!(c.scale.bin(0.18), 0);
        assert_eq!(c.scale.bin(0.5), 2);
        assert_eq!(c.scale.bin(0.9), 4);
    }

    #[test]
    fn empty_and_all_null_are_constant() {
        for values in [vec![], vec![None, None], vec![Some(f64::NAN)]] {
            let c = classify(&values, ScaleType::Quantile, Palette::Greens);
            assert!(c.breaks.is_empty());
            assert!(c.colors.is_empty());
            assert_eq!(c.scale, Scale::constant(Palette::Greens.first()));
            assert_eq!(c.color_for(Some(1e6)), Palette::Greens.first());
            assert_eq!(c.color_for(None), Palette::Greens.first());
        }
    }

    #[test]
    fn single_value_collapses_to_one_bin() {
        for scale_type in [ScaleType::Quantize, ScaleType::Quantile] {
            let c = classify(&[Some(42.0), Some(42.0)], scale_type, Palette::Reds);
            assert_eq!(c.colors.len(), 1);
            assert_eq!(c.breaks, vec!["42".to_string()]);
            assert_eq!(c.color_for(Some(42.0)), Palette::Reds.first());
        }
    }

    #[test]
    fn quantize_orders_population() {
        // 94102 -> 100, 94103 -> 200
        let c = classify(&[Some(100.0), Some(200.0)], ScaleType::Quantize, Palette::Blues);
        assert!(!c.is_ratio);
        assert_eq!(c.domain, (100.0, 200.0));
        assert!(c.scale.bin(100.0) <= c.scale.bin(200.0));
        assert_eq!(c.scale.bin(100.0), 0);
        assert_eq!(c.scale.bin(200.0), 4);
        assert_eq!(c.colors.len(), c.breaks.len());
        assert_eq!(c.breaks.len(), 5);
        assert_eq!(c.breaks[0], "100 - 120");
    }

    #[test]
    fn quantile_balances_population() {
        let values: Vec<Option<f64>> = (1..=100).map(|v| Some(v as f64 * 10.0)).collect();
        let c = classify(&values, ScaleType::Quantile, Palette::YlOrRd);
        let mut counts = [0usize; 5];
        for v in values.iter().flatten() {
            counts[c.scale.bin(*v)] += 1;
        }
        for n in counts {
            assert!((19..=21).contains(&n), "{counts:?}");
        }
    }

    #[test]
    fn classification_is_deterministic_under_reordering() {
        let a = vec![Some(5.0), Some(1.0), None, Some(3.0), Some(-2.0)];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(
            classify(&a, ScaleType::Quantile, Palette::RdPu),
            classify(&b, ScaleType::Quantile, Palette::RdPu)
        );
    }
}
