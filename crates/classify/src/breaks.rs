/// Formats a domain value for a legend label.
///
/// Ratios render as percentages; other values use compact SI-like suffixes.
pub fn format_value(value: f64, ratio: bool) -> String {
    if ratio {
        return format!("{}%", trim_decimals(value * 100.0, 1));
    }

    let abs = value.abs();
    if abs >= 1e9 {
        format!("{}B", trim_decimals(value / 1e9, 1))
    } else if abs >= 1e6 {
        format!("{}M", trim_decimals(value / 1e6, 1))
    } else if abs >= 1e4 {
        format!("{}k", trim_decimals(value / 1e3, 1))
    } else {
        trim_decimals(value, 2)
    }
}

fn trim_decimals(value: f64, decimals: usize) -> String {
    let s = format!("{value:.decimals$}");
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    };
    if s == "-0" { "0".to_string() } else { s }
}

/// Labels one legend entry per bin from the bin edges.
///
/// `edges` holds `bins + 1` ascending values (domain start, thresholds,
/// domain end). A single-bin scale gets one label naming its value.
pub fn break_labels(edges: &[f64], ratio: bool) -> Vec<String> {
    match edges {
        [] => Vec::new(),
        [only] => vec![format_value(*only, ratio)],
        [lo, hi] if lo == hi => vec![format_value(*lo, ratio)],
        _ => edges
            .windows(2)
            .map(|w| {
                format!(
                    "{} - {}",
                    format_value(w[0], ratio),
                    format_value(w[1], ratio)
                )
            })
            .collect(),
    }
}
