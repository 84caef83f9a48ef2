//! Display helpers for numbers shown on the roster view.

/// `1.2K`, `3.4M`, `5.6B` above a thousand; plain fixed-point below.
pub fn compact_number(value: f64, decimals: usize) -> String {
    const SCALES: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

    if !value.is_finite() {
        return "-".to_string();
    }
    for (scale, suffix) in SCALES {
        if value >= scale {
            return format!("{:.1}{}", value / scale, suffix);
        }
    }
    format!("{:.*}", decimals, value)
}

/// Signed percent with two decimals, e.g. `+0.45%`.
pub fn signed_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_suffixes() {
        assert_eq!(compact_number(1_234.0, 2), "1.2K");
        assert_eq!(compact_number(3_400_000.0, 2), "3.4M");
        assert_eq!(compact_number(5_600_000_000.0, 2), "5.6B");
        assert_eq!(compact_number(1_000.0, 2), "1.0K");
    }

    #[test]
    fn test_compact_small_values_keep_decimals() {
        assert_eq!(compact_number(1.09265, 5), "1.09265");
        assert_eq!(compact_number(999.994, 2), "999.99");
        assert_eq!(compact_number(-2_500.0, 2), "-2500.00");
        assert_eq!(compact_number(f64::NAN, 2), "-");
    }

    #[test]
    fn test_signed_percent() {
        assert_eq!(signed_percent(0.4545), "+0.45%");
        assert_eq!(signed_percent(0.0), "+0.00%");
        assert_eq!(signed_percent(-1.5), "-1.50%");
    }
}
