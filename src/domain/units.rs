// Human readable formatting of measured values

const SI_UP: [&str; 9] = ["", "k", "M", "G", "T", "P", "E", "Z", "Y"];
const SI_DOWN: [&str; 8] = ["m", "μ", "n", "p", "f", "a", "z", "y"];

const TIME_UNITS: [(&str, f64); 5] = [
    ("y", 31_536_000.0),
    ("d", 86_400.0),
    ("h", 3_600.0),
    ("m", 60.0),
    ("s", 1.0),
];

/// Scale `value` by powers of 1000 and append the matching SI prefix and `suffix`.
///
/// `format_scaled(98654.0, "B", 3)` gives `"98.7kB"`. The number of decimals
/// targets `significant_digits`, but integer digits are never dropped.
pub fn format_scaled(value: f64, suffix: &str, significant_digits: u32) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}{}", value, suffix);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let mut n = value.abs();
    // positive steps index SI_UP, negative steps index SI_DOWN
    let mut step: i32 = 0;

    while n > 1000.0 && (step + 1) < SI_UP.len() as i32 {
        n /= 1000.0;
        step += 1;
    }
    while n < 1.0 && -step < SI_DOWN.len() as i32 {
        n *= 1000.0;
        step -= 1;
    }

    let mut digits = decimals_for(n, significant_digits);
    // rounding can push the mantissa to 1000, e.g. 999999 -> "1000k"
    while round_to(n, digits) >= 1000.0 && (step + 1) < SI_UP.len() as i32 {
        n /= 1000.0;
        step += 1;
        digits = decimals_for(n, significant_digits);
    }

    let prefix = if step < 0 {
        SI_DOWN[(-step - 1) as usize]
    } else {
        SI_UP[step as usize]
    };

    format!("{}{:.*}{}{}", sign, digits, n, prefix, suffix)
}

fn decimals_for(n: f64, significant_digits: u32) -> usize {
    let sig = significant_digits as i32;
    let digits = if n >= 100.0 {
        0.min(sig - 3)
    } else if n >= 10.0 {
        1.min(sig - 2)
    } else {
        2.min(sig - 1)
    };
    digits.max(0) as usize
}

fn round_to(n: f64, digits: usize) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (n * factor).round() / factor
}

/// Render a number of seconds as its two largest non-zero time units.
///
/// `format_duration(100.0)` gives `"1m 40s"`; lower units beyond the second
/// emitted one are truncated, not rounded.
pub fn format_duration(seconds: f64) -> String {
    let mut remaining = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let mut parts = Vec::with_capacity(2);

    for (unit, size) in TIME_UNITS {
        if parts.len() == 2 {
            break;
        }
        if remaining >= size {
            let count = (remaining / size).floor();
            parts.push(format!("{}{}", count as u64, unit));
            remaining -= count * size;
        }
    }

    if parts.is_empty() {
        return "0s".to_string();
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_scaled_bytes() {
        assert_eq!(format_scaled(98654.0, "B", 3), "98.7kB");
        assert_eq!(format_scaled(250.0, "B", 3), "250B");
        assert_eq!(format_scaled(1000.0, "B", 3), "1.00kB");
        assert_eq!(format_scaled(1_500_000.0, "B", 3), "1.50MB");
    }

    #[test]
    fn test_format_scaled_zero() {
        assert_eq!(format_scaled(0.0, "B", 3), "0B");
    }

    #[test]
    fn test_format_scaled_rounds_into_next_prefix() {
        assert_eq!(format_scaled(999_999.0, "", 3), "1.00M");
        assert_eq!(format_scaled(0.99999, "s", 3), "1.00s");
    }

    #[test]
    fn test_format_scaled_small_values() {
        assert_eq!(format_scaled(0.5, "s", 3), "500ms");
        assert_eq!(format_scaled(0.0042, "s", 3), "4.20ms");
        assert_eq!(format_scaled(0.000_001_5, "s", 3), "1.50μs");
    }

    #[test]
    fn test_format_scaled_significance() {
        assert_eq!(format_scaled(42.37, "%", 0), "42%");
        assert_eq!(format_scaled(45.3, "°C", 1), "45°C");
        assert_eq!(format_scaled(4.56, "°C", 2), "4.6°C");
    }

    #[test]
    fn test_format_scaled_stops_at_largest_prefix() {
        assert_eq!(format_scaled(5e27, "B", 3), "5000YB");
        assert_eq!(format_scaled(-250.0, "B", 3), "-250B");
    }

    #[test]
    fn test_format_scaled_mantissa_range() {
        for value in [1.0, 7.0, 12.5, 999.0, 1001.0, 65_536.0, 3.2e9, 7.7e14] {
            let formatted = format_scaled(value, "", 3);
            let mantissa: f64 = formatted
                .trim_end_matches(|c: char| c.is_alphabetic())
                .parse()
                .unwrap();
            assert!((1.0..=1000.0).contains(&mantissa), "{} -> {}", value, formatted);
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(100.0), "1m 40s");
        assert_eq!(format_duration(90061.0), "1d 1h");
        assert_eq!(format_duration(60.0), "1m");
        assert_eq!(format_duration(45.9), "45s");
        assert_eq!(format_duration(31_536_000.0 + 5.0), "1y 5s");
        assert_eq!(format_duration(0.0), "0s");
    }
}
