use chrono::{DateTime, Local};

/// Binary (1024-based) size suffixes, smallest first.
pub const SIZE_SUFFIXES: [&str; 9] = ["bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Human-readable byte count with one decimal, e.g. `"15.4GB"`.
///
/// The suffix index is `floor(log_1024(|value|))`. Negative values get a
/// leading `-` and zero is `"0.0 bytes"`.
pub fn size_suffix(value: i64) -> String {
    if value < 0 {
        return format!("-{}", unsigned_size_suffix(value.unsigned_abs()));
    }
    unsigned_size_suffix(value as u64)
}

fn unsigned_size_suffix(value: u64) -> String {
    if value == 0 {
        return "0.0 bytes".to_string();
    }

    let magnitude = (((63 - value.leading_zeros()) / 10) as usize).min(SIZE_SUFFIXES.len() - 1);
    let adjusted = value as f64 / (1u64 << (magnitude * 10)) as f64;

    format!("{:.1}{}", adjusted, SIZE_SUFFIXES[magnitude])
}

/// Same as [`size_suffix`] for unsigned counters. Values beyond `i64::MAX`
/// are still formatted exactly.
pub fn size_suffix_u64(value: u64) -> String {
    unsigned_size_suffix(value)
}

/// Format a snapshot timestamp (HH:MM:SS)
pub fn format_clock(time: &DateTime<Local>) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Minutes as `"1h 32m"` / `"45m"`.
pub fn format_minutes(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    let (h, m) = (total / 60, total % 60);
    if h > 0 {
        format!("{}h {}m", h, m)
    } else {
        format!("{}m", m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(size_suffix(0), "0.0 bytes");
    }

    #[test]
    fn test_magnitudes() {
        assert_eq!(size_suffix(1), "1.0bytes");
        assert_eq!(size_suffix(1023), "1023.0bytes");
        assert_eq!(size_suffix(1024), "1.0KB");
        assert_eq!(size_suffix(1536), "1.5KB");
        assert_eq!(size_suffix(1024 * 1024), "1.0MB");
        assert_eq!(size_suffix(16 * 1024 * 1024 * 1024), "16.0GB");
        assert_eq!(size_suffix(1 << 40), "1.0TB");
        assert_eq!(size_suffix(1 << 50), "1.0PB");
        assert_eq!(size_suffix(1 << 60), "1.0EB");
        assert_eq!(size_suffix(i64::MAX), "8.0EB");
    }

    #[test]
    fn test_negative_values_mirror_positive() {
        for v in [1i64, 1023, 1024, 5_000_000, 1 << 45] {
            assert_eq!(size_suffix(-v), format!("-{}", size_suffix(v)));
        }
        assert_eq!(size_suffix(i64::MIN), "-8.0EB");
    }

    #[test]
    fn test_unsigned_beyond_i64() {
        assert_eq!(size_suffix_u64(u64::MAX), "16.0EB");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45.2), "45m");
        assert_eq!(format_minutes(92.0), "1h 32m");
        assert_eq!(format_minutes(-3.0), "0m");
    }
}
