use g14mon::ui::formatters::{size_suffix, size_suffix_u64, SIZE_SUFFIXES};

#[test]
fn test_suffix_index_is_floor_log_1024() {
    for (k, suffix) in SIZE_SUFFIXES.iter().enumerate().take(7) {
        let low = 1u64 << (10 * k);
        assert_eq!(size_suffix_u64(low), format!("1.0{}", suffix));

        if k > 0 {
            let below = low - 1;
            let formatted = size_suffix_u64(below);
            assert!(
                formatted.ends_with(SIZE_SUFFIXES[k - 1]),
                "{} formatted as {}",
                below,
                formatted
            );
        }
    }
}

#[test]
fn test_sign_only_adds_a_prefix() {
    let mut v: i64 = 1;
    while v < i64::MAX / 7 {
        assert_eq!(size_suffix(-v), format!("-{}", size_suffix(v)));
        assert_eq!(size_suffix(v), size_suffix_u64(v as u64));
        v = v * 7 + 3;
    }
}

#[test]
fn test_memory_sized_values() {
    assert_eq!(size_suffix_u64(16_600_000_000), "15.5GB");
    assert_eq!(size_suffix_u64(6_442_450_944), "6.0GB");
}
