//! Small numeric helpers shared by progress reporting and metrics.

/// Round `value` to the nearest multiple of `base`, halves away from zero.
pub fn round_to_multiple(value: f64, base: u32) -> i64 {
    let base = f64::from(base.max(1));
    ((value / base).round() * base) as i64
}

/// Percentage of `part` in `whole`; zero when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_multiple_of_five() {
        assert_eq!(round_to_multiple(0.0, 5), 0);
        assert_eq!(round_to_multiple(2.4, 5), 0);
        assert_eq!(round_to_multiple(2.5, 5), 5);
        assert_eq!(round_to_multiple(7.4, 5), 5);
        assert_eq!(round_to_multiple(97.6, 5), 100);
        assert_eq!(round_to_multiple(100.0, 5), 100);
    }

    #[test]
    fn other_bases_are_honored() {
        assert_eq!(round_to_multiple(14.0, 10), 10);
        assert_eq!(round_to_multiple(15.0, 10), 20);
        assert_eq!(round_to_multiple(33.3, 1), 33);
    }

    #[test]
    fn percent_of_guards_empty_whole() {
        assert_eq!(percent_of(5.0, 0.0), 0.0);
        assert!((percent_of(1.0, 4.0) - 25.0).abs() < 1e-12);
    }
}
