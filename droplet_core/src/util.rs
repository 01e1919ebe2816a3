//! Common time helpers for droplet_core.

use std::time::Duration;

/// Seconds → `Duration`, saturating instead of panicking.
///
/// Negative and NaN map to zero; values beyond `Duration::MAX` map to it.
#[inline]
pub fn saturating_secs(s: f64) -> Duration {
    if s.is_nan() || s <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(s).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturates_at_both_ends() {
        assert_eq!(saturating_secs(-1.0), Duration::ZERO);
        assert_eq!(saturating_secs(f64::NAN), Duration::ZERO);
        assert_eq!(saturating_secs(f64::INFINITY), Duration::MAX);
        assert_eq!(saturating_secs(1.5), Duration::from_millis(1500));
    }
}
