//! Walk energy conversion.
//!
//! Energy is a notional figure: walking distance multiplied by a flat
//! factor. There is no physical model behind it.

/// Watt-hours credited per kilometer walked.
pub const WH_PER_KM: f64 = 50.0;

/// Longest distance one walk may record, in kilometers.
pub const MAX_WALK_KM: f64 = 1_000.0;

/// Energy in watt-hours credited for `distance_km` kilometers.
///
/// Negative or non-finite distances yield `0.0` so that stored energy is
/// never negative. Distances above [`MAX_WALK_KM`] are credited as
/// `MAX_WALK_KM`, so the result is always finite.
#[must_use]
pub fn energy_for_distance(distance_km: f64) -> f64 {
    if distance_km.is_finite() && distance_km > 0.0 {
        distance_km.min(MAX_WALK_KM) * WH_PER_KM
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_for_distance() {
        assert!((energy_for_distance(45.3) - 2265.0).abs() < 1e-9);
        assert!((energy_for_distance(38.7) - 1935.0).abs() < 1e-9);
    }

    #[test]
    fn test_energy_never_negative() {
        assert!(energy_for_distance(-1.0).abs() < f64::EPSILON);
        assert!(energy_for_distance(f64::NAN).abs() < f64::EPSILON);
        assert!(energy_for_distance(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_energy_saturates_at_max_walk() {
        let max = MAX_WALK_KM * WH_PER_KM;
        assert!((energy_for_distance(1e307) - max).abs() < f64::EPSILON);
        assert!((energy_for_distance(f64::MAX) - max).abs() < f64::EPSILON);
        assert!(energy_for_distance(f64::MAX).is_finite());
    }
}
