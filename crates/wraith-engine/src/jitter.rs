//! Jitter — slight randomization of a sleep or cycle time, so that a fleet
//! of clients replaying the same timeline doesn't act in lockstep.

use rand::Rng;

/// Parse a `delay-jitter` option into a jitter factor percentage.
///
/// Accepts a decimal integer string; anything malformed or outside
/// [0, 100] means no jitter (0).
pub fn factor_parse(spec: &str) -> i64 {
    match spec.trim().parse::<i64>() {
        Ok(factor) if (0..=100).contains(&factor) => factor,
        _ => 0,
    }
}

/// Randomize `base_ms` uniformly within a ±`factor`% window, floored at 0.
///
/// Factor 0 returns the base unchanged. Deterministic for a seeded RNG.
pub fn apply(base_ms: i64, factor: i64, rng: &mut impl Rng) -> i64 {
    if base_ms <= 0 {
        return 0;
    }
    if factor <= 0 {
        return base_ms;
    }
    let window = base_ms * factor / 100;
    if window == 0 {
        return base_ms;
    }
    rng.gen_range(base_ms - window..=base_ms + window).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parse_accepts_whole_percentages() {
        assert_eq!(factor_parse("0"), 0);
        assert_eq!(factor_parse("33"), 33);
        assert_eq!(factor_parse(" 100 "), 100);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(factor_parse(""), 0);
        assert_eq!(factor_parse("twenty"), 0);
        assert_eq!(factor_parse("-5"), 0);
        assert_eq!(factor_parse("101"), 0);
        assert_eq!(factor_parse("12.5"), 0);
    }

    #[test]
    fn zero_factor_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(apply(1000, 0, &mut rng), 1000);
        }
    }

    #[test]
    fn stays_within_the_window() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let ms = apply(1000, 20, &mut rng);
            assert!((800..=1200).contains(&ms), "jittered to {ms}");
        }
    }

    #[test]
    fn never_negative() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            assert!(apply(10, 100, &mut rng) >= 0);
        }
        assert_eq!(apply(-500, 20, &mut rng), 0);
        assert_eq!(apply(0, 20, &mut rng), 0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(apply(5000, 35, &mut a), apply(5000, 35, &mut b));
        }
    }
}
