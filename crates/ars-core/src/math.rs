//! Integer-only protocol arithmetic.
//!
//! Every validating party re-executes these computations, so all of them
//! must be exact: no floating point anywhere, ratios expressed in basis
//! points, rounding rules fixed (floor for square roots, round-half-to-even
//! for even-count medians).

use crate::constants::BPS_DENOMINATOR;

/// Floor of the integer square root, by Newton iteration.
///
/// Quadratic voting power for a stake `s` is `isqrt(s)`.
pub fn isqrt(value: u128) -> u64 {
    if value < 2 {
        return value as u64;
    }

    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x as u64
}

/// Arithmetic median of a value set.
///
/// Odd counts take the middle element after sorting. Even counts take the
/// mean of the two middle values, rounded toward the nearer integer with
/// ties broken toward even (banker's rounding), so every implementation
/// lands on the same integer. Returns `None` for an empty set.
pub fn median(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        return Some(sorted[mid]);
    }

    let low = sorted[mid - 1] as u128;
    let high = sorted[mid] as u128;
    let sum = low + high;
    let half = (sum / 2) as u64;
    if sum % 2 == 0 {
        Some(half)
    } else {
        // Exact .5 remainder: round to the even neighbour.
        if half % 2 == 0 {
            Some(half)
        } else {
            Some(half + 1)
        }
    }
}

/// `value * bps / 10000`, computed in u128 and saturated back to u64.
pub fn apply_bps(value: u64, bps: u32) -> u64 {
    let scaled = value as u128 * bps as u128 / BPS_DENOMINATOR as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// The ratio `numerator / denominator` in basis points, floored.
///
/// A zero denominator saturates to `u64::MAX` bps: a vault with no
/// published liability is unconditionally solvent.
pub fn ratio_bps(numerator: u128, denominator: u128) -> u64 {
    if denominator == 0 {
        return u64::MAX;
    }
    let bps = numerator * BPS_DENOMINATOR as u128 / denominator;
    u64::try_from(bps).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt_small_values() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(99), 9);
        assert_eq!(isqrt(100), 10);
    }

    #[test]
    fn test_isqrt_voting_power_example() {
        // 1,000,000,000 stake -> power 31622 (floor of 31622.77...)
        assert_eq!(isqrt(1_000_000_000), 31_622);
        assert_eq!(isqrt(500_000_000), 22_360);
    }

    #[test]
    fn test_median_odd_count() {
        assert_eq!(median(&[5000, 5100, 4900]), Some(5000));
        assert_eq!(median(&[7]), Some(7));
        assert_eq!(median(&[1, 100, 2, 99, 50]), Some(50));
    }

    #[test]
    fn test_median_even_count_exact_mean() {
        assert_eq!(median(&[10, 20]), Some(15));
    }

    #[test]
    fn test_median_even_count_bankers_rounding() {
        // (10 + 15) / 2 = 12.5 -> 12 (nearest even)
        assert_eq!(median(&[10, 15]), Some(12));
        // (11 + 16) / 2 = 13.5 -> 14 (nearest even)
        assert_eq!(median(&[11, 16]), Some(14));
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_apply_bps() {
        // 2% of 1,000,000
        assert_eq!(apply_bps(1_000_000, 200), 20_000);
        assert_eq!(apply_bps(0, 200), 0);
        assert_eq!(apply_bps(u64::MAX, 10_000), u64::MAX);
    }

    #[test]
    fn test_ratio_bps() {
        // 150% collateralization
        assert_eq!(ratio_bps(1_500_000, 1_000_000), 15_000);
        assert_eq!(ratio_bps(999, 1_000), 9_990);
        assert_eq!(ratio_bps(1, 0), u64::MAX);
    }
}
