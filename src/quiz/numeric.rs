//! Numeric primitives for question synthesis
//!
//! Pure functions over integers plus an injected RNG; no state.

use rand::Rng;

use crate::consts::MAX_OPERAND_DIGITS;

/// Count of decimal digits in |n| (0 counts as one digit)
pub fn digit_len(n: i64) -> u32 {
    let mut m = n.unsigned_abs();
    let mut len = 1;
    while m >= 10 {
        m /= 10;
        len += 1;
    }
    len
}

/// Sum of the decimal digits of |n|
pub fn digit_sum(n: i64) -> u32 {
    let mut m = n.unsigned_abs();
    let mut sum = 0;
    while m > 0 {
        sum += (m % 10) as u32;
        m /= 10;
    }
    sum
}

/// Digit sum modulo 9, the "casting out nines" checksum
pub fn digit_sum_mod_9(n: i64) -> u32 {
    digit_sum(n) % 9
}

/// Units digit of |n|
pub fn units_digit(n: i64) -> u32 {
    (n.unsigned_abs() % 10) as u32
}

/// Uniform random integer with exactly `digits` decimal digits, i.e. in
/// `[10^(digits-1), 10^digits - 1]`. A budget of zero yields 1. Budgets are
/// capped at [`MAX_OPERAND_DIGITS`] to keep downstream arithmetic inside i64.
pub fn random_with_digit_len<R: Rng>(rng: &mut R, digits: u32) -> i64 {
    if digits == 0 {
        return 1;
    }
    let digits = digits.min(MAX_OPERAND_DIGITS);
    let lo = 10i64.pow(digits - 1);
    let hi = 10i64.pow(digits) - 1;
    rng.random_range(lo..=hi)
}

/// Split `total` digits across `operands` values: every operand gets at
/// least one digit and the parts sum to the total exactly. The first n−1
/// shares are randomized within what leaves enough for the rest; the last
/// operand absorbs the remainder. A total below the operand count is raised
/// to it.
pub fn distribute_digits<R: Rng>(rng: &mut R, total: u32, operands: u32) -> Vec<u32> {
    debug_assert!(operands > 0);
    let mut remaining = total.max(operands);
    let mut out = Vec::with_capacity(operands as usize);
    for i in 0..operands.saturating_sub(1) {
        let still_to_place = operands - i - 1;
        let max_here = remaining - still_to_place;
        let share = rng.random_range(1..=max_here);
        out.push(share);
        remaining -= share;
    }
    out.push(remaining);
    out
}

/// Weighted pick over an ordered `(item, weight)` slice.
///
/// Weights at or below zero are never selected. Returns `None` when the
/// total weight is zero (empty slice included); the caller supplies the
/// documented default in that case.
pub fn weighted_choice<'a, T, R: Rng>(rng: &mut R, items: &'a [(T, f64)]) -> Option<&'a T> {
    let total: f64 = items.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut target = rng.random_range(0.0..total);
    for (item, weight) in items {
        if *weight <= 0.0 {
            continue;
        }
        target -= weight;
        if target <= 0.0 {
            return Some(item);
        }
    }
    // float roundoff: settle on the last selectable entry
    items.iter().rev().find(|(_, w)| *w > 0.0).map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_digit_len() {
        assert_eq!(digit_len(0), 1);
        assert_eq!(digit_len(7), 1);
        assert_eq!(digit_len(-7), 1);
        assert_eq!(digit_len(10), 2);
        assert_eq!(digit_len(999), 3);
        assert_eq!(digit_len(-1000), 4);
        assert_eq!(digit_len(i64::MIN), 19);
    }

    #[test]
    fn test_digit_sum() {
        assert_eq!(digit_sum(0), 0);
        assert_eq!(digit_sum(999), 27);
        assert_eq!(digit_sum(-123), 6);
    }

    #[test]
    fn test_digit_sum_mod_9() {
        assert_eq!(digit_sum_mod_9(18), 0);
        assert_eq!(digit_sum_mod_9(19), 1);
        assert_eq!(digit_sum_mod_9(999_999_999), 0);
        assert_eq!(digit_sum_mod_9(-47), 2);
    }

    #[test]
    fn test_units_digit() {
        assert_eq!(units_digit(0), 0);
        assert_eq!(units_digit(123), 3);
        assert_eq!(units_digit(-123), 3);
    }

    #[test]
    fn test_random_with_zero_digits_is_one() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(random_with_digit_len(&mut rng, 0), 1);
    }

    #[test]
    fn test_weighted_choice_empty_and_zero() {
        let mut rng = Pcg32::seed_from_u64(2);
        let empty: Vec<(char, f64)> = vec![];
        assert_eq!(weighted_choice(&mut rng, &empty), None);
        let zeros = vec![('a', 0.0), ('b', -3.0)];
        assert_eq!(weighted_choice(&mut rng, &zeros), None);
    }

    #[test]
    fn test_weighted_choice_skips_nonpositive() {
        let mut rng = Pcg32::seed_from_u64(3);
        let items = vec![('a', 0.0), ('b', 1.0), ('c', -1.0)];
        for _ in 0..50 {
            assert_eq!(weighted_choice(&mut rng, &items), Some(&'b'));
        }
    }

    #[test]
    fn test_weighted_choice_roughly_proportional() {
        let mut rng = Pcg32::seed_from_u64(4);
        let items = vec![('a', 75.0), ('b', 25.0)];
        let mut hits_a = 0;
        for _ in 0..1000 {
            if weighted_choice(&mut rng, &items) == Some(&'a') {
                hits_a += 1;
            }
        }
        assert!((650..850).contains(&hits_a), "got {hits_a} of 1000");
    }

    proptest! {
        #[test]
        fn prop_random_with_digit_len_in_bounds(digits in 1u32..=9, seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let value = random_with_digit_len(&mut rng, digits);
            prop_assert_eq!(digit_len(value), digits);
        }

        #[test]
        fn prop_distribute_digits_exact(total in 1u32..=30, operands in 1u32..=3, seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let parts = distribute_digits(&mut rng, total, operands);
            prop_assert_eq!(parts.len(), operands as usize);
            prop_assert!(parts.iter().all(|&d| d >= 1));
            prop_assert_eq!(parts.iter().sum::<u32>(), total.max(operands));
        }
    }
}
