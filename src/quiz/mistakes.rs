//! Strategic wrong-answer synthesis
//!
//! Each skill gets a wrong value that is diagnostic of exactly that skill:
//! wrong along the one dimension the skill's mental check inspects, correct
//! along every other. A lastDigit error must be visible in the units digit
//! and nowhere a magnitude estimate would catch it; a castingOutNines error
//! must keep the units digit intact so only the nines checksum exposes it.
//!
//! Every search is bounded and ends in a deterministic fallback, so a wrong
//! answer is always produced. The fallbacks may relax a guarantee slightly
//! (logged as warnings); the systematic paths hold their contracts exactly.

use rand::Rng;

use super::numeric::{digit_len, digit_sum_mod_9, units_digit};
use crate::consts::SEARCH_ATTEMPTS;
use crate::levels::Skill;

/// Produce a wrong value for `correct` whose deviation targets `skill`.
/// When negatives are disallowed the result is clamped to its absolute
/// value after the search; the searches skip negative candidates in that
/// case so the clamp can never collapse the wrong answer onto the right one.
pub fn inject_error<R: Rng>(
    rng: &mut R,
    correct: i64,
    skill: Skill,
    allow_negative: bool,
) -> i64 {
    let wrong = match skill {
        Skill::LastDigit => last_digit_error(rng, correct, allow_negative),
        Skill::Estimate => estimate_error(rng, correct),
        Skill::Parity => parity_error(correct),
        Skill::CarryBorrow => carry_borrow_error(rng, correct, allow_negative),
        Skill::SpecialDigits => special_digits_error(rng, correct, allow_negative),
        Skill::CastingOutNines => casting_out_nines_error(rng, correct, allow_negative),
    };
    if allow_negative { wrong } else { wrong.abs() }
}

/// Off by 1..5 with a changed units digit. The shift is small enough that
/// estimation, parity-in-aggregate and checksum habits all stay silent.
fn last_digit_error<R: Rng>(rng: &mut R, correct: i64, allow_negative: bool) -> i64 {
    for _ in 0..SEARCH_ATTEMPTS {
        let magnitude = rng.random_range(1i64..=5);
        let delta = if rng.random_bool(0.5) { magnitude } else { -magnitude };
        let mut wrong = correct + delta;
        if !allow_negative {
            wrong = wrong.abs();
        }
        if wrong != correct && units_digit(wrong) != units_digit(correct) {
            return wrong;
        }
    }
    // +1 always lands inside the contract
    correct + 1
}

/// An order-of-magnitude slip: the digit count changes, or the leading
/// digit does while everything below the top stays plausible. The units
/// digit survives so a last-digit check cannot catch it.
fn estimate_error<R: Rng>(rng: &mut R, correct: i64) -> i64 {
    let sign: i64 = if correct < 0 { -1 } else { 1 };
    let m = correct.abs();
    if m == 0 {
        return rng.random_range(1i64..=9) * 10;
    }
    let len = digit_len(m);

    if len > 1 && rng.random_bool(0.5) {
        // ±1 on the highest place value
        let place = 10i64.pow(len - 1);
        let wrong = if rng.random_bool(0.5) { m + place } else { m - place };
        return sign * wrong;
    }

    // insert or delete one interior digit, then restore the units digit;
    // the leading position is never touched
    let mut digits: Vec<u8> = m.to_string().bytes().map(|b| b - b'0').collect();
    let original_units = (m % 10) as u8;
    if len > 1 && rng.random_bool(0.5) {
        let idx = rng.random_range(1..digits.len());
        digits.remove(idx);
    } else {
        let idx = rng.random_range(1..=digits.len());
        digits.insert(idx, rng.random_range(0u32..=9) as u8);
    }
    if let Some(last) = digits.last_mut() {
        *last = original_units;
    }
    let wrong = digits.iter().fold(0i64, |acc, &d| acc * 10 + d as i64);
    sign * wrong
}

/// Exactly ±1, flipping even/odd. Deterministic.
fn parity_error(correct: i64) -> i64 {
    if correct % 2 == 0 { correct + 1 } else { correct - 1 }
}

/// A mis-carried ten: ±10 or ±20 with the units digit untouched. The sign
/// is restricted to + when subtracting would cross below zero under the
/// non-negative clamp, keeping the magnitude guarantee exact.
fn carry_borrow_error<R: Rng>(rng: &mut R, correct: i64, allow_negative: bool) -> i64 {
    let magnitude = if rng.random_bool(0.5) { 10 } else { 20 };
    let may_subtract = allow_negative || correct - magnitude >= 0;
    if may_subtract && rng.random_bool(0.5) {
        correct - magnitude
    } else {
        correct + magnitude
    }
}

/// Offset candidate shared by the divisibility searches: random sign,
/// skipping no-ops and (when negatives are clamped) negative values.
fn offset_candidate<R: Rng>(
    rng: &mut R,
    correct: i64,
    step: i64,
    allow_negative: bool,
) -> Option<i64> {
    let wrong = if rng.random_bool(0.5) { correct + step } else { correct - step };
    (wrong != correct && (allow_negative || wrong >= 0)).then_some(wrong)
}

fn divisibility_class_differs(a: i64, b: i64) -> bool {
    ((a % 3 == 0) != (b % 3 == 0)) || ((a % 9 == 0) != (b % 9 == 0))
}

/// Same units digit, different divisibility-by-3/9 class. Tries tens,
/// hundreds and thousands offsets, then large random offsets, before a
/// fixed +100 that gives up the class-change re-check.
fn special_digits_error<R: Rng>(rng: &mut R, correct: i64, allow_negative: bool) -> i64 {
    for &magnitude in &[10i64, 100, 1000] {
        for _ in 0..SEARCH_ATTEMPTS {
            let step = magnitude * rng.random_range(1i64..=9);
            if let Some(wrong) = offset_candidate(rng, correct, step, allow_negative) {
                if units_digit(wrong) == units_digit(correct)
                    && divisibility_class_differs(correct, wrong)
                {
                    return wrong;
                }
            }
        }
    }
    for _ in 0..SEARCH_ATTEMPTS {
        let step = 10 * rng.random_range(500i64..=1000);
        if let Some(wrong) = offset_candidate(rng, correct, step, allow_negative) {
            if units_digit(wrong) == units_digit(correct)
                && divisibility_class_differs(correct, wrong)
            {
                return wrong;
            }
        }
    }
    log::warn!("specialDigits search exhausted for {correct}, using the fixed offset");
    if allow_negative && rng.random_bool(0.5) {
        correct - 100
    } else {
        correct + 100
    }
}

/// Same units digit, different digit-sum-mod-9. Tries tens then hundreds
/// perturbations; the units-preserving multiples of nine keep the checksum
/// intact and are only a last resort before the forced units rewrite.
fn casting_out_nines_error<R: Rng>(rng: &mut R, correct: i64, allow_negative: bool) -> i64 {
    let checksum = digit_sum_mod_9(correct);
    for &magnitude in &[10i64, 100] {
        for _ in 0..SEARCH_ATTEMPTS {
            let step = magnitude * rng.random_range(1i64..=9);
            if let Some(wrong) = offset_candidate(rng, correct, step, allow_negative) {
                if units_digit(wrong) == units_digit(correct)
                    && digit_sum_mod_9(wrong) != checksum
                {
                    return wrong;
                }
            }
        }
    }
    for &step in &[90i64, 180, 270] {
        if let Some(wrong) = offset_candidate(rng, correct, step, allow_negative) {
            if units_digit(wrong) == units_digit(correct) {
                return wrong;
            }
        }
    }
    log::warn!("castingOutNines search exhausted for {correct}, forcing the units digit");
    let mut wrong = correct + rng.random_range(11i64..=99);
    wrong = with_units(wrong, units_digit(correct));
    if wrong == correct {
        wrong += 10;
    }
    wrong
}

/// Replace the units digit of |n|, keeping the sign
fn with_units(n: i64, units: u32) -> i64 {
    let sign = if n < 0 { -1 } else { 1 };
    let m = n.abs();
    sign * (m - m % 10 + units as i64)
}
