//! Question assembly
//!
//! Ties the difficulty engine, expression synthesizer and strategic-error
//! synthesizer together into playable true/false questions. Everything is
//! deterministic given the generator's seed.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::{DifficultyEngine, NotInitialized, ResolvedDifficultyParams};
use super::expression::{Op, Synthesized, synthesize};
use super::mistakes::inject_error;
use super::numeric::{digit_len, weighted_choice};
use crate::consts::{MAX_SYNTH_ATTEMPTS, MIN_SKILL_WEIGHT};
use crate::levels::{ConfigError, DifficultyPack, Skill};

/// Exact ground truth kept for the scoring and hint layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMetadata {
    /// The expression as displayed, without the `= value` tail
    pub expr: String,
    /// Exact evaluation of `expr` (clamped non-negative when the level
    /// disallows negatives)
    pub correct_value: i64,
    /// The value actually displayed; differs from `correct_value` on
    /// strategically-false questions
    pub shown_value: i64,
}

/// One playable true/false question. Immutable once created; the caller
/// owns it for the duration of the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Display form, `"<expr> = <shown>"`
    pub question_string: String,
    /// Whether the displayed value is the true one
    pub is_true: bool,
    /// Skills this question was built to exercise (at least one)
    pub target_skills: Vec<Skill>,
    /// Total digit count across the displayed operands
    pub digit_difficulty: u32,
    pub metadata: QuestionMetadata,
}

/// Question factory: owns the difficulty engine and a seeded RNG.
///
/// Identical seeds and identical packs produce identical question streams,
/// which is what makes the generator testable at all.
#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    engine: DifficultyEngine,
    rng: Pcg32,
}

impl QuestionGenerator {
    pub fn new(engine: DifficultyEngine, seed: u64) -> Self {
        Self {
            engine,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn from_pack(pack: DifficultyPack, seed: u64) -> Result<Self, ConfigError> {
        Ok(Self::new(DifficultyEngine::from_pack(pack)?, seed))
    }

    /// Swap in a different difficulty pack (full replace)
    pub fn load_pack(&mut self, pack: DifficultyPack) -> Result<(), ConfigError> {
        self.engine.load(pack)
    }

    pub fn engine(&self) -> &DifficultyEngine {
        &self.engine
    }

    /// Generate one question for an arbitrary (possibly fractional) level.
    pub fn generate_question(&mut self, level: f64) -> Result<Question, NotInitialized> {
        let params = self.engine.resolve(level)?;
        Ok(build_question(&mut self.rng, &params))
    }

    /// Generate a full round at this level, `question_count` questions long.
    pub fn generate_round(&mut self, level: f64) -> Result<Vec<Question>, NotInitialized> {
        let params = self.engine.resolve(level)?;
        let count = params.question_count.max(1);
        Ok((0..count).map(|_| build_question(&mut self.rng, &params)).collect())
    }
}

/// Build one question from resolved parameters
fn build_question<R: Rng>(rng: &mut R, params: &ResolvedDifficultyParams) -> Question {
    let skill = sample_skill(rng, &params.skill_weights);

    let range = params.digit_range;
    let synth = if range.min <= range.max {
        let target_digits = rng.random_range(range.min..=range.max);
        try_synthesize(rng, target_digits, params, skill)
    } else {
        // interpolation produced an inverted range: no valid expression
        None
    };
    let synth = synth.unwrap_or_else(|| {
        log::debug!("level {}: using the canned {} expression", params.level, skill.as_str());
        fallback_expression(rng, skill)
    });

    let correct = clamp_value(synth.value, params.allow_negative);
    let make_false = rng.random_bool(0.5);
    let shown = if make_false {
        clamp_value(
            inject_error(rng, correct, skill, params.allow_negative),
            params.allow_negative,
        )
    } else {
        correct
    };

    let digit_difficulty = synth.operands.iter().map(|&v| digit_len(v)).sum();

    Question {
        question_string: format!("{} = {}", synth.text, shown),
        is_true: shown == correct,
        target_skills: vec![skill],
        digit_difficulty,
        metadata: QuestionMetadata {
            expr: synth.text,
            correct_value: correct,
            shown_value: shown,
        },
    }
}

/// Weighted skill pick; near-zero weights are excluded and an empty or
/// all-zero table falls back to lastDigit.
fn sample_skill<R: Rng>(rng: &mut R, weights: &BTreeMap<Skill, f64>) -> Skill {
    let entries: Vec<(Skill, f64)> = weights
        .iter()
        .filter(|&(_, &weight)| weight > MIN_SKILL_WEIGHT)
        .map(|(&skill, &weight)| (skill, weight))
        .collect();
    weighted_choice(rng, &entries)
        .copied()
        .unwrap_or(Skill::LastDigit)
}

/// Bounded synthesis: keep sampling until an expression structurally fits
/// the target skill, or give up after the attempt budget.
fn try_synthesize<R: Rng>(
    rng: &mut R,
    target_digits: u32,
    params: &ResolvedDifficultyParams,
    skill: Skill,
) -> Option<Synthesized> {
    for _ in 0..MAX_SYNTH_ATTEMPTS {
        let candidate = synthesize(
            rng,
            target_digits,
            &params.expression_shape_weights,
            params.allow_negative,
        );
        if suits_skill(&candidate, skill) {
            return Some(candidate);
        }
    }
    None
}

/// Whether an expression can carry an error targeting `skill`.
/// A quotient of magnitude 1 suits nothing: it makes the verification trivial.
fn suits_skill(synth: &Synthesized, skill: Skill) -> bool {
    if synth.trivial_quotient {
        return false;
    }
    match skill {
        // the divisibility shortcut needs something to latch onto
        Skill::SpecialDigits => synth.operands.iter().any(|&v| v != 0 && v % 3 == 0),
        // the nines checksum is taught over sums
        Skill::CastingOutNines => synth.ops.contains(&Op::Add),
        _ => true,
    }
}

/// Canned constructions used when shape sampling cannot satisfy the skill
fn fallback_expression<R: Rng>(rng: &mut R, skill: Skill) -> Synthesized {
    match skill {
        Skill::SpecialDigits => {
            // multiplication with a guaranteed multiple-of-3 factor
            let a = 3 * rng.random_range(2i64..=9);
            let b = rng.random_range(2i64..=9);
            Synthesized::binary(a, Op::Mul, b)
        }
        Skill::CastingOutNines => {
            let a = rng.random_range(10i64..=99);
            let b = rng.random_range(10i64..=99);
            Synthesized::binary(a, Op::Add, b)
        }
        _ => {
            let a = rng.random_range(10i64..=99);
            let b = rng.random_range(1i64..=9);
            Synthesized::binary(a, Op::Add, b)
        }
    }
}

fn clamp_value(value: i64, allow_negative: bool) -> i64 {
    if allow_negative { value } else { value.abs() }
}
