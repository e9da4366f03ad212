//! Difficulty interpolation engine
//!
//! Anchors are hand-authored checkpoints (say levels 1, 5, 10, 20) while
//! players progress through fractional levels, so every knob must vary
//! smoothly between anchors instead of jumping at them. The engine clamps
//! outside the anchored range and linearly interpolates inside it.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::levels::{
    ConfigError, DifficultyLevelConfig, DifficultyPack, DigitRange, MixWeights, OpWeights,
    ShapeWeights, Skill, ThreeTermWeights, TwoTermWeights,
};

/// `resolve` or question generation called with no difficulty pack loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no difficulty levels loaded")]
pub struct NotInitialized;

/// Concrete parameters for one requested level: every numeric field is
/// interpolated (integral fields rounded), booleans resolve toward the
/// nearer endpoint, and weight keys missing on either side stay undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDifficultyParams {
    /// The level this resolution was requested for
    pub level: f64,
    /// May come out inverted (`min > max`); consumers treat that as
    /// "no valid expression" and use the fallback path
    pub digit_range: DigitRange,
    pub skill_weights: BTreeMap<Skill, f64>,
    pub expression_shape_weights: ShapeWeights,
    pub allow_negative: bool,
    pub allow_fractions: bool,
    pub allow_decimals: bool,
    pub time_per_question_ms: u32,
    pub min_time_ms: u32,
    pub question_count: u32,
}

/// Holds the anchor table. Constructed empty or from a pack; reloading is a
/// full replace, never an incremental edit.
#[derive(Debug, Clone, Default)]
pub struct DifficultyEngine {
    anchors: Vec<DifficultyLevelConfig>,
}

impl DifficultyEngine {
    /// An engine with nothing loaded; `resolve` fails until [`Self::load`]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pack(pack: DifficultyPack) -> Result<Self, ConfigError> {
        let mut engine = Self::new();
        engine.load(pack)?;
        Ok(engine)
    }

    /// Validate and install a pack, replacing any previous one wholesale.
    pub fn load(&mut self, pack: DifficultyPack) -> Result<(), ConfigError> {
        pack.validate()?;
        log::info!(
            "loaded difficulty pack: {} levels spanning {}..{}",
            pack.levels.len(),
            pack.levels[0].level,
            pack.levels[pack.levels.len() - 1].level
        );
        self.anchors = pack.levels;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        !self.anchors.is_empty()
    }

    pub fn anchors(&self) -> &[DifficultyLevelConfig] {
        &self.anchors
    }

    /// Resolve concrete parameters for an arbitrary (possibly fractional)
    /// level. Levels at or outside the first/last anchor return that anchor
    /// unchanged.
    pub fn resolve(&self, level: f64) -> Result<ResolvedDifficultyParams, NotInitialized> {
        let first = self.anchors.first().ok_or(NotInitialized)?;
        let last = self.anchors.last().ok_or(NotInitialized)?;

        if level <= first.level {
            return Ok(resolve_anchor(first, level));
        }
        if level >= last.level {
            return Ok(resolve_anchor(last, level));
        }

        // level is strictly inside the anchored range, so an upper anchor exists
        let hi = self
            .anchors
            .iter()
            .position(|a| a.level > level)
            .unwrap_or(self.anchors.len() - 1);
        let b = &self.anchors[hi];
        let a = &self.anchors[hi - 1];
        let t = (level - a.level) / (b.level - a.level);
        Ok(resolve_between(a, b, t, level))
    }
}

/// An anchor taken verbatim (used at and beyond the boundary anchors)
fn resolve_anchor(anchor: &DifficultyLevelConfig, level: f64) -> ResolvedDifficultyParams {
    ResolvedDifficultyParams {
        level,
        digit_range: anchor.digit_range,
        skill_weights: anchor.skill_weights.clone(),
        expression_shape_weights: anchor.expression_shape_weights,
        allow_negative: anchor.allow_negative,
        allow_fractions: anchor.allow_fractions,
        allow_decimals: anchor.allow_decimals,
        time_per_question_ms: anchor.time_per_question_ms,
        min_time_ms: anchor.min_time_ms,
        question_count: anchor.question_count,
    }
}

fn resolve_between(
    a: &DifficultyLevelConfig,
    b: &DifficultyLevelConfig,
    t: f64,
    level: f64,
) -> ResolvedDifficultyParams {
    ResolvedDifficultyParams {
        level,
        // min and max round independently and are never re-clamped against
        // each other; an inverted range is the caller's signal to fall back
        digit_range: DigitRange {
            min: lerp_round(a.digit_range.min, b.digit_range.min, t),
            max: lerp_round(a.digit_range.max, b.digit_range.max, t),
        },
        skill_weights: lerp_weight_map(&a.skill_weights, &b.skill_weights, t),
        expression_shape_weights: lerp_shapes(
            &a.expression_shape_weights,
            &b.expression_shape_weights,
            t,
        ),
        allow_negative: lerp_bool(a.allow_negative, b.allow_negative, t),
        allow_fractions: lerp_bool(a.allow_fractions, b.allow_fractions, t),
        allow_decimals: lerp_bool(a.allow_decimals, b.allow_decimals, t),
        time_per_question_ms: lerp_round(a.time_per_question_ms, b.time_per_question_ms, t),
        min_time_ms: lerp_round(a.min_time_ms, b.min_time_ms, t),
        question_count: lerp_round(a.question_count, b.question_count, t),
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_round(a: u32, b: u32, t: f64) -> u32 {
    lerp(a as f64, b as f64, t).round() as u32
}

/// false = 0, true = 1; the result is whichever endpoint is nearer
fn lerp_bool(a: bool, b: bool, t: f64) -> bool {
    lerp(a as u8 as f64, b as u8 as f64, t) >= 0.5
}

/// Keys present on both sides interpolate; keys present on only one side
/// stay undefined rather than being invented as zero.
fn lerp_weight_map(
    a: &BTreeMap<Skill, f64>,
    b: &BTreeMap<Skill, f64>,
    t: f64,
) -> BTreeMap<Skill, f64> {
    a.iter()
        .filter_map(|(skill, &wa)| b.get(skill).map(|&wb| (*skill, lerp(wa, wb, t))))
        .collect()
}

fn lerp_opt(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(lerp(x, y, t)),
        _ => None,
    }
}

fn lerp_ops(a: &OpWeights, b: &OpWeights, t: f64) -> OpWeights {
    OpWeights {
        plus: lerp_opt(a.plus, b.plus, t),
        minus: lerp_opt(a.minus, b.minus, t),
        mul: lerp_opt(a.mul, b.mul, t),
        div: lerp_opt(a.div, b.div, t),
    }
}

fn lerp_mixes(a: &MixWeights, b: &MixWeights, t: f64) -> MixWeights {
    MixWeights {
        plus_minus: lerp_opt(a.plus_minus, b.plus_minus, t),
        with_mul: lerp_opt(a.with_mul, b.with_mul, t),
        with_div: lerp_opt(a.with_div, b.with_div, t),
    }
}

fn lerp_shapes(a: &ShapeWeights, b: &ShapeWeights, t: f64) -> ShapeWeights {
    ShapeWeights {
        two_terms: TwoTermWeights {
            simple: lerp_ops(&a.two_terms.simple, &b.two_terms.simple, t),
            with_parentheses: lerp_ops(
                &a.two_terms.with_parentheses,
                &b.two_terms.with_parentheses,
                t,
            ),
        },
        three_terms: ThreeTermWeights {
            simple: lerp_mixes(&a.three_terms.simple, &b.three_terms.simple, t),
            with_parentheses: lerp_mixes(
                &a.three_terms.with_parentheses,
                &b.three_terms.with_parentheses,
                t,
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn anchor(level: f64, min: u32, max: u32, time_ms: u32) -> DifficultyLevelConfig {
        DifficultyLevelConfig {
            level,
            digit_range: DigitRange { min, max },
            skill_weights: BTreeMap::new(),
            expression_shape_weights: ShapeWeights::default(),
            allow_negative: false,
            allow_fractions: false,
            allow_decimals: false,
            time_per_question_ms: time_ms,
            min_time_ms: time_ms / 3,
            question_count: 10,
        }
    }

    fn two_anchor_engine() -> DifficultyEngine {
        let mut a = anchor(1.0, 2, 3, 12_000);
        a.skill_weights = BTreeMap::from([(Skill::LastDigit, 70.0), (Skill::Estimate, 30.0)]);
        a.expression_shape_weights.two_terms.simple.plus = Some(60.0);
        a.expression_shape_weights.two_terms.simple.minus = Some(40.0);

        let mut b = anchor(10.0, 4, 6, 8_000);
        b.skill_weights = BTreeMap::from([(Skill::LastDigit, 40.0), (Skill::Parity, 20.0)]);
        b.expression_shape_weights.two_terms.simple.plus = Some(20.0);
        b.expression_shape_weights.two_terms.simple.mul = Some(30.0);
        b.allow_negative = true;

        DifficultyEngine::from_pack(DifficultyPack { levels: vec![a, b] }).unwrap()
    }

    #[test]
    fn test_resolve_unloaded_is_not_initialized() {
        let engine = DifficultyEngine::new();
        assert_eq!(engine.resolve(1.0), Err(NotInitialized));
        assert!(!engine.is_loaded());
    }

    #[test]
    fn test_empty_pack_cannot_load() {
        let mut engine = DifficultyEngine::new();
        let result = engine.load(DifficultyPack { levels: vec![] });
        assert!(matches!(result, Err(ConfigError::Empty)));
        assert_eq!(engine.resolve(1.0), Err(NotInitialized));
    }

    #[test]
    fn test_clamp_below_first_anchor() {
        let engine = two_anchor_engine();
        let params = engine.resolve(0.25).unwrap();
        assert_eq!(params.digit_range, DigitRange { min: 2, max: 3 });
        assert_eq!(params.time_per_question_ms, 12_000);
        assert_eq!(params.skill_weights[&Skill::LastDigit], 70.0);
        assert_eq!(params.skill_weights[&Skill::Estimate], 30.0);
        assert!(!params.allow_negative);
    }

    #[test]
    fn test_clamp_above_last_anchor() {
        let engine = two_anchor_engine();
        let params = engine.resolve(99.0).unwrap();
        assert_eq!(params.digit_range, DigitRange { min: 4, max: 6 });
        assert_eq!(params.time_per_question_ms, 8_000);
        assert!(params.allow_negative);
    }

    #[test]
    fn test_exact_anchor_levels_reproduce_anchor() {
        let engine = two_anchor_engine();
        let at_first = engine.resolve(1.0).unwrap();
        assert_eq!(at_first.digit_range, DigitRange { min: 2, max: 3 });
        assert_eq!(at_first.skill_weights[&Skill::LastDigit], 70.0);
        let at_last = engine.resolve(10.0).unwrap();
        assert_eq!(at_last.digit_range, DigitRange { min: 4, max: 6 });
        assert_eq!(at_last.skill_weights[&Skill::LastDigit], 40.0);
    }

    #[test]
    fn test_midpoint_interpolation() {
        let engine = two_anchor_engine();
        let params = engine.resolve(5.5).unwrap();
        // halfway between the anchors at 1 and 10
        assert_eq!(params.digit_range, DigitRange { min: 3, max: 5 });
        assert_eq!(params.time_per_question_ms, 10_000);
        assert_eq!(params.skill_weights[&Skill::LastDigit], 55.0);
    }

    #[test]
    fn test_weight_keys_on_one_side_stay_undefined() {
        let engine = two_anchor_engine();
        let params = engine.resolve(5.5).unwrap();
        // estimate only exists at level 1, parity only at level 10
        assert!(!params.skill_weights.contains_key(&Skill::Estimate));
        assert!(!params.skill_weights.contains_key(&Skill::Parity));
        // same rule inside the shape table
        let simple = params.expression_shape_weights.two_terms.simple;
        assert_eq!(simple.plus, Some(40.0));
        assert_eq!(simple.minus, None);
        assert_eq!(simple.mul, None);
    }

    #[test]
    fn test_boolean_threshold() {
        let engine = two_anchor_engine();
        // allow_negative goes false -> true between levels 1 and 10
        assert!(!engine.resolve(5.0).unwrap().allow_negative); // t < 0.5
        assert!(engine.resolve(5.5).unwrap().allow_negative); // t == 0.5
        assert!(engine.resolve(9.0).unwrap().allow_negative);
    }

    #[test]
    fn test_digit_bounds_round_independently() {
        // a pack whose interpolated range inverts partway through
        let mut a = anchor(1.0, 2, 8, 10_000);
        let mut b = anchor(2.0, 9, 2, 10_000);
        a.skill_weights = BTreeMap::from([(Skill::LastDigit, 1.0)]);
        b.skill_weights = BTreeMap::from([(Skill::LastDigit, 1.0)]);
        let engine = DifficultyEngine::from_pack(DifficultyPack { levels: vec![a, b] }).unwrap();
        let params = engine.resolve(1.9).unwrap();
        assert!(params.digit_range.min > params.digit_range.max);
    }

    #[test]
    fn test_reload_fully_replaces() {
        let mut engine = two_anchor_engine();
        let replacement = DifficultyPack {
            levels: vec![anchor(3.0, 7, 9, 5_000)],
        };
        engine.load(replacement).unwrap();
        let params = engine.resolve(1.0).unwrap();
        assert_eq!(params.digit_range, DigitRange { min: 7, max: 9 });
        assert!(params.skill_weights.is_empty());
    }

    proptest! {
        #[test]
        fn prop_interpolation_stays_between_endpoints(level in 1.0f64..10.0) {
            let engine = two_anchor_engine();
            let params = engine.resolve(level).unwrap();
            prop_assert!((2..=4).contains(&params.digit_range.min));
            prop_assert!((3..=6).contains(&params.digit_range.max));
            prop_assert!((8_000..=12_000).contains(&params.time_per_question_ms));
            let last_digit = params.skill_weights[&Skill::LastDigit];
            prop_assert!((40.0..=70.0).contains(&last_digit));
        }

        #[test]
        fn prop_interpolation_is_monotonic_in_level(level in 1.0f64..9.0) {
            let engine = two_anchor_engine();
            let lo = engine.resolve(level).unwrap();
            let hi = engine.resolve(level + 1.0).unwrap();
            // time budget shrinks as levels rise in this pack
            prop_assert!(hi.time_per_question_ms <= lo.time_per_question_ms);
            prop_assert!(hi.digit_range.min >= lo.digit_range.min);
        }
    }
}
