//! Difficulty packs
//!
//! A pack is a hand-authored list of difficulty anchors. Each anchor pins
//! every generation knob (digit budget, skill emphasis, expression shapes,
//! pacing) at one level; the engine in [`crate::quiz::difficulty`]
//! interpolates between them so progression feels continuous.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mental-math verification skill a question can target.
///
/// Each variant names the shortcut a player would use to spot the error:
/// checking the last digit, estimating the magnitude, checking parity,
/// casting out nines, re-checking carries/borrows, or testing
/// divisibility by 3 and 9.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Skill {
    LastDigit,
    Estimate,
    Parity,
    CastingOutNines,
    CarryBorrow,
    SpecialDigits,
}

impl Skill {
    /// All skills in their canonical order
    pub const ALL: [Skill; 6] = [
        Skill::LastDigit,
        Skill::Estimate,
        Skill::Parity,
        Skill::CastingOutNines,
        Skill::CarryBorrow,
        Skill::SpecialDigits,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::LastDigit => "lastDigit",
            Skill::Estimate => "estimate",
            Skill::Parity => "parity",
            Skill::CastingOutNines => "castingOutNines",
            Skill::CarryBorrow => "carryBorrow",
            Skill::SpecialDigits => "specialDigits",
        }
    }
}

/// Inclusive bounds on the total digit count across all operands of an
/// expression. Interpolation rounds `min` and `max` independently, so a
/// resolved range may come out inverted; consumers treat that as "no valid
/// expression" and fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitRange {
    pub min: u32,
    pub max: u32,
}

/// Weights for the four operators of a two-term shape. An absent entry is
/// undefined, not zero: it stays undefined through interpolation and is
/// simply never sampled.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpWeights {
    pub plus: Option<f64>,
    pub minus: Option<f64>,
    pub mul: Option<f64>,
    pub div: Option<f64>,
}

/// Weights for the operator mixes of a three-term shape
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixWeights {
    /// Both operators drawn from {+, −}
    pub plus_minus: Option<f64>,
    /// Exactly one × among the two operators
    pub with_mul: Option<f64>,
    /// Exactly one ÷ among the two operators
    pub with_div: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TwoTermWeights {
    pub simple: OpWeights,
    pub with_parentheses: OpWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreeTermWeights {
    pub simple: MixWeights,
    pub with_parentheses: MixWeights,
}

/// Nested expression-shape weight table
/// (`twoTerms.simple.plus`, `threeTerms.withParentheses.withDiv`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeWeights {
    pub two_terms: TwoTermWeights,
    pub three_terms: ThreeTermWeights,
}

/// One hand-authored difficulty checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyLevelConfig {
    /// Ordering key; strictly increasing across a pack, not necessarily integer
    pub level: f64,
    pub digit_range: DigitRange,
    /// Relative sampling weights per skill; need not sum to 1
    #[serde(default)]
    pub skill_weights: BTreeMap<Skill, f64>,
    #[serde(default)]
    pub expression_shape_weights: ShapeWeights,
    #[serde(default)]
    pub allow_negative: bool,
    #[serde(default)]
    pub allow_fractions: bool,
    #[serde(default)]
    pub allow_decimals: bool,
    // Pacing, consumed by the presentation layer only
    pub time_per_question_ms: u32,
    pub min_time_ms: u32,
    pub question_count: u32,
}

/// Structural problems in a difficulty pack, surfaced at load time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("difficulty pack has no levels")]
    Empty,
    #[error("difficulty pack levels must be strictly increasing ({prev} is followed by {next})")]
    Unsorted { prev: f64, next: f64 },
    #[error("malformed difficulty pack: {0}")]
    Json(#[from] serde_json::Error),
}

/// A complete difficulty pack document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPack {
    pub levels: Vec<DifficultyLevelConfig>,
}

impl DifficultyPack {
    /// Parse a pack from its JSON document. Structure is validated; call
    /// [`DifficultyPack::validate`] again only if the pack was built in code.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let pack: DifficultyPack = serde_json::from_str(json)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Check the anchor-list invariants: non-empty, strictly increasing levels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::Empty);
        }
        for pair in self.levels.windows(2) {
            if pair[1].level <= pair[0].level {
                return Err(ConfigError::Unsorted {
                    prev: pair[0].level,
                    next: pair[1].level,
                });
            }
        }
        for anchor in &self.levels {
            for (skill, &weight) in &anchor.skill_weights {
                if weight < 0.0 {
                    log::warn!(
                        "level {}: negative weight {} for {} will never be sampled",
                        anchor.level,
                        weight,
                        skill.as_str()
                    );
                }
            }
        }
        Ok(())
    }
}

impl Default for DifficultyPack {
    /// Built-in pack: four checkpoints from early primary-school arithmetic
    /// up to long multi-term expressions with negatives.
    fn default() -> Self {
        DifficultyPack {
            levels: vec![
                DifficultyLevelConfig {
                    level: 1.0,
                    digit_range: DigitRange { min: 2, max: 3 },
                    skill_weights: BTreeMap::from([
                        (Skill::LastDigit, 70.0),
                        (Skill::Estimate, 30.0),
                    ]),
                    expression_shape_weights: ShapeWeights {
                        two_terms: TwoTermWeights {
                            simple: OpWeights {
                                plus: Some(60.0),
                                minus: Some(40.0),
                                ..OpWeights::default()
                            },
                            ..TwoTermWeights::default()
                        },
                        ..ShapeWeights::default()
                    },
                    allow_negative: false,
                    allow_fractions: false,
                    allow_decimals: false,
                    time_per_question_ms: 12_000,
                    min_time_ms: 4_000,
                    question_count: 8,
                },
                DifficultyLevelConfig {
                    level: 5.0,
                    digit_range: DigitRange { min: 3, max: 5 },
                    skill_weights: BTreeMap::from([
                        (Skill::LastDigit, 40.0),
                        (Skill::Estimate, 25.0),
                        (Skill::Parity, 20.0),
                        (Skill::CarryBorrow, 15.0),
                    ]),
                    expression_shape_weights: ShapeWeights {
                        two_terms: TwoTermWeights {
                            simple: OpWeights {
                                plus: Some(40.0),
                                minus: Some(30.0),
                                mul: Some(20.0),
                                ..OpWeights::default()
                            },
                            with_parentheses: OpWeights {
                                plus: Some(10.0),
                                ..OpWeights::default()
                            },
                        },
                        three_terms: ThreeTermWeights {
                            simple: MixWeights {
                                plus_minus: Some(15.0),
                                ..MixWeights::default()
                            },
                            ..ThreeTermWeights::default()
                        },
                    },
                    allow_negative: false,
                    allow_fractions: false,
                    allow_decimals: false,
                    time_per_question_ms: 10_000,
                    min_time_ms: 3_500,
                    question_count: 10,
                },
                DifficultyLevelConfig {
                    level: 10.0,
                    digit_range: DigitRange { min: 4, max: 6 },
                    skill_weights: BTreeMap::from([
                        (Skill::LastDigit, 25.0),
                        (Skill::Estimate, 20.0),
                        (Skill::Parity, 15.0),
                        (Skill::CarryBorrow, 15.0),
                        (Skill::SpecialDigits, 15.0),
                        (Skill::CastingOutNines, 10.0),
                    ]),
                    expression_shape_weights: ShapeWeights {
                        two_terms: TwoTermWeights {
                            simple: OpWeights {
                                plus: Some(25.0),
                                minus: Some(25.0),
                                mul: Some(20.0),
                                div: Some(15.0),
                            },
                            with_parentheses: OpWeights {
                                plus: Some(10.0),
                                minus: Some(10.0),
                                ..OpWeights::default()
                            },
                        },
                        three_terms: ThreeTermWeights {
                            simple: MixWeights {
                                plus_minus: Some(20.0),
                                with_mul: Some(10.0),
                                ..MixWeights::default()
                            },
                            with_parentheses: MixWeights {
                                plus_minus: Some(10.0),
                                with_div: Some(5.0),
                                ..MixWeights::default()
                            },
                        },
                    },
                    allow_negative: true,
                    allow_fractions: false,
                    allow_decimals: false,
                    time_per_question_ms: 9_000,
                    min_time_ms: 3_000,
                    question_count: 12,
                },
                DifficultyLevelConfig {
                    level: 20.0,
                    digit_range: DigitRange { min: 6, max: 9 },
                    skill_weights: BTreeMap::from([
                        (Skill::LastDigit, 10.0),
                        (Skill::Estimate, 20.0),
                        (Skill::Parity, 5.0),
                        (Skill::CarryBorrow, 20.0),
                        (Skill::SpecialDigits, 20.0),
                        (Skill::CastingOutNines, 25.0),
                    ]),
                    expression_shape_weights: ShapeWeights {
                        two_terms: TwoTermWeights {
                            simple: OpWeights {
                                plus: Some(15.0),
                                minus: Some(15.0),
                                mul: Some(20.0),
                                div: Some(20.0),
                            },
                            with_parentheses: OpWeights {
                                plus: Some(5.0),
                                minus: Some(5.0),
                                ..OpWeights::default()
                            },
                        },
                        three_terms: ThreeTermWeights {
                            simple: MixWeights {
                                plus_minus: Some(20.0),
                                with_mul: Some(15.0),
                                with_div: Some(10.0),
                            },
                            with_parentheses: MixWeights {
                                plus_minus: Some(10.0),
                                with_mul: Some(10.0),
                                with_div: Some(10.0),
                            },
                        },
                    },
                    allow_negative: true,
                    allow_fractions: false,
                    allow_decimals: false,
                    time_per_question_ms: 7_000,
                    min_time_ms: 2_500,
                    question_count: 15,
                },
            ],
        }
    }
}
