//! Math Blitz core - adaptive question generation for a true/false
//! mental-math game.
//!
//! Core modules:
//! - `levels`: Difficulty packs (hand-authored anchors, weights, pacing)
//! - `quiz`: Deterministic question generation (difficulty interpolation,
//!   expression synthesis, strategic wrong answers)
//!
//! The rendering, audio, input and save layers live in the host
//! application. This crate only turns a difficulty level into playable
//! [`Question`] records: the player sees `"<expr> = <value>"` and answers
//! true or false; each wrong value is built to be catchable by exactly one
//! mental-math skill.

pub mod levels;
pub mod quiz;

pub use levels::{
    ConfigError, DifficultyLevelConfig, DifficultyPack, DigitRange, ShapeWeights, Skill,
};
pub use quiz::{
    DifficultyEngine, NotInitialized, Question, QuestionGenerator, ResolvedDifficultyParams,
};

/// Generation tuning constants
pub mod consts {
    /// Attempts at sampling an expression that structurally fits the target skill
    pub const MAX_SYNTH_ATTEMPTS: u32 = 10;

    /// Attempts per stage of a wrong-answer search
    pub const SEARCH_ATTEMPTS: u32 = 8;

    /// Chance an operand is flipped negative when negatives are allowed
    pub const NEGATIVE_OPERAND_CHANCE: f64 = 0.3;

    /// Skill weights at or below this threshold are never sampled
    pub const MIN_SKILL_WEIGHT: f64 = 0.001;

    /// Cap on digits per operand (keeps sums and products inside i64)
    pub const MAX_OPERAND_DIGITS: u32 = 9;
}
