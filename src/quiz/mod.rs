//! Deterministic question generation
//!
//! All question logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, threaded explicitly through every function
//! - Stable iteration order (BTreeMap weight tables)
//! - No rendering or platform dependencies

pub mod difficulty;
pub mod expression;
pub mod mistakes;
pub mod numeric;
pub mod question;

pub use difficulty::{DifficultyEngine, NotInitialized, ResolvedDifficultyParams};
pub use expression::{
    Op, OpMix, Shape, Synthesized, eval_left_to_right, flatten_shapes, sample_shape, synthesize,
    synthesize_shape,
};
pub use mistakes::inject_error;
pub use numeric::{
    digit_len, digit_sum, digit_sum_mod_9, distribute_digits, random_with_digit_len, units_digit,
    weighted_choice,
};
pub use question::{Question, QuestionGenerator, QuestionMetadata};
