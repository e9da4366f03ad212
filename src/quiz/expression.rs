//! Expression synthesis
//!
//! Turns a digit budget and a shape-weight table into a concrete arithmetic
//! expression with a known exact value. Division never divides the raw
//! operands: the displayed divisor is re-picked from the dividend's divisors
//! so the quotient is always an exact integer.
//!
//! Unparenthesized three-term expressions evaluate strictly left to right.
//! That is not standard operator precedence; it matches how the game's
//! school-age audience reads a chain aloud, and the answer key depends on it.

use rand::Rng;

use super::numeric::{digit_len, distribute_digits, random_with_digit_len, weighted_choice};
use crate::consts::NEGATIVE_OPERAND_CHANCE;
use crate::levels::{MixWeights, OpWeights, ShapeWeights};

/// Binary operator as displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    pub fn symbol(&self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '×',
            Op::Div => '÷',
        }
    }
}

/// Operator mix of a three-term shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMix {
    /// Both operators drawn from {+, −}
    PlusMinus,
    /// Exactly one ×, the other from {+, −}
    WithMul,
    /// Exactly one ÷, the other from {+, −}
    WithDiv,
}

/// One entry of the flattened shape table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Two { parens: bool, op: Op },
    Three { parens: bool, mix: OpMix },
}

impl Shape {
    /// The documented default when a weight table is empty or all zero
    /// (`twoTerms.simple.plus`)
    pub const DEFAULT: Shape = Shape::Two {
        parens: false,
        op: Op::Add,
    };

    pub fn operand_count(&self) -> u32 {
        match self {
            Shape::Two { .. } => 2,
            Shape::Three { .. } => 3,
        }
    }
}

/// Flatten the nested weight table into `(shape, weight)` pairs. Absent
/// leaves are skipped entirely, which the sampler reads as weight 0.
pub fn flatten_shapes(weights: &ShapeWeights) -> Vec<(Shape, f64)> {
    let mut flat = Vec::with_capacity(14);
    push_ops(&mut flat, &weights.two_terms.simple, false);
    push_ops(&mut flat, &weights.two_terms.with_parentheses, true);
    push_mixes(&mut flat, &weights.three_terms.simple, false);
    push_mixes(&mut flat, &weights.three_terms.with_parentheses, true);
    flat
}

fn push_ops(out: &mut Vec<(Shape, f64)>, weights: &OpWeights, parens: bool) {
    let leaves = [
        (weights.plus, Op::Add),
        (weights.minus, Op::Sub),
        (weights.mul, Op::Mul),
        (weights.div, Op::Div),
    ];
    for (weight, op) in leaves {
        if let Some(weight) = weight {
            out.push((Shape::Two { parens, op }, weight));
        }
    }
}

fn push_mixes(out: &mut Vec<(Shape, f64)>, weights: &MixWeights, parens: bool) {
    let leaves = [
        (weights.plus_minus, OpMix::PlusMinus),
        (weights.with_mul, OpMix::WithMul),
        (weights.with_div, OpMix::WithDiv),
    ];
    for (weight, mix) in leaves {
        if let Some(weight) = weight {
            out.push((Shape::Three { parens, mix }, weight));
        }
    }
}

/// Sample a shape by weight, defaulting to `a + b` when the table is empty
/// or carries no positive weight.
pub fn sample_shape<R: Rng>(rng: &mut R, weights: &ShapeWeights) -> Shape {
    let flat = flatten_shapes(weights);
    weighted_choice(rng, &flat).copied().unwrap_or(Shape::DEFAULT)
}

/// A synthesized expression with its exact value
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    /// Display text, e.g. `(3 + 4) × 12`
    pub text: String,
    /// Exact value under parens-first, left-to-right evaluation
    pub value: i64,
    /// Literal operands as shown, in display order
    pub operands: Vec<i64>,
    /// Operators as shown, in display order
    pub ops: Vec<Op>,
    /// A division had to settle for a quotient of magnitude 1
    pub trivial_quotient: bool,
}

impl Synthesized {
    /// Build a plain two-term expression directly (fallback constructions)
    pub fn binary(a: i64, op: Op, b: i64) -> Synthesized {
        let value = match op {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
            Op::Div => a.checked_div(b).unwrap_or(0),
        };
        Synthesized {
            text: format!("{} {} {}", a, op.symbol(), fmt_operand(b)),
            value,
            operands: vec![a, b],
            ops: vec![op],
            trivial_quotient: false,
        }
    }
}

/// Where the parentheses sit in a three-term expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParenPos {
    None,
    /// `(a op b) op c`
    First,
    /// `a op (b op c)`
    Second,
}

/// Synthesize an expression: sample a shape, split the digit budget, draw
/// operands, apply operators.
pub fn synthesize<R: Rng>(
    rng: &mut R,
    target_digits: u32,
    weights: &ShapeWeights,
    allow_negative: bool,
) -> Synthesized {
    let shape = sample_shape(rng, weights);
    synthesize_shape(rng, shape, target_digits, allow_negative)
}

/// Synthesize for a specific shape (the sampling step already done)
pub fn synthesize_shape<R: Rng>(
    rng: &mut R,
    shape: Shape,
    target_digits: u32,
    allow_negative: bool,
) -> Synthesized {
    let budgets = distribute_digits(rng, target_digits, shape.operand_count());
    let mut operands: Vec<i64> = budgets
        .iter()
        .map(|&digits| {
            let value = random_with_digit_len(rng, digits);
            if allow_negative && rng.random_bool(NEGATIVE_OPERAND_CHANCE) {
                -value
            } else {
                value
            }
        })
        .collect();
    let mut trivial = false;

    match shape {
        Shape::Two { parens, op } => {
            let value = combine(rng, operands[0], op, &mut operands, 1, budgets[1], &mut trivial);
            let body = format!(
                "{} {} {}",
                operands[0],
                op.symbol(),
                fmt_operand(operands[1])
            );
            let text = if parens { format!("({body})") } else { body };
            Synthesized {
                text,
                value,
                operands,
                ops: vec![op],
                trivial_quotient: trivial,
            }
        }
        Shape::Three { parens, mix } => {
            let paren_pos = match (parens, rng.random_bool(0.5)) {
                (false, _) => ParenPos::None,
                (true, true) => ParenPos::First,
                (true, false) => ParenPos::Second,
            };
            let ops = pick_mix_ops(rng, mix, paren_pos);
            let value = match paren_pos {
                // parentheses around the first pair match left-to-right order
                ParenPos::None | ParenPos::First => {
                    let mut acc = operands[0];
                    acc = combine(rng, acc, ops[0], &mut operands, 1, budgets[1], &mut trivial);
                    combine(rng, acc, ops[1], &mut operands, 2, budgets[2], &mut trivial)
                }
                ParenPos::Second => {
                    let inner =
                        combine(rng, operands[1], ops[1], &mut operands, 2, budgets[2], &mut trivial);
                    match ops[0] {
                        Op::Add => operands[0] + inner,
                        Op::Sub => operands[0] - inner,
                        Op::Mul => operands[0] * inner,
                        // ÷ is always placed inside the parentheses for this layout
                        Op::Div => operands[0].checked_div(inner).unwrap_or(0),
                    }
                }
            };
            let text = render_three(&operands, &ops, paren_pos);
            Synthesized {
                text,
                value,
                operands,
                ops,
                trivial_quotient: trivial,
            }
        }
    }
}

/// Fold one operand into the running value. Division replaces the displayed
/// operand with a picked divisor of the current value.
fn combine<R: Rng>(
    rng: &mut R,
    lhs: i64,
    op: Op,
    operands: &mut [i64],
    idx: usize,
    budget: u32,
    trivial: &mut bool,
) -> i64 {
    match op {
        Op::Add => lhs + operands[idx],
        Op::Sub => lhs - operands[idx],
        Op::Mul => lhs * operands[idx],
        Op::Div => {
            let (divisor, is_trivial) = pick_divisor(rng, lhs, budget);
            operands[idx] = divisor;
            *trivial |= is_trivial;
            lhs / divisor
        }
    }
}

fn pick_mix_ops<R: Rng>(rng: &mut R, mix: OpMix, paren_pos: ParenPos) -> Vec<Op> {
    fn plus_or_minus<R: Rng>(rng: &mut R) -> Op {
        if rng.random_bool(0.5) { Op::Add } else { Op::Sub }
    }
    match mix {
        OpMix::PlusMinus => vec![plus_or_minus(rng), plus_or_minus(rng)],
        OpMix::WithMul => {
            if rng.random_bool(0.5) {
                vec![Op::Mul, plus_or_minus(rng)]
            } else {
                vec![plus_or_minus(rng), Op::Mul]
            }
        }
        OpMix::WithDiv => {
            // the divisor must be a shown literal; inside second-pair
            // parentheses that means the ÷ goes in slot 1
            let div_first = paren_pos != ParenPos::Second && rng.random_bool(0.5);
            if div_first {
                vec![Op::Div, plus_or_minus(rng)]
            } else {
                vec![plus_or_minus(rng), Op::Div]
            }
        }
    }
}

/// Choose a displayed divisor for `dividend`: uniform over the divisors of
/// its magnitude whose quotient fits `budget` digits, excluding the
/// degenerate divisor equal to the dividend itself. Falls back to 1 when
/// nothing qualifies (the quotient may then be trivial, which the caller
/// rejects and retries).
fn pick_divisor<R: Rng>(rng: &mut R, dividend: i64, budget: u32) -> (i64, bool) {
    let m = dividend.abs();
    if m == 0 {
        return (1, false);
    }
    let mut candidates = Vec::new();
    let mut d = 1i64;
    while d * d <= m {
        if m % d == 0 {
            let paired = m / d;
            if d != m && digit_len(m / d) <= budget {
                candidates.push(d);
            }
            if paired != d && paired != m && digit_len(m / paired) <= budget {
                candidates.push(paired);
            }
        }
        d += 1;
    }
    if candidates.is_empty() {
        (1, m == 1)
    } else {
        (candidates[rng.random_range(0..candidates.len())], false)
    }
}

/// Negative operands after the first are parenthesized for readability
fn fmt_operand(value: i64) -> String {
    if value < 0 {
        format!("({value})")
    } else {
        value.to_string()
    }
}

fn render_three(operands: &[i64], ops: &[Op], paren_pos: ParenPos) -> String {
    let (a, b, c) = (operands[0], operands[1], operands[2]);
    let (s1, s2) = (ops[0].symbol(), ops[1].symbol());
    match paren_pos {
        ParenPos::None => format!("{a} {s1} {} {s2} {}", fmt_operand(b), fmt_operand(c)),
        ParenPos::First => format!("({a} {s1} {}) {s2} {}", fmt_operand(b), fmt_operand(c)),
        ParenPos::Second => format!("{a} {s1} ({b} {s2} {})", fmt_operand(c)),
    }
}

// ---------------------------------------------------------------------------
// Evaluation

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Num(i64),
    Op(Op),
    Open,
    Close,
}

/// Evaluate an expression string under the game's rules: parenthesized
/// groups first, then strictly left to right with no operator precedence.
/// Returns `None` for malformed input or division by zero.
pub fn eval_left_to_right(expr: &str) -> Option<i64> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return None;
    }
    let mut pos = 0;
    let value = eval_seq(&tokens, &mut pos)?;
    (pos == tokens.len()).then_some(value)
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            '+' => {
                tokens.push(Token::Op(Op::Add));
                chars.next();
            }
            '×' => {
                tokens.push(Token::Op(Op::Mul));
                chars.next();
            }
            '÷' => {
                tokens.push(Token::Op(Op::Div));
                chars.next();
            }
            '-' => {
                chars.next();
                // unary minus at expression/group start or after an operator
                let unary = matches!(
                    tokens.last(),
                    None | Some(Token::Op(_)) | Some(Token::Open)
                );
                if unary {
                    let n = take_number(&mut chars)?;
                    tokens.push(Token::Num(-n));
                } else {
                    tokens.push(Token::Op(Op::Sub));
                }
            }
            '0'..='9' => {
                let n = take_number(&mut chars)?;
                tokens.push(Token::Num(n));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<i64> {
    let mut n: i64 = 0;
    let mut any = false;
    while let Some(&c) = chars.peek() {
        let Some(digit) = c.to_digit(10) else { break };
        n = n.checked_mul(10)?.checked_add(digit as i64)?;
        any = true;
        chars.next();
    }
    any.then_some(n)
}

fn eval_seq(tokens: &[Token], pos: &mut usize) -> Option<i64> {
    let mut acc = eval_atom(tokens, pos)?;
    while *pos < tokens.len() {
        match tokens[*pos] {
            Token::Close => break,
            Token::Op(op) => {
                *pos += 1;
                let rhs = eval_atom(tokens, pos)?;
                acc = match op {
                    Op::Add => acc + rhs,
                    Op::Sub => acc - rhs,
                    Op::Mul => acc * rhs,
                    Op::Div => acc.checked_div(rhs)?,
                };
            }
            _ => return None,
        }
    }
    Some(acc)
}

fn eval_atom(tokens: &[Token], pos: &mut usize) -> Option<i64> {
    match tokens.get(*pos)? {
        Token::Num(n) => {
            *pos += 1;
            Some(*n)
        }
        Token::Open => {
            *pos += 1;
            let value = eval_seq(tokens, pos)?;
            if tokens.get(*pos) == Some(&Token::Close) {
                *pos += 1;
                Some(value)
            } else {
                None
            }
        }
        _ => None,
    }
}
