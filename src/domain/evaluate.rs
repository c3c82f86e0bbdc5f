//! Precedence-correct evaluation of parenthesis-free arithmetic.
//!
//! `×` and `÷` bind tighter than `+` and `-`, and operators of equal
//! precedence associate to the left. Results are kept exactly as the
//! floating point arithmetic produces them; nothing is rounded.

use super::equation::{Operator, Symbol};

/// Errors that prevent an expression from being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    /// The expression contains no symbols.
    #[error("empty expression")]
    Empty,

    /// A character outside the digits and `+ - × ÷`.
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),

    /// An operator appears where a number was expected.
    #[error("expected a number at position {0}")]
    ExpectedNumber(usize),

    /// The expression ends with an operator.
    #[error("expression ends with an operator")]
    DanglingOperator,

    /// A divisor evaluated to zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The result is infinite or not a number.
    #[error("result is not a finite number")]
    NonFinite,
}

impl Operator {
    fn apply(self, lhs: f64, rhs: f64) -> Result<f64, EvaluationError> {
        match self {
            Self::Add => Ok(lhs + rhs),
            Self::Subtract => Ok(lhs - rhs),
            Self::Multiply => Ok(lhs * rhs),
            Self::Divide if rhs == 0.0 => Err(EvaluationError::DivisionByZero),
            Self::Divide => Ok(lhs / rhs),
        }
    }
}

/// Reads the number starting at `start`, returning it with the index of the
/// first symbol after it.
fn read_number(symbols: &[Symbol], start: usize) -> Result<(f64, usize), EvaluationError> {
    let mut value = None;
    let mut end = start;
    while let Some(Symbol::Digit(d)) = symbols.get(end) {
        value = Some(value.unwrap_or(0.0) * 10.0 + f64::from(*d));
        end += 1;
    }

    match value {
        Some(value) => Ok((value, end)),
        None if start >= symbols.len() => Err(EvaluationError::DanglingOperator),
        None => Err(EvaluationError::ExpectedNumber(start)),
    }
}

/// Evaluates a sequence of symbols of any length.
///
/// # Errors
///
/// Returns an [`EvaluationError`] if the sequence is empty, does not
/// alternate numbers and operators, divides by zero, or produces a
/// non-finite result.
pub fn evaluate_symbols(symbols: &[Symbol]) -> Result<f64, EvaluationError> {
    if symbols.is_empty() {
        return Err(EvaluationError::Empty);
    }

    let (mut term, mut cursor) = read_number(symbols, 0)?;
    let mut total = 0.0;
    let mut pending = Operator::Add;

    // read_number consumes every digit, so anything left starts with an operator
    while let Some(&Symbol::Operator(op)) = symbols.get(cursor) {
        let (operand, next) = read_number(symbols, cursor + 1)?;
        cursor = next;

        if op.is_multiplicative() {
            term = op.apply(term, operand)?;
        } else {
            total = pending.apply(total, term)?;
            pending = op;
            term = operand;
        }
    }

    let result = pending.apply(total, term)?;
    if result.is_finite() {
        Ok(result)
    } else {
        Err(EvaluationError::NonFinite)
    }
}

/// Evaluates an arithmetic expression written with `0-9 + - × ÷`.
///
/// Unlike [`Equation`](super::Equation) parsing, this accepts expressions of
/// any length, so it can be used on arbitrary targets and guesses.
///
/// ```
/// use equatle::evaluate;
///
/// assert_eq!(evaluate("2+3×4"), Ok(14.0));
/// assert_eq!(evaluate("10÷2+3"), Ok(8.0));
/// assert!(evaluate("1÷0").is_err());
/// ```
///
/// # Errors
///
/// Returns an [`EvaluationError`] if the expression contains characters
/// outside the equation alphabet or cannot be evaluated.
pub fn evaluate(expression: &str) -> Result<f64, EvaluationError> {
    let symbols = expression
        .chars()
        .map(|c| Symbol::from_char(c).ok_or(EvaluationError::InvalidCharacter(c)))
        .collect::<Result<Vec<_>, _>>()?;
    evaluate_symbols(&symbols)
}
