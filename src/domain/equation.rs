use std::{fmt, hash::Hash, str::FromStr};

use serde::{Deserialize, Serialize};

use super::evaluate::{EvaluationError, evaluate_symbols};

/// The number of symbols in every puzzle equation.
pub const EQUATION_LENGTH: usize = 6;

/// One of the four arithmetic operators allowed in an equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `×`
    Multiply,
    /// `÷`
    Divide,
}

impl Operator {
    /// All operators, in display order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    /// The character used to write this operator.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '×',
            Self::Divide => '÷',
        }
    }

    /// Parses an operator from its character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '×' => Some(Self::Multiply),
            '÷' => Some(Self::Divide),
            _ => None,
        }
    }

    /// Whether this operator binds tighter than addition and subtraction.
    #[must_use]
    pub const fn is_multiplicative(self) -> bool {
        matches!(self, Self::Multiply | Self::Divide)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single character of an equation: a decimal digit or an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// A digit in `0..=9`.
    Digit(u8),
    /// An arithmetic operator.
    Operator(Operator),
}

impl Symbol {
    /// The number of distinct symbols (ten digits and four operators).
    pub const COUNT: usize = 14;

    /// Classifies a character, returning `None` for anything outside the
    /// equation alphabet.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        c.to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .map(Self::Digit)
            .or_else(|| Operator::from_char(c).map(Self::Operator))
    }

    /// The character this symbol is written as.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Operator(op) => op.as_char(),
        }
    }

    /// Whether this symbol is an operator.
    #[must_use]
    pub const fn is_operator(self) -> bool {
        matches!(self, Self::Operator(_))
    }

    /// Whether this symbol is a digit.
    #[must_use]
    pub const fn is_digit(self) -> bool {
        matches!(self, Self::Digit(_))
    }

    /// A dense index in `0..Symbol::COUNT`, used for frequency tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Digit(d) => d as usize,
            Self::Operator(Operator::Add) => 10,
            Self::Operator(Operator::Subtract) => 11,
            Self::Operator(Operator::Multiply) => 12,
            Self::Operator(Operator::Divide) => 13,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Counts how often each symbol occurs, indexed by [`Symbol::index`].
#[must_use]
pub fn symbol_counts(symbols: &[Symbol]) -> [usize; Symbol::COUNT] {
    let mut counts = [0; Symbol::COUNT];
    for symbol in symbols {
        counts[symbol.index()] += 1;
    }
    counts
}

/// Reasons a string is not a well-formed equation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedInput {
    /// The candidate does not have exactly [`EQUATION_LENGTH`] characters.
    #[error("expected {EQUATION_LENGTH} characters, found {0}")]
    WrongLength(usize),

    /// A character outside the digits and `+ - × ÷`.
    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter {
        /// The offending character.
        character: char,
        /// Zero-based position of the character.
        position: usize,
    },

    /// The equation starts with an operator.
    #[error("equation cannot start with an operator")]
    LeadingOperator,

    /// The equation ends with an operator.
    #[error("equation cannot end with an operator")]
    TrailingOperator,

    /// Two operators are next to each other.
    #[error("consecutive operators at position {0}")]
    AdjacentOperators(usize),

    /// The equation contains a literal `÷0`.
    #[error("division by zero")]
    DivisionByZero,

    /// No digit-operator-digit sequence anywhere in the equation.
    #[error("equation must contain an operation between two numbers")]
    MissingOperation,
}

/// Error returned when a candidate cannot be accepted as an [`Equation`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidEquation {
    /// The candidate breaks the equation grammar.
    #[error(transparent)]
    Malformed(#[from] MalformedInput),

    /// The candidate is grammatical but cannot be evaluated.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Splits a candidate into symbols, checking only its length and alphabet.
///
/// # Errors
///
/// Returns [`MalformedInput::WrongLength`] or
/// [`MalformedInput::InvalidCharacter`].
pub fn tokenize(candidate: &str) -> Result<[Symbol; EQUATION_LENGTH], MalformedInput> {
    let length = candidate.chars().count();
    if length != EQUATION_LENGTH {
        return Err(MalformedInput::WrongLength(length));
    }

    let mut symbols = [Symbol::Digit(0); EQUATION_LENGTH];
    for (position, (slot, character)) in symbols.iter_mut().zip(candidate.chars()).enumerate() {
        *slot = Symbol::from_char(character).ok_or(MalformedInput::InvalidCharacter {
            character,
            position,
        })?;
    }
    Ok(symbols)
}

fn check_grammar(symbols: &[Symbol; EQUATION_LENGTH]) -> Result<(), MalformedInput> {
    if symbols[0].is_operator() {
        return Err(MalformedInput::LeadingOperator);
    }
    if symbols[EQUATION_LENGTH - 1].is_operator() {
        return Err(MalformedInput::TrailingOperator);
    }

    if let Some(position) = symbols
        .windows(2)
        .position(|pair| pair[0].is_operator() && pair[1].is_operator())
    {
        return Err(MalformedInput::AdjacentOperators(position + 1));
    }

    let divides_by_zero = symbols.windows(2).any(|pair| {
        pair[0] == Symbol::Operator(Operator::Divide) && pair[1] == Symbol::Digit(0)
    });
    if divides_by_zero {
        return Err(MalformedInput::DivisionByZero);
    }

    let has_operation = symbols
        .windows(3)
        .any(|w| w[0].is_digit() && w[1].is_operator() && w[2].is_digit());
    if !has_operation {
        return Err(MalformedInput::MissingOperation);
    }

    Ok(())
}

/// A validated six-character arithmetic equation.
///
/// Equations contain only digits and the operators `+ - × ÷`, start and end
/// with a digit, never place two operators side by side, and evaluate to a
/// finite number. Negative numbers cannot be written.
///
/// ```
/// use equatle::Equation;
///
/// let equation: Equation = "12×3+4".parse().unwrap();
/// assert_eq!(equation.value(), 40.0);
/// assert_eq!(equation.to_string(), "12×3+4");
///
/// assert!("1+-2×3".parse::<Equation>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Equation {
    symbols: [Symbol; EQUATION_LENGTH],
    value: f64,
}

impl Equation {
    /// Validates a sequence of symbols as an equation.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbols break the equation grammar or cannot
    /// be evaluated.
    pub fn from_symbols(symbols: [Symbol; EQUATION_LENGTH]) -> Result<Self, InvalidEquation> {
        check_grammar(&symbols)?;
        let value = evaluate_symbols(&symbols)?;
        Ok(Self { symbols, value })
    }

    /// The symbols making up this equation.
    #[must_use]
    pub const fn symbols(&self) -> &[Symbol; EQUATION_LENGTH] {
        &self.symbols
    }

    /// The value of the equation under standard operator precedence.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// The value as a target number, if it is a positive integer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn target_number(&self) -> Option<u32> {
        let value = self.value;
        (value.fract() == 0.0 && (1.0..=f64::from(u32::MAX)).contains(&value)).then(|| value as u32)
    }

    /// The operators in this equation, left to right.
    pub fn operators(&self) -> impl Iterator<Item = Operator> + '_ {
        self.symbols.iter().filter_map(|symbol| match symbol {
            Symbol::Operator(op) => Some(*op),
            Symbol::Digit(_) => None,
        })
    }

    /// Whether `other` uses exactly the same characters, ignoring order.
    #[must_use]
    pub fn is_permutation_of(&self, other: &Self) -> bool {
        symbol_counts(&self.symbols) == symbol_counts(&other.symbols)
    }
}

impl PartialEq for Equation {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols
    }
}

impl Eq for Equation {}

impl Hash for Equation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.symbols.hash(state);
    }
}

impl PartialOrd for Equation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Equation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.symbols.cmp(&other.symbols)
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.symbols.iter().try_for_each(|symbol| write!(f, "{symbol}"))
    }
}

impl FromStr for Equation {
    type Err = InvalidEquation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbols(tokenize(s)?)
    }
}

impl TryFrom<&str> for Equation {
    type Error = InvalidEquation;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

impl TryFrom<String> for Equation {
    type Error = InvalidEquation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<Equation> for String {
    fn from(equation: Equation) -> Self {
        equation.to_string()
    }
}

/// Returns `true` if `candidate` is a well-formed, evaluable equation.
///
/// This never fails; every reason for rejection maps to `false`. Use
/// [`Equation::from_str`] to find out why a candidate was rejected.
#[must_use]
pub fn validate(candidate: &str) -> bool {
    candidate.parse::<Equation>().is_ok()
}
