//! Per-character feedback for a guess against a target equation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::equation::{EQUATION_LENGTH, MalformedInput, Symbol, tokenize};

/// Feedback for a single tile of a guess.
///
/// States are ordered from least to most informative, so the best known
/// state for a symbol is the maximum of its observed states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileState {
    /// The symbol does not occur (again) in the target.
    Absent,
    /// The symbol occurs in the target at a different position.
    Present,
    /// The symbol is at exactly this position in the target.
    Correct,
}

/// Tile states for every position of a guess.
pub type Feedback = [TileState; EQUATION_LENGTH];

/// Scores a guess against a target.
///
/// Exact-position matches are marked first. The remaining guess symbols are
/// then matched left to right against unconsumed target positions holding
/// the same symbol. A symbol is never marked `correct` or `present` more
/// times than it occurs in the target.
#[must_use]
pub fn score_symbols(
    guess: &[Symbol; EQUATION_LENGTH],
    target: &[Symbol; EQUATION_LENGTH],
) -> Feedback {
    let mut tiles = [TileState::Absent; EQUATION_LENGTH];
    let mut guess_used = [false; EQUATION_LENGTH];
    let mut target_used = [false; EQUATION_LENGTH];
    let mut remaining = [0usize; Symbol::COUNT];
    for symbol in target {
        remaining[symbol.index()] += 1;
    }

    for i in 0..EQUATION_LENGTH {
        if guess[i] == target[i] {
            tiles[i] = TileState::Correct;
            guess_used[i] = true;
            target_used[i] = true;
            remaining[guess[i].index()] -= 1;
        }
    }

    for (i, symbol) in guess.iter().enumerate() {
        if guess_used[i] || remaining[symbol.index()] == 0 {
            continue;
        }
        let matched = (0..EQUATION_LENGTH).find(|&j| !target_used[j] && target[j] == *symbol);
        if let Some(j) = matched {
            tiles[i] = TileState::Present;
            target_used[j] = true;
            remaining[symbol.index()] -= 1;
        }
    }

    tiles
}

/// Scores a guess string against a target string.
///
/// Both strings only need the right length and alphabet; neither has to be
/// a valid equation.
///
/// ```
/// use equatle::{TileState::*, score};
///
/// let tiles = score("12+3+4", "12+4+3").unwrap();
/// assert_eq!(tiles, [Correct, Correct, Correct, Present, Correct, Present]);
/// ```
///
/// # Errors
///
/// Returns [`MalformedInput`] if either string has the wrong length or
/// contains characters outside the equation alphabet.
pub fn score(guess: &str, target: &str) -> Result<Feedback, MalformedInput> {
    Ok(score_symbols(&tokenize(guess)?, &tokenize(target)?))
}

/// Whether every tile of the feedback is `correct`.
#[must_use]
pub fn is_solved(feedback: &Feedback) -> bool {
    feedback.iter().all(|tile| *tile == TileState::Correct)
}

/// The best known state of every symbol across the guesses made so far.
///
/// Used to color an on-screen keyboard. A symbol's state only ever
/// improves: once `correct` it stays `correct`, and `present` is never
/// downgraded to `absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardState {
    keys: BTreeMap<char, TileState>,
}

impl KeyboardState {
    /// Creates an empty keyboard with no known states.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the feedback for one guess into the keyboard.
    pub fn record(&mut self, guess: &[Symbol; EQUATION_LENGTH], feedback: &Feedback) {
        for (symbol, state) in guess.iter().zip(feedback) {
            self.keys
                .entry(symbol.as_char())
                .and_modify(|known| *known = (*known).max(*state))
                .or_insert(*state);
        }
    }

    /// The best known state for a symbol, if it has been guessed.
    #[must_use]
    pub fn state(&self, symbol: Symbol) -> Option<TileState> {
        self.keys.get(&symbol.as_char()).copied()
    }

    /// Iterates over every guessed symbol with its best known state.
    pub fn iter(&self) -> impl Iterator<Item = (char, TileState)> + '_ {
        self.keys.iter().map(|(key, state)| (*key, *state))
    }
}
