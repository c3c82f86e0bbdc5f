use super::{
    equation::{Equation, symbol_counts, tokenize},
    evaluate::evaluate,
};

/// Decides whether `guess` solves the puzzle whose answer is `target`.
///
/// A guess is accepted only if it is a valid equation, has the same value
/// as the target, and uses exactly the target's characters (each counted
/// with multiplicity) in any order. Another expression that merely happens
/// to have the same value is rejected. A target that is not six symbols
/// long never accepts any guess.
///
/// ```
/// use equatle::is_accepted_solution;
///
/// assert!(is_accepted_solution("3+7+20", "20+7+3"));
/// assert!(!is_accepted_solution("20+7-3", "20+7+3"));
/// ```
#[must_use]
pub fn is_accepted_solution(guess: &str, target: &str) -> bool {
    let Ok(guess) = guess.parse::<Equation>() else {
        return false;
    };
    let Ok(target_symbols) = tokenize(target) else {
        return false;
    };
    let Ok(target_value) = evaluate(target) else {
        return false;
    };

    #[allow(clippy::float_cmp)]
    let same_value = guess.value() == target_value;
    if !same_value {
        return false;
    }

    symbol_counts(guess.symbols()) == symbol_counts(&target_symbols)
}

/// [`is_accepted_solution`] for an already validated target.
#[must_use]
pub fn accepts(guess: &str, target: &Equation) -> bool {
    guess.parse::<Equation>().is_ok_and(|guess| {
        #[allow(clippy::float_cmp)]
        let same_value = guess.value() == target.value();
        same_value && guess.is_permutation_of(target)
    })
}
