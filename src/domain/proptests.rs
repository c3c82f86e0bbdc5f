//! Property-based tests for the equation engine.

#![allow(clippy::float_cmp)]

use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use super::{
    Equation, Generator, Operator, Symbol, TileState,
    equation::{EQUATION_LENGTH, symbol_counts},
    evaluate, is_accepted_solution, score, validate,
};

const ALPHABET: [char; Symbol::COUNT] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '+', '-', '×', '÷',
];

// Any six characters from the equation alphabet, valid or not
fn candidate() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(ALPHABET.to_vec()), EQUATION_LENGTH)
        .prop_map(|chars| chars.into_iter().collect())
}

// Number lengths of every well-formed layout
const SHAPES: [&[usize]; 7] = [
    &[1, 4],
    &[2, 3],
    &[3, 2],
    &[4, 1],
    &[1, 1, 2],
    &[1, 2, 1],
    &[2, 1, 1],
];

fn equation() -> impl Strategy<Value = Equation> {
    (
        prop::sample::select(SHAPES.to_vec()),
        prop::collection::vec(0u8..10, EQUATION_LENGTH),
        prop::collection::vec(prop::sample::select(Operator::ALL.to_vec()), 2),
    )
        .prop_filter_map("division by zero", |(shape, digits, operators)| {
            let mut digits = digits.into_iter();
            let mut s = String::new();
            for (i, len) in shape.iter().enumerate() {
                if i > 0 {
                    s.push(operators[i - 1].as_char());
                }
                s.extend(digits.by_ref().take(*len).map(|d| char::from(b'0' + d)));
            }
            s.parse().ok()
        })
}

// An equation together with a shuffle of its characters
fn equation_and_shuffle() -> impl Strategy<Value = (Equation, String)> {
    equation().prop_flat_map(|eq| {
        let chars: Vec<char> = eq.to_string().chars().collect();
        (
            Just(eq),
            Just(chars)
                .prop_shuffle()
                .prop_map(|chars| chars.into_iter().collect()),
        )
    })
}

fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | '×' | '÷')
}

proptest! {
    #[test]
    fn valid_candidates_satisfy_the_grammar(s in candidate()) {
        if validate(&s) {
            let chars: Vec<char> = s.chars().collect();
            prop_assert_eq!(chars.len(), EQUATION_LENGTH);
            prop_assert!(chars[0].is_ascii_digit());
            prop_assert!(chars[EQUATION_LENGTH - 1].is_ascii_digit());
            prop_assert!(chars.windows(2).all(|w| !(is_operator(w[0]) && is_operator(w[1]))));
            prop_assert!(!s.contains("÷0"));
            prop_assert!(chars.iter().any(|c| is_operator(*c)));
            prop_assert!(evaluate(&s).is_ok_and(f64::is_finite));
        }
    }

    #[test]
    fn validate_never_accepts_other_lengths(s in "[0-9+×÷-]{0,12}") {
        if s.chars().count() != EQUATION_LENGTH {
            prop_assert!(!validate(&s));
        }
    }

    #[test]
    fn an_equation_solves_itself(eq in equation()) {
        let s = eq.to_string();
        prop_assert!(is_accepted_solution(&s, &s));
        prop_assert_eq!(score(&s, &s).unwrap(), [TileState::Correct; EQUATION_LENGTH]);
    }

    #[test]
    fn shuffles_are_accepted_iff_valid_with_the_same_value((target, guess) in equation_and_shuffle()) {
        let expected = guess
            .parse::<Equation>()
            .is_ok_and(|g| g.value() == target.value());
        prop_assert_eq!(is_accepted_solution(&guess, &target.to_string()), expected);
    }

    #[test]
    fn accepted_solutions_use_the_same_characters(guess in candidate(), target in equation()) {
        if is_accepted_solution(&guess, &target.to_string()) {
            let guess: Equation = guess.parse().unwrap();
            prop_assert_eq!(symbol_counts(guess.symbols()), symbol_counts(target.symbols()));
        }
    }

    #[test]
    fn feedback_never_overcounts(guess in candidate(), target in candidate()) {
        let tiles = score(&guess, &target).unwrap();
        let guess: Vec<char> = guess.chars().collect();
        let target: Vec<char> = target.chars().collect();

        for i in 0..EQUATION_LENGTH {
            prop_assert_eq!(tiles[i] == TileState::Correct, guess[i] == target[i]);
        }

        for c in ALPHABET {
            let marked = (0..EQUATION_LENGTH)
                .filter(|&i| guess[i] == c && tiles[i] != TileState::Absent)
                .count();
            let available = target.iter().filter(|&&t| t == c).count();
            prop_assert!(marked <= available);
        }
    }

    #[test]
    fn multiplication_binds_tighter(a in 0u8..10, b in 0u8..10, c in 0u8..10) {
        let (x, y, z) = (f64::from(a), f64::from(b), f64::from(c));
        prop_assert_eq!(evaluate(&format!("{a}+{b}×{c}")), Ok(x + y * z));
        prop_assert_eq!(evaluate(&format!("{a}×{b}-{c}")), Ok(x * y - z));
    }

    #[test]
    fn generated_equations_are_positive_integers(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let puzzle = Generator::default().generate_with(&mut rng).unwrap();
        let s = puzzle.equation.to_string();

        prop_assert!(validate(&s));
        prop_assert!((1..=9999).contains(&puzzle.target_number));
        prop_assert_eq!(evaluate(&s), Ok(f64::from(puzzle.target_number)));
    }
}
