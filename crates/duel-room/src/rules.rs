//! Round resolution.

use duel_protocol::{Choice, Outcome};

/// Decides a round from slot 1's and slot 2's choices.
///
/// Rock beats scissors, scissors beat paper, paper beats rock. The match
/// is spelled out over all nine ordered pairs so the compiler checks that
/// none is missing.
pub fn resolve(first: Choice, second: Choice) -> Outcome {
    use Choice::{Paper, Rock, Scissors};

    match (first, second) {
        (Rock, Rock) | (Paper, Paper) | (Scissors, Scissors) => Outcome::Tie,
        (Rock, Scissors) | (Scissors, Paper) | (Paper, Rock) => {
            Outcome::FirstPlayer
        }
        (Scissors, Rock) | (Paper, Scissors) | (Rock, Paper) => {
            Outcome::SecondPlayer
        }
    }
}
