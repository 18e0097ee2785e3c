//! Point formulas.
//!
//! Pure functions with no clocks and no state, so a turn's scoring can be
//! replayed exactly in tests. The lobby supplies the inputs: how much of
//! the turn was left when the guess landed, the 1-based order of the
//! correct guess, and how many players were eligible to guess at all.

/// Points every correct guesser gets regardless of timing or order.
pub const BASE_POINTS: u32 = 100;

/// Maximum time bonus, awarded for an instant guess; scales linearly
/// down to zero as the turn runs out.
pub const TIME_BONUS_MAX: u32 = 200;

/// Extra points per player beaten to the answer.
pub const RANK_BONUS_STEP: u32 = 50;

/// Points the drawer earns for each player who guessed their drawing.
pub const DRAWER_POINTS_PER_GUESS: u32 = 50;

/// Points awarded to a correct guesser.
///
/// - `time_remaining_ratio` — fraction of the Drawing phase left when the
///   guess arrived, clamped into `0.0..=1.0`.
/// - `guess_rank` — 1 for the first correct guess, 2 for the second, …
/// - `total_guessers` — players eligible to guess this turn.
///
/// Earlier guesses and more remaining time yield strictly more points;
/// the last guesser when everyone solves it still collects the baseline
/// (plus whatever time bonus is left).
pub fn guesser_points(
    time_remaining_ratio: f64,
    guess_rank: u32,
    total_guessers: u32,
) -> u32 {
    let ratio = if time_remaining_ratio.is_finite() {
        time_remaining_ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let time_bonus = (f64::from(TIME_BONUS_MAX) * ratio).round() as u32;
    let rank_bonus = RANK_BONUS_STEP * total_guessers.saturating_sub(guess_rank);
    BASE_POINTS + time_bonus + rank_bonus
}

/// Points awarded to the drawer at the end of a turn, proportional to how
/// many players guessed the word. Zero when nobody did.
pub fn drawer_points(correct_guessers: u32) -> u32 {
    DRAWER_POINTS_PER_GUESS * correct_guessers
}
