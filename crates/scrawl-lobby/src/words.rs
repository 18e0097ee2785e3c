//! Word selection and masking.
//!
//! The selector owns the remaining pool of not-yet-used words for a game
//! and draws without replacement, reshuffling the full pool when it runs
//! dry before the game ends. Draw order is deterministic for a fixed seed,
//! which the tests rely on; production lobbies seed from entropy.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Rough word difficulty, classified by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// Up to 5 letters.
    Easy,
    /// 6 to 8 letters.
    Medium,
    /// 9 letters or more.
    Hard,
}

impl Difficulty {
    /// Whether `word` falls into this difficulty bucket.
    ///
    /// Length counts letters only — spaces in multi-word entries don't
    /// make a word harder to guess.
    pub fn matches(&self, word: &str) -> bool {
        let letters = word.chars().filter(|c| !c.is_whitespace()).count();
        match self {
            Self::Easy => letters <= 5,
            Self::Medium => (6..=8).contains(&letters),
            Self::Hard => letters >= 9,
        }
    }
}

/// Draws non-repeating words for a lobby's turns.
pub struct WordSelector {
    /// The full (filtered) pool, used for refills.
    pool: Vec<String>,
    /// Words not yet drawn this cycle, in shuffled order.
    remaining: Vec<String>,
    rng: StdRng,
}

impl WordSelector {
    /// Creates a selector over `pool`, optionally keeping only words of
    /// one difficulty. Seeded from entropy.
    pub fn new(pool: &[String], difficulty: Option<Difficulty>) -> Self {
        Self::build(pool, difficulty, StdRng::from_os_rng())
    }

    /// Creates a selector with a fixed seed, for reproducible draws.
    pub fn with_seed(
        pool: &[String],
        difficulty: Option<Difficulty>,
        seed: u64,
    ) -> Self {
        Self::build(pool, difficulty, StdRng::seed_from_u64(seed))
    }

    fn build(
        pool: &[String],
        difficulty: Option<Difficulty>,
        rng: StdRng,
    ) -> Self {
        let mut filtered: Vec<String> = match difficulty {
            Some(d) => pool.iter().filter(|w| d.matches(w)).cloned().collect(),
            None => pool.to_vec(),
        };
        if filtered.is_empty() {
            // A filter that matches nothing would leave the lobby with no
            // words at all; fall back to the unfiltered pool.
            warn!(?difficulty, "difficulty filter matched no words — ignoring it");
            filtered = pool.to_vec();
        }

        let mut selector = Self {
            pool: filtered,
            remaining: Vec::new(),
            rng,
        };
        selector.refill();
        selector
    }

    /// Reloads and reshuffles the remaining pool from the full pool.
    fn refill(&mut self) {
        self.remaining = self.pool.clone();
        self.remaining.shuffle(&mut self.rng);
        debug!(words = self.remaining.len(), "word pool reshuffled");
    }

    /// Draws the next word, without replacement. Refills the pool when it
    /// is exhausted, so this never fails mid-game.
    pub fn draw(&mut self) -> String {
        if self.remaining.is_empty() {
            self.refill();
        }
        // The pool is non-empty by construction (config validation feeds
        // a fallback list), so the unusual branch is a misuse guard.
        self.remaining.pop().unwrap_or_else(|| "scribble".to_string())
    }

    /// Draws up to `n` distinct candidates for a drawer word choice.
    ///
    /// All candidates are consumed from the pool, so offered-but-unpicked
    /// words do not repeat later in the game either.
    pub fn draw_candidates(&mut self, n: usize) -> Vec<String> {
        let n = n.max(1);
        let mut candidates = Vec::with_capacity(n);
        for _ in 0..n {
            let word = self.draw();
            if !candidates.contains(&word) {
                candidates.push(word);
            }
        }
        candidates
    }

    /// Words left before the next reshuffle.
    pub fn words_remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Number of distinct words in the (filtered) pool.
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }
}

/// Masks a word for the guesser-visible hint: the first letter is shown,
/// the rest become underscores, spaces survive, and everything is joined
/// with spaces so the client can render the word shape.
///
/// `"tree house"` → `"t _ _ _   _ _ _ _ _"`.
pub fn mask_word(word: &str) -> String {
    word.chars()
        .enumerate()
        .map(|(i, c)| {
            if c == ' ' {
                " ".to_string()
            } else if i == 0 {
                c.to_string()
            } else {
                "_".to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compares a guess against the secret word: leading/trailing whitespace
/// and letter case are ignored.
pub fn matches_guess(word: &str, guess: &str) -> bool {
    word.trim().to_lowercase() == guess.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_draw_covers_pool_without_repeats() {
        let words = pool(&["a", "b", "c", "d", "e"]);
        let mut selector = WordSelector::with_seed(&words, None, 7);

        let mut drawn: Vec<String> = (0..5).map(|_| selector.draw()).collect();
        drawn.sort();
        assert_eq!(drawn, words, "one full cycle must use each word once");
    }

    #[test]
    fn test_exhausted_pool_refills() {
        let words = pool(&["alpha", "beta"]);
        let mut selector = WordSelector::with_seed(&words, None, 1);

        selector.draw();
        selector.draw();
        assert_eq!(selector.words_remaining(), 0);

        let third = selector.draw();
        assert!(words.contains(&third));
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let words = pool(&["a", "b", "c", "d", "e", "f"]);
        let mut s1 = WordSelector::with_seed(&words, None, 42);
        let mut s2 = WordSelector::with_seed(&words, None, 42);

        for _ in 0..10 {
            assert_eq!(s1.draw(), s2.draw());
        }
    }

    #[test]
    fn test_difficulty_filter_restricts_pool() {
        let words = pool(&["cat", "helicopter", "house", "binoculars"]);
        let mut selector =
            WordSelector::with_seed(&words, Some(Difficulty::Hard), 3);

        assert_eq!(selector.pool_size(), 2);
        for _ in 0..4 {
            let w = selector.draw();
            assert!(w == "helicopter" || w == "binoculars");
        }
    }

    #[test]
    fn test_unmatched_filter_falls_back_to_full_pool() {
        let words = pool(&["cat", "dog"]);
        let selector =
            WordSelector::with_seed(&words, Some(Difficulty::Hard), 3);
        assert_eq!(selector.pool_size(), 2);
    }

    #[test]
    fn test_draw_candidates_are_distinct() {
        let words = pool(&["a", "b", "c", "d", "e"]);
        let mut selector = WordSelector::with_seed(&words, None, 9);

        let candidates = selector.draw_candidates(3);
        assert_eq!(candidates.len(), 3);
        let mut unique = candidates.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_difficulty_buckets() {
        assert!(Difficulty::Easy.matches("cat"));
        assert!(Difficulty::Easy.matches("horse"));
        assert!(Difficulty::Medium.matches("guitar"));
        assert!(Difficulty::Hard.matches("binoculars"));
        // Spaces don't count toward length.
        assert!(Difficulty::Easy.matches("t rex"));
    }

    #[test]
    fn test_mask_word_shows_first_letter_and_shape() {
        assert_eq!(mask_word("tree"), "t _ _ _");
        assert_eq!(mask_word("tree house"), "t _ _ _   _ _ _ _ _");
    }

    #[test]
    fn test_matches_guess_normalizes_case_and_whitespace() {
        assert!(matches_guess("banana", "banana"));
        assert!(matches_guess("banana", "  BaNaNa  "));
        assert!(matches_guess("Tree House", "tree house"));
        assert!(!matches_guess("banana", "bananas"));
    }
}
