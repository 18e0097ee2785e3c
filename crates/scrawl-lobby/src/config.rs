//! Lobby configuration.
//!
//! The engine never loads configuration itself — the embedding layer
//! builds a [`LobbyConfig`] (from its own settings source) and hands it
//! over read-only. [`LobbyConfig::validated`] normalizes whatever arrives
//! so the state machine can rely on its invariants.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::words::Difficulty;

/// Fallback pool used when a config arrives with no usable words.
/// Keeps a misconfigured lobby playable instead of undrawable.
const FALLBACK_WORDS: &[&str] = &[
    "house", "guitar", "rocket", "bridge", "pirate", "camera", "island",
    "dragon", "bicycle", "lantern",
];

/// Configuration for one lobby instance. Read-only after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Number of full rounds (every player draws once per round).
    pub max_rounds: u32,

    /// Length of the Drawing phase.
    pub draw_duration: Duration,

    /// Pause on the Revealing phase before the next turn starts.
    pub reveal_delay: Duration,

    /// Smallest accepted brush diameter.
    pub min_brush_size: u8,

    /// Largest accepted brush diameter.
    pub max_brush_size: u8,

    /// Brush sizes offered by the client UI. Kept sorted ascending and
    /// within `[min_brush_size, max_brush_size]` by validation.
    pub suggested_brush_sizes: Vec<u8>,

    /// Words the selector draws from.
    pub word_pool: Vec<String>,

    /// Restrict the pool to one difficulty bucket. `None` uses every
    /// word. A filter that matches nothing is ignored by the selector.
    pub word_difficulty: Option<Difficulty>,

    /// Players required before the game can start.
    pub min_players_to_start: usize,

    /// Hard cap on lobby membership.
    pub max_players: usize,

    /// Start automatically once `min_players_to_start` is reached,
    /// instead of waiting for the host's explicit start.
    pub auto_start: bool,

    /// How long a disconnected player stays in the rotation before being
    /// removed for good.
    pub disconnect_grace: Duration,

    /// How long an empty lobby lingers before its actor shuts down.
    pub empty_timeout: Duration,

    /// Fixed word-selector seed. `None` (production) seeds from entropy
    /// per lobby; tests pin this for reproducible draws.
    pub word_seed: Option<u64>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            draw_duration: Duration::from_secs(80),
            reveal_delay: Duration::from_secs(3),
            min_brush_size: 1,
            max_brush_size: 40,
            suggested_brush_sizes: vec![4, 8, 16, 32],
            word_pool: FALLBACK_WORDS.iter().map(|w| (*w).to_string()).collect(),
            word_difficulty: None,
            min_players_to_start: 2,
            max_players: 8,
            auto_start: false,
            disconnect_grace: Duration::from_secs(30),
            empty_timeout: Duration::from_secs(60),
            word_seed: None,
        }
    }
}

impl LobbyConfig {
    /// Shortest Drawing phase the engine accepts.
    pub const MIN_DRAW_DURATION: Duration = Duration::from_secs(5);

    /// Clamps and fixes any out-of-range values so the config is safe
    /// for the state machine to rely on.
    ///
    /// Rules:
    /// - `max_rounds` at least 1; `min_players_to_start` at least 2;
    ///   `max_players` at least `min_players_to_start`.
    /// - `draw_duration` at least [`Self::MIN_DRAW_DURATION`].
    /// - Brush bounds swapped if inverted; suggested sizes filtered to
    ///   the legal range, sorted ascending, deduplicated.
    /// - An empty word pool is replaced with a small built-in fallback.
    pub fn validated(mut self) -> Self {
        if self.max_rounds == 0 {
            warn!("max_rounds of 0 — clamping to 1");
            self.max_rounds = 1;
        }
        if self.min_players_to_start < 2 {
            warn!(
                min = self.min_players_to_start,
                "min_players_to_start below 2 — clamping"
            );
            self.min_players_to_start = 2;
        }
        if self.max_players < self.min_players_to_start {
            warn!(
                max = self.max_players,
                min = self.min_players_to_start,
                "max_players below min_players_to_start — raising"
            );
            self.max_players = self.min_players_to_start;
        }
        if self.draw_duration < Self::MIN_DRAW_DURATION {
            warn!(duration = ?self.draw_duration, "draw_duration too short — clamping");
            self.draw_duration = Self::MIN_DRAW_DURATION;
        }

        if self.min_brush_size > self.max_brush_size {
            warn!(
                min = self.min_brush_size,
                max = self.max_brush_size,
                "brush bounds inverted — swapping"
            );
            std::mem::swap(&mut self.min_brush_size, &mut self.max_brush_size);
        }
        self.suggested_brush_sizes
            .retain(|s| (self.min_brush_size..=self.max_brush_size).contains(s));
        self.suggested_brush_sizes.sort_unstable();
        self.suggested_brush_sizes.dedup();

        self.word_pool.retain(|w| !w.trim().is_empty());
        if self.word_pool.is_empty() {
            warn!("empty word pool — substituting built-in fallback list");
            self.word_pool =
                FALLBACK_WORDS.iter().map(|w| (*w).to_string()).collect();
        }

        self
    }

    /// Returns `true` if `size` is an acceptable brush diameter.
    pub fn brush_size_ok(&self, size: u8) -> bool {
        (self.min_brush_size..=self.max_brush_size).contains(&size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_already_valid() {
        let config = LobbyConfig::default();
        let validated = config.clone().validated();
        assert_eq!(config.max_rounds, validated.max_rounds);
        assert_eq!(
            config.suggested_brush_sizes,
            validated.suggested_brush_sizes
        );
    }

    #[test]
    fn test_suggested_sizes_sorted_and_in_bounds() {
        let config = LobbyConfig {
            min_brush_size: 4,
            max_brush_size: 20,
            suggested_brush_sizes: vec![32, 8, 2, 16, 8],
            ..LobbyConfig::default()
        }
        .validated();

        let sizes = &config.suggested_brush_sizes;
        assert_eq!(sizes, &vec![8, 16]);
        assert!(sizes.windows(2).all(|w| w[0] < w[1]));
        assert!(sizes
            .iter()
            .all(|s| (config.min_brush_size..=config.max_brush_size).contains(s)));
    }

    #[test]
    fn test_inverted_brush_bounds_are_swapped() {
        let config = LobbyConfig {
            min_brush_size: 30,
            max_brush_size: 2,
            ..LobbyConfig::default()
        }
        .validated();
        assert_eq!(config.min_brush_size, 2);
        assert_eq!(config.max_brush_size, 30);
    }

    #[test]
    fn test_zero_rounds_clamped_to_one() {
        let config = LobbyConfig {
            max_rounds: 0,
            ..LobbyConfig::default()
        }
        .validated();
        assert_eq!(config.max_rounds, 1);
    }

    #[test]
    fn test_empty_word_pool_gets_fallback() {
        let config = LobbyConfig {
            word_pool: vec!["   ".into(), String::new()],
            ..LobbyConfig::default()
        }
        .validated();
        assert!(!config.word_pool.is_empty());
    }

    #[test]
    fn test_max_players_raised_to_min() {
        let config = LobbyConfig {
            min_players_to_start: 4,
            max_players: 2,
            ..LobbyConfig::default()
        }
        .validated();
        assert_eq!(config.max_players, 4);
    }

    #[test]
    fn test_brush_size_ok() {
        let config = LobbyConfig::default();
        assert!(config.brush_size_ok(1));
        assert!(config.brush_size_ok(40));
        assert!(!config.brush_size_ok(0));
        assert!(!config.brush_size_ok(41));
    }
}
