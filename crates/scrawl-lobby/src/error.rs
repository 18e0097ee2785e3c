//! Error types for the lobby layer.
//!
//! These cover the few failures a caller actually sees (join rejection,
//! dead actors). In-game protocol violations are not errors — the state
//! machine drops them with a logged rejection.

use scrawl_protocol::{LobbyId, PlayerId};

/// Errors that can occur during lobby operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The lobby does not exist.
    #[error("lobby {0} not found")]
    NotFound(LobbyId),

    /// The lobby has no free player slots.
    #[error("lobby {0} is full")]
    LobbyFull(LobbyId),

    /// The game in this lobby is over; no new players are admitted.
    #[error("lobby {0} has finished")]
    Finished(LobbyId),

    /// The player is already a member of this lobby.
    #[error("player {0} already in lobby {1}")]
    AlreadyJoined(PlayerId, LobbyId),

    /// The player is not a member of this lobby.
    #[error("player {0} not in lobby {1}")]
    NotJoined(PlayerId, LobbyId),

    /// The player is not in any lobby (registry routing).
    #[error("player {0} is not in any lobby")]
    NoLobby(PlayerId),

    /// The lobby's actor has shut down or its command queue is gone.
    #[error("lobby {0} is unavailable")]
    Unavailable(LobbyId),
}
