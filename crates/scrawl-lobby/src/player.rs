//! Player sessions.
//!
//! A session is the lobby's record of one player: a stable identity, a
//! score, a connectivity state, and the per-turn guess flags. Connection
//! and identity are deliberately separate concerns — a reconnect swaps the
//! outbound channel underneath the same [`PlayerSession`] without touching
//! score or rotation position.

use std::time::Duration;

use scrawl_protocol::{Event, PlayerId, PlayerInfo};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Channel sender for delivering outbound events to a player.
///
/// Bounded: a slow consumer fills it up and is treated as disconnected
/// instead of stalling the lobby loop.
pub type EventSender = mpsc::Sender<Event>;

/// Connectivity of a player within a lobby.
///
/// ```text
///   Connected ──(transport drop)──→ Disconnected ──(grace elapsed)──→ Left
///       ↑                                │
///       └───────────(reconnect)──────────┘
/// ```
///
/// Disconnected players keep their place in the drawer rotation until the
/// grace period runs out; Left players are removed and never rotate back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Actively connected; events are deliverable.
    Connected,

    /// Connection dropped at `since`; the player may still come back.
    Disconnected { since: Instant },

    /// Gone for good (explicit leave or grace expiry).
    Left,
}

/// One player's state within a lobby.
#[derive(Debug)]
pub struct PlayerSession {
    /// Stable identity, supplied by the transport layer.
    pub id: PlayerId,

    /// Display name shown to other players.
    pub name: String,

    /// Total score. Only ever increases within a game.
    pub score: u32,

    /// Current connectivity.
    pub connection: ConnectionState,

    /// Whether this player already solved the current turn's word.
    /// Reset at every turn start; guards against double-scoring.
    pub has_guessed_this_turn: bool,

    /// Whether this player takes part in the current turn's scoring.
    /// Players who join mid-turn sit the rest of that turn out.
    pub eligible_this_turn: bool,

    sender: EventSender,
}

impl PlayerSession {
    /// Creates a freshly joined, connected session with zero score.
    pub fn new(id: PlayerId, name: String, sender: EventSender) -> Self {
        Self {
            id,
            name,
            score: 0,
            connection: ConnectionState::Connected,
            has_guessed_this_turn: false,
            eligible_this_turn: false,
            sender,
        }
    }

    /// Adds points to the score. Scores never decrease, so this is the
    /// only mutation.
    pub fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Resets the per-turn flags at the start of a turn.
    pub fn begin_turn(&mut self, eligible: bool) {
        self.has_guessed_this_turn = false;
        self.eligible_this_turn = eligible;
    }

    /// Whether events can currently be delivered.
    pub fn is_connected(&self) -> bool {
        matches!(self.connection, ConnectionState::Connected)
    }

    /// Whether this player still occupies a slot in the drawer rotation:
    /// connected, or disconnected with the grace period not yet elapsed.
    pub fn in_rotation(&self, grace: Duration) -> bool {
        match self.connection {
            ConnectionState::Connected => true,
            ConnectionState::Disconnected { since } => since.elapsed() <= grace,
            ConnectionState::Left => false,
        }
    }

    /// Marks the connection as dropped, starting the grace period.
    /// No-op if the player is already disconnected or gone.
    pub fn mark_disconnected(&mut self) {
        if matches!(self.connection, ConnectionState::Connected) {
            self.connection = ConnectionState::Disconnected {
                since: Instant::now(),
            };
        }
    }

    /// Swaps in a new outbound channel on reconnect.
    pub fn reconnect(&mut self, sender: EventSender) {
        self.sender = sender;
        self.connection = ConnectionState::Connected;
    }

    /// Attempts to deliver an event without blocking.
    pub fn try_send(
        &self,
        event: Event,
    ) -> Result<(), mpsc::error::TrySendError<Event>> {
        self.sender.try_send(event)
    }

    /// The public projection of this session, as serialized to clients.
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            player_id: self.id,
            name: self.name.clone(),
            score: self.score,
            connected: self.is_connected(),
            has_guessed: self.has_guessed_this_turn,
        }
    }
}
