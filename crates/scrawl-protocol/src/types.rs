//! Core protocol types.
//!
//! Everything here is serializable: these are the structures that cross the
//! boundary between the lobby engine and the transport layer. Inbound
//! traffic is a [`Command`], outbound traffic is an [`Event`], and each
//! outbound event is paired with a [`Recipient`] telling the broadcast
//! layer who may see it.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Supplied by the transport layer and stable across reconnects — the
/// engine never derives or recycles these. Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a lobby (one game session instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub u64);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase — the turn state machine
// ---------------------------------------------------------------------------

/// The current stage of a lobby's turn state machine.
///
/// ```text
/// Waiting → Selecting → Drawing → Revealing ──→ Selecting (next turn)
///                                     │
///                                     └──→ Finished (after max rounds)
/// ```
///
/// - **Waiting**: lobby exists, players can join, no game running.
/// - **Selecting**: a drawer has been chosen and a word is being drawn
///   from the pool.
/// - **Drawing**: the drawer is drawing; guesses are accepted.
/// - **Revealing**: the word is shown to everyone; scores settle before
///   the next turn.
/// - **Finished**: all rounds complete. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Waiting,
    Selecting,
    Drawing,
    Revealing,
    Finished,
}

impl Phase {
    /// Returns `true` while a turn is in flight — exactly the phases in
    /// which the lobby holds a secret word.
    pub fn in_turn(&self) -> bool {
        matches!(self, Self::Selecting | Self::Drawing | Self::Revealing)
    }

    /// Returns `true` once the lobby can never run another turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "Waiting",
            Self::Selecting => "Selecting",
            Self::Drawing => "Drawing",
            Self::Revealing => "Revealing",
            Self::Finished => "Finished",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive an outbound event.
///
/// The lobby engine pairs every [`Event`] with one of these; the broadcast
/// layer resolves it against the current player set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the lobby.
    All,

    /// One specific player (e.g. the drawer's secret word).
    Player(PlayerId),

    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Stroke data
// ---------------------------------------------------------------------------

/// A single point on the canvas, in client canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One drawing stroke: a polyline with a color and brush size.
///
/// The engine treats stroke contents as opaque apart from `brush_size`,
/// which is validated against the configured bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// The points of the stroke, in draw order.
    pub points: Vec<Point>,
    /// Packed RGB color.
    pub color: u32,
    /// Brush diameter in canvas pixels.
    pub brush_size: u8,
}

// ---------------------------------------------------------------------------
// Command — inbound traffic from the transport layer
// ---------------------------------------------------------------------------

/// An inbound command delivered by the transport layer.
///
/// Every variant carries the sending player's id so the state machine can
/// authorize it against the current phase and drawer. Commands in the
/// wrong phase or from the wrong player are dropped, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// A player wants to enter the lobby.
    Join { player_id: PlayerId, name: String },

    /// A player is leaving for good (distinct from a connection drop).
    Leave { player_id: PlayerId },

    /// Request to start the game. Only honored from the host while the
    /// lobby is Waiting with enough players.
    Start { player_id: PlayerId },

    /// A guess at the current word. Compared trim- and case-insensitively.
    Guess { player_id: PlayerId, text: String },

    /// A drawing stroke. Only accepted from the current drawer.
    Stroke { player_id: PlayerId, stroke: Stroke },

    /// Wipe the canvas for the current turn. Drawer only.
    ClearCanvas { player_id: PlayerId },

    /// A previously disconnected player is back on a new connection.
    Reconnect { player_id: PlayerId },
}

impl Command {
    /// The player this command claims to be from.
    pub fn player_id(&self) -> PlayerId {
        match self {
            Self::Join { player_id, .. }
            | Self::Leave { player_id }
            | Self::Start { player_id }
            | Self::Guess { player_id, .. }
            | Self::Stroke { player_id, .. }
            | Self::ClearCanvas { player_id }
            | Self::Reconnect { player_id } => *player_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-player lobby view
// ---------------------------------------------------------------------------

/// Public facts about one player, as seen by every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
    pub connected: bool,
    pub has_guessed: bool,
}

/// A lobby snapshot as rendered for one specific recipient.
///
/// `word` is populated only when this recipient is allowed to see it: the
/// current drawer during Selecting/Drawing, everyone during Revealing.
/// All other recipients get the masked `word_hint` instead — the secret
/// never appears in a non-drawer view while guessing is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyView {
    pub lobby_id: LobbyId,
    pub phase: Phase,
    pub round: u32,
    pub max_rounds: u32,
    pub host: Option<PlayerId>,
    pub drawer: Option<PlayerId>,
    pub word: Option<String>,
    pub word_hint: Option<String>,
    /// Players in join order (also the drawer rotation order).
    pub players: Vec<PlayerInfo>,
    /// The current turn's stroke log, replayable by late joiners.
    pub strokes: Vec<Stroke>,
}

/// One row of the end-of-game standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
}

// ---------------------------------------------------------------------------
// Event — outbound traffic to the transport layer
// ---------------------------------------------------------------------------

/// An outbound event produced by the lobby engine.
///
/// Clients reconstruct lobby state from a [`LobbyView`] snapshot plus the
/// stream of these events; the broadcast layer guarantees every event from
/// one command is emitted before the next command is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Full per-recipient snapshot, sent on join and reconnect.
    LobbySnapshot { view: LobbyView },

    /// A player entered the lobby.
    PlayerJoined { player_id: PlayerId, name: String },

    /// A player left (explicitly or via grace-period expiry).
    PlayerLeft { player_id: PlayerId },

    /// A player's connection dropped; they stay in the rotation until
    /// the grace period runs out.
    PlayerDisconnected { player_id: PlayerId },

    /// A disconnected player came back on a new connection.
    PlayerReconnected { player_id: PlayerId },

    /// The lobby host changed (previous host left).
    HostChanged { player_id: PlayerId },

    /// The turn state machine advanced.
    PhaseChanged { phase: Phase },

    /// A new turn began: who draws, and the masked word shape.
    TurnStarted {
        drawer: PlayerId,
        round: u32,
        turn: u32,
        word_hint: String,
        seconds: u64,
    },

    /// The secret word, sent to the drawer only.
    WordAssigned { word: String },

    /// The word revealed to everyone at the end of a turn.
    WordRevealed { word: String },

    /// Somebody guessed correctly. The word itself is withheld so the
    /// turn stays playable for the others.
    GuessResult { player_id: PlayerId, correct: bool },

    /// An incorrect guess, relayed as ordinary chat.
    Chat { player_id: PlayerId, text: String },

    /// A player's score changed.
    ScoreUpdate { player_id: PlayerId, score: u32 },

    /// The drawer appended a stroke.
    StrokeAppended { stroke: Stroke },

    /// The drawer wiped the canvas.
    CanvasCleared,

    /// Per-second countdown during the Drawing phase.
    TimerTick { seconds_remaining: u64 },

    /// Final standings after the last round.
    GameSummary {
        standings: Vec<Standing>,
        winner: Option<PlayerId>,
    },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is internally tagged JSON; these tests pin the
    //! exact shapes so a client SDK can rely on them.

    use super::*;

    fn stroke() -> Stroke {
        Stroke {
            points: vec![Point { x: 1.0, y: 2.0 }, Point { x: 3.0, y: 4.0 }],
            color: 0x00FF_0000,
            brush_size: 8,
        }
    }

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_lobby_id_round_trip() {
        let id: LobbyId = serde_json::from_str("7").unwrap();
        assert_eq!(id, LobbyId(7));
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PlayerId(3).to_string(), "P-3");
        assert_eq!(LobbyId(12).to_string(), "L-12");
    }

    // =====================================================================
    // Phase
    // =====================================================================

    #[test]
    fn test_phase_in_turn_matches_word_holding_phases() {
        assert!(!Phase::Waiting.in_turn());
        assert!(Phase::Selecting.in_turn());
        assert!(Phase::Drawing.in_turn());
        assert!(Phase::Revealing.in_turn());
        assert!(!Phase::Finished.in_turn());
    }

    #[test]
    fn test_phase_terminal() {
        assert!(Phase::Finished.is_terminal());
        assert!(!Phase::Revealing.is_terminal());
    }

    // =====================================================================
    // Command
    // =====================================================================

    #[test]
    fn test_command_join_json_format() {
        let cmd = Command::Join {
            player_id: PlayerId(1),
            name: "ada".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "Join");
        assert_eq!(json["player_id"], 1);
        assert_eq!(json["name"], "ada");
    }

    #[test]
    fn test_command_guess_round_trip() {
        let cmd = Command::Guess {
            player_id: PlayerId(2),
            text: "  Banana ".into(),
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: Command = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_command_stroke_round_trip() {
        let cmd = Command::Stroke {
            player_id: PlayerId(3),
            stroke: stroke(),
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: Command = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_command_player_id_covers_all_variants() {
        let cmds = [
            Command::Join { player_id: PlayerId(9), name: "x".into() },
            Command::Leave { player_id: PlayerId(9) },
            Command::Start { player_id: PlayerId(9) },
            Command::Guess { player_id: PlayerId(9), text: "y".into() },
            Command::Stroke { player_id: PlayerId(9), stroke: stroke() },
            Command::ClearCanvas { player_id: PlayerId(9) },
            Command::Reconnect { player_id: PlayerId(9) },
        ];
        for cmd in cmds {
            assert_eq!(cmd.player_id(), PlayerId(9));
        }
    }

    #[test]
    fn test_decode_unknown_command_type_returns_error() {
        let unknown = r#"{"type": "Teleport", "player_id": 1}"#;
        let result: Result<Command, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    // =====================================================================
    // Event
    // =====================================================================

    #[test]
    fn test_event_guess_result_json_format() {
        let ev = Event::GuessResult {
            player_id: PlayerId(5),
            correct: true,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "GuessResult");
        assert_eq!(json["player_id"], 5);
        assert_eq!(json["correct"], true);
    }

    #[test]
    fn test_event_turn_started_round_trip() {
        let ev = Event::TurnStarted {
            drawer: PlayerId(1),
            round: 2,
            turn: 5,
            word_hint: "b _ _ _ _ _".into(),
            seconds: 80,
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: Event = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_event_snapshot_round_trip() {
        let ev = Event::LobbySnapshot {
            view: LobbyView {
                lobby_id: LobbyId(1),
                phase: Phase::Drawing,
                round: 1,
                max_rounds: 3,
                host: Some(PlayerId(1)),
                drawer: Some(PlayerId(2)),
                word: None,
                word_hint: Some("a _ _".into()),
                players: vec![PlayerInfo {
                    player_id: PlayerId(1),
                    name: "ada".into(),
                    score: 150,
                    connected: true,
                    has_guessed: false,
                }],
                strokes: vec![stroke()],
            },
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: Event = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_event_game_summary_round_trip() {
        let ev = Event::GameSummary {
            standings: vec![
                Standing { player_id: PlayerId(2), name: "bob".into(), score: 420 },
                Standing { player_id: PlayerId(1), name: "ada".into(), score: 300 },
            ],
            winner: Some(PlayerId(2)),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: Event = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<Event, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }
}
