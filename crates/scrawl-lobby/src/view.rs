//! The broadcast/diff layer.
//!
//! The lobby actor takes a [`Snapshot`] of its public state after every
//! command and hands the previous/next pair to [`diff`], which emits the
//! minimal events clients need to reconstruct the new state. Events that
//! are not derivable from state (guess results, word reveals, countdown
//! ticks) are queued by the actor directly and travel through the same
//! outbox.
//!
//! The secret word never lives in a snapshot. It is injected per
//! recipient by [`render`]: the drawer sees it while the turn is open,
//! everyone sees it during Revealing, and non-drawers otherwise get the
//! masked hint only.

use scrawl_protocol::{
    Event, LobbyId, LobbyView, Phase, PlayerId, PlayerInfo, Stroke,
};

/// The public state of a lobby at one point in time.
///
/// Holds no authoritative data — it is a read-only copy the actor hands
/// to the broadcast layer. Deliberately excludes the secret word.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub lobby_id: LobbyId,
    pub phase: Phase,
    pub round: u32,
    pub max_rounds: u32,
    pub host: Option<PlayerId>,
    pub drawer: Option<PlayerId>,
    pub word_hint: Option<String>,
    /// Players in join order.
    pub players: Vec<PlayerInfo>,
    pub strokes: Vec<Stroke>,
}

impl Snapshot {
    /// An empty snapshot for a lobby that has just been created.
    pub fn empty(lobby_id: LobbyId, max_rounds: u32) -> Self {
        Self {
            lobby_id,
            phase: Phase::Waiting,
            round: 0,
            max_rounds,
            host: None,
            drawer: None,
            word_hint: None,
            players: Vec::new(),
            strokes: Vec::new(),
        }
    }

    fn player(&self, id: PlayerId) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.player_id == id)
    }
}

/// Emits the minimal events that take a client from `prev` to `next`.
///
/// Covers everything reconstructible from state: membership, host, phase,
/// scores, and the stroke log. Cause-specific events (guess results,
/// reveals) are the actor's job.
pub fn diff(prev: &Snapshot, next: &Snapshot) -> Vec<Event> {
    let mut events = Vec::new();

    // Joins: present now, absent before.
    for p in &next.players {
        if prev.player(p.player_id).is_none() {
            events.push(Event::PlayerJoined {
                player_id: p.player_id,
                name: p.name.clone(),
            });
        }
    }

    // Leaves: present before, absent now.
    for p in &prev.players {
        if next.player(p.player_id).is_none() {
            events.push(Event::PlayerLeft {
                player_id: p.player_id,
            });
        }
    }

    // Connectivity transitions for players present in both snapshots.
    for p in &next.players {
        if let Some(q) = prev.player(p.player_id) {
            if q.connected && !p.connected {
                events.push(Event::PlayerDisconnected {
                    player_id: p.player_id,
                });
            } else if !q.connected && p.connected {
                events.push(Event::PlayerReconnected {
                    player_id: p.player_id,
                });
            }
        }
    }

    if prev.host != next.host {
        if let Some(host) = next.host {
            events.push(Event::HostChanged { player_id: host });
        }
    }

    if prev.phase != next.phase {
        events.push(Event::PhaseChanged { phase: next.phase });
    }

    // Score changes, including players that just joined (score 0 joins
    // emit nothing — PlayerJoined already implies it).
    for p in &next.players {
        let prev_score = prev.player(p.player_id).map_or(0, |q| q.score);
        if p.score != prev_score {
            events.push(Event::ScoreUpdate {
                player_id: p.player_id,
                score: p.score,
            });
        }
    }

    // Stroke log: grew → the suffix was appended; shrank → the canvas
    // was wiped (a single command never does both).
    if next.strokes.len() < prev.strokes.len() {
        events.push(Event::CanvasCleared);
    } else {
        for stroke in &next.strokes[prev.strokes.len()..] {
            events.push(Event::StrokeAppended {
                stroke: stroke.clone(),
            });
        }
    }

    events
}

/// Renders the snapshot as seen by `viewer`, applying word redaction.
///
/// `word` is the current secret (if a turn is open). It is included only
/// when `viewer` is the drawer during Selecting/Drawing, or for everyone
/// during Revealing.
pub fn render(
    snapshot: &Snapshot,
    word: Option<&str>,
    viewer: PlayerId,
) -> LobbyView {
    let word_visible = match snapshot.phase {
        Phase::Revealing => true,
        Phase::Selecting | Phase::Drawing => snapshot.drawer == Some(viewer),
        Phase::Waiting | Phase::Finished => false,
    };

    LobbyView {
        lobby_id: snapshot.lobby_id,
        phase: snapshot.phase,
        round: snapshot.round,
        max_rounds: snapshot.max_rounds,
        host: snapshot.host,
        drawer: snapshot.drawer,
        word: if word_visible {
            word.map(str::to_string)
        } else {
            None
        },
        word_hint: snapshot.word_hint.clone(),
        players: snapshot.players.clone(),
        strokes: snapshot.strokes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: u64, score: u32) -> PlayerInfo {
        PlayerInfo {
            player_id: PlayerId(id),
            name: format!("player-{id}"),
            score,
            connected: true,
            has_guessed: false,
        }
    }

    fn base() -> Snapshot {
        Snapshot {
            players: vec![info(1, 0), info(2, 0)],
            host: Some(PlayerId(1)),
            ..Snapshot::empty(LobbyId(1), 3)
        }
    }

    fn stroke() -> Stroke {
        Stroke {
            points: vec![],
            color: 0,
            brush_size: 8,
        }
    }

    #[test]
    fn test_diff_identical_snapshots_is_empty() {
        let s = base();
        assert!(diff(&s, &s).is_empty());
    }

    #[test]
    fn test_diff_detects_join() {
        let prev = base();
        let mut next = base();
        next.players.push(info(3, 0));

        let events = diff(&prev, &next);
        assert_eq!(
            events,
            vec![Event::PlayerJoined {
                player_id: PlayerId(3),
                name: "player-3".into()
            }]
        );
    }

    #[test]
    fn test_diff_detects_leave_and_host_change() {
        let prev = base();
        let mut next = base();
        next.players.remove(0);
        next.host = Some(PlayerId(2));

        let events = diff(&prev, &next);
        assert!(events.contains(&Event::PlayerLeft {
            player_id: PlayerId(1)
        }));
        assert!(events.contains(&Event::HostChanged {
            player_id: PlayerId(2)
        }));
    }

    #[test]
    fn test_diff_detects_connectivity_transitions() {
        let prev = base();
        let mut next = base();
        next.players[1].connected = false;

        let events = diff(&prev, &next);
        assert_eq!(
            events,
            vec![Event::PlayerDisconnected {
                player_id: PlayerId(2)
            }]
        );

        let back = diff(&next, &prev);
        assert_eq!(
            back,
            vec![Event::PlayerReconnected {
                player_id: PlayerId(2)
            }]
        );
    }

    #[test]
    fn test_diff_detects_phase_and_score() {
        let prev = base();
        let mut next = base();
        next.phase = Phase::Drawing;
        next.players[1].score = 250;

        let events = diff(&prev, &next);
        assert!(events.contains(&Event::PhaseChanged {
            phase: Phase::Drawing
        }));
        assert!(events.contains(&Event::ScoreUpdate {
            player_id: PlayerId(2),
            score: 250
        }));
    }

    #[test]
    fn test_diff_appended_strokes() {
        let mut prev = base();
        prev.strokes.push(stroke());
        let mut next = prev.clone();
        next.strokes.push(stroke());
        next.strokes.push(stroke());

        let events = diff(&prev, &next);
        let appended = events
            .iter()
            .filter(|e| matches!(e, Event::StrokeAppended { .. }))
            .count();
        assert_eq!(appended, 2);
    }

    #[test]
    fn test_diff_cleared_canvas() {
        let mut prev = base();
        prev.strokes.push(stroke());
        let mut next = prev.clone();
        next.strokes.clear();

        let events = diff(&prev, &next);
        assert_eq!(events, vec![Event::CanvasCleared]);
    }

    #[test]
    fn test_render_redacts_word_from_non_drawer_while_drawing() {
        let mut s = base();
        s.phase = Phase::Drawing;
        s.drawer = Some(PlayerId(1));
        s.word_hint = Some("b _ _".into());

        let guesser_view = render(&s, Some("bat"), PlayerId(2));
        assert_eq!(guesser_view.word, None);
        assert_eq!(guesser_view.word_hint.as_deref(), Some("b _ _"));

        let drawer_view = render(&s, Some("bat"), PlayerId(1));
        assert_eq!(drawer_view.word.as_deref(), Some("bat"));
    }

    #[test]
    fn test_render_reveals_word_to_everyone_in_revealing() {
        let mut s = base();
        s.phase = Phase::Revealing;
        s.drawer = Some(PlayerId(1));

        let view = render(&s, Some("bat"), PlayerId(2));
        assert_eq!(view.word.as_deref(), Some("bat"));
    }

    #[test]
    fn test_render_no_word_outside_turn() {
        let s = base();
        let view = render(&s, None, PlayerId(1));
        assert_eq!(view.word, None);
        assert_eq!(view.word_hint, None);
    }
}
