//! Lobby actor: an isolated Tokio task that owns one game session.
//!
//! Each lobby runs in its own task, communicating with the outside world
//! through an mpsc channel — no shared mutable state, just message
//! passing. Every mutation happens inside the actor loop, so commands are
//! applied strictly in arrival order and all broadcasts caused by one
//! command are emitted before the next command is touched.
//!
//! The loop suspends on exactly three things: the command queue, the
//! [`TurnTimer`] (which drives Drawing→Revealing→next-turn transitions
//! exactly once per arming), and a one-second housekeeping tick (countdown
//! broadcast, disconnect-grace sweep, empty-lobby timeout).

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use scrawl_protocol::{
    Command, Event, LobbyId, Phase, PlayerId, Recipient, Standing, Stroke,
};
use scrawl_timer::TurnTimer;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::LobbyConfig;
use crate::error::LobbyError;
use crate::player::{EventSender, PlayerSession};
use crate::view::{self, Snapshot};
use crate::words::{self, WordSelector};
use crate::scoring;

/// Size of a lobby's inbound command queue.
const COMMAND_QUEUE_SIZE: usize = 64;

/// Commands sent to a lobby actor through its channel.
///
/// Join and Reconnect carry the player's outbound channel and a reply
/// channel, because the caller needs the admission verdict. Everything
/// else is fire-and-forget: invalid game commands are dropped inside the
/// actor, never errored back.
pub(crate) enum LobbyCommand {
    /// Admit a player.
    Join {
        player_id: PlayerId,
        name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), LobbyError>>,
    },

    /// Swap in a new connection for an existing player.
    Reconnect {
        player_id: PlayerId,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), LobbyError>>,
    },

    /// A wire command from the transport layer.
    Game { command: Command },

    /// Transport signal: a player's connection dropped (not a leave).
    Disconnected { player_id: PlayerId },

    /// Request the current lobby metadata.
    Info { reply: oneshot::Sender<LobbyInfo> },

    /// Tear the lobby down.
    Shutdown,
}

/// A snapshot of lobby metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct LobbyInfo {
    /// The lobby's unique ID.
    pub lobby_id: LobbyId,
    /// Current phase of the turn state machine.
    pub phase: Phase,
    /// Current round (0 before the game starts).
    pub round: u32,
    /// Number of players currently in the lobby.
    pub player_count: usize,
    /// Maximum players allowed.
    pub max_players: usize,
}

/// Handle to a running lobby actor. Cheap to clone.
#[derive(Clone)]
pub struct LobbyHandle {
    lobby_id: LobbyId,
    sender: mpsc::Sender<LobbyCommand>,
}

impl LobbyHandle {
    /// Returns the lobby's unique ID.
    pub fn lobby_id(&self) -> LobbyId {
        self.lobby_id
    }

    /// Asks the lobby to admit a player, registering their outbound
    /// channel. The reply carries the admission verdict.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: impl Into<String>,
        sender: EventSender,
    ) -> Result<(), LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(LobbyCommand::Join {
                player_id,
                name: name.into(),
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))?
    }

    /// Reattaches a player after a connection drop.
    pub async fn reconnect(
        &self,
        player_id: PlayerId,
        sender: EventSender,
    ) -> Result<(), LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(LobbyCommand::Reconnect {
                player_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))?
    }

    /// Delivers a wire command (fire-and-forget). Invalid commands are
    /// dropped by the state machine, not reported back.
    pub async fn command(&self, command: Command) -> Result<(), LobbyError> {
        self.sender
            .send(LobbyCommand::Game { command })
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))
    }

    /// Signals that a player's connection dropped without a leave.
    pub async fn player_disconnected(
        &self,
        player_id: PlayerId,
    ) -> Result<(), LobbyError> {
        self.sender
            .send(LobbyCommand::Disconnected { player_id })
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))
    }

    /// Requests the current lobby metadata.
    pub async fn info(&self) -> Result<LobbyInfo, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(LobbyCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))
    }

    /// Tells the lobby to shut down.
    pub async fn shutdown(&self) -> Result<(), LobbyError> {
        self.sender
            .send(LobbyCommand::Shutdown)
            .await
            .map_err(|_| LobbyError::Unavailable(self.lobby_id))
    }

    /// Whether the actor behind this handle has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// What the current turn has recorded so far; consumed by the scoring
/// path and discarded once the reveal settles.
struct TurnRecord {
    /// Correct guessers in guess order (rank = index + 1).
    correct: Vec<PlayerId>,
}

/// The internal lobby actor state. Runs inside a Tokio task.
struct LobbyActor {
    lobby_id: LobbyId,
    config: LobbyConfig,
    phase: Phase,
    /// All present players, keyed by id. Left players are removed.
    players: HashMap<PlayerId, PlayerSession>,
    /// Player ids in join order — this is the drawer rotation order.
    join_order: Vec<PlayerId>,
    host: Option<PlayerId>,
    drawer: Option<PlayerId>,
    /// The secret. `Some` iff `phase.in_turn()`.
    word: Option<String>,
    word_hint: Option<String>,
    round: u32,
    /// Total turns started this game.
    turn: u32,
    /// Who has already drawn in the current round.
    drawn_this_round: HashSet<PlayerId>,
    stroke_log: Vec<Stroke>,
    turn_record: Option<TurnRecord>,
    timer: TurnTimer,
    selector: WordSelector,
    receiver: mpsc::Receiver<LobbyCommand>,
    /// Cause-specific events queued during command handling, flushed
    /// together with the snapshot diff.
    outbox: Vec<(Recipient, Event)>,
    last_snapshot: Snapshot,
    empty_since: Option<Instant>,
}

impl LobbyActor {
    /// Runs the actor loop until shutdown or the empty timeout.
    async fn run(mut self) {
        info!(lobby_id = %self.lobby_id, "lobby actor started");

        let mut housekeeping = time::interval(Duration::from_secs(1));
        housekeeping.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(LobbyCommand::Shutdown) | None => {
                            info!(lobby_id = %self.lobby_id, "lobby shutting down");
                            break;
                        }
                        Some(cmd) => {
                            self.handle_command(cmd);
                            self.flush();
                        }
                    }
                }
                () = self.timer.expired() => {
                    self.on_timer_expired();
                    self.flush();
                }
                _ = housekeeping.tick() => {
                    let done = self.on_housekeeping();
                    self.flush();
                    if done {
                        break;
                    }
                }
            }
        }

        info!(lobby_id = %self.lobby_id, "lobby actor stopped");
    }

    fn handle_command(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Join { player_id, name, sender, reply } => {
                let result = self.handle_join(player_id, name, sender);
                let _ = reply.send(result);
            }
            LobbyCommand::Reconnect { player_id, sender, reply } => {
                let result = self.handle_reconnect(player_id, sender);
                let _ = reply.send(result);
            }
            LobbyCommand::Game { command } => self.handle_game_command(command),
            LobbyCommand::Disconnected { player_id } => {
                self.handle_disconnected(player_id);
            }
            LobbyCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            // Shutdown is intercepted by the run loop.
            LobbyCommand::Shutdown => {}
        }
    }

    fn handle_game_command(&mut self, command: Command) {
        match command {
            // These need an outbound channel and a reply; they only make
            // sense through the dedicated handle methods.
            Command::Join { player_id, .. } | Command::Reconnect { player_id } => {
                debug!(
                    lobby_id = %self.lobby_id,
                    %player_id,
                    "join/reconnect without a channel on the command path — dropped"
                );
            }
            Command::Leave { player_id } => {
                self.remove_player(player_id, "left");
            }
            Command::Start { player_id } => self.handle_start(player_id),
            Command::Guess { player_id, text } => {
                self.handle_guess(player_id, text);
            }
            Command::Stroke { player_id, stroke } => {
                self.handle_stroke(player_id, stroke);
            }
            Command::ClearCanvas { player_id } => {
                self.handle_clear_canvas(player_id);
            }
        }
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        sender: EventSender,
    ) -> Result<(), LobbyError> {
        if self.phase.is_terminal() {
            return Err(LobbyError::Finished(self.lobby_id));
        }
        if self.players.contains_key(&player_id) {
            return Err(LobbyError::AlreadyJoined(player_id, self.lobby_id));
        }
        if self.players.len() >= self.config.max_players {
            return Err(LobbyError::LobbyFull(self.lobby_id));
        }

        // Mid-turn joiners sit the current turn out: they keep score 0
        // and their guesses don't count until the next turn starts.
        let session = PlayerSession::new(player_id, name, sender);
        self.players.insert(player_id, session);
        self.join_order.push(player_id);
        self.empty_since = None;

        if self.host.is_none() {
            self.host = Some(player_id);
        }

        info!(
            lobby_id = %self.lobby_id,
            %player_id,
            players = self.players.len(),
            "player joined"
        );

        self.push_snapshot_to(player_id);

        if self.config.auto_start
            && self.phase == Phase::Waiting
            && self.connected_count() >= self.config.min_players_to_start
        {
            self.start_game();
        }

        Ok(())
    }

    fn handle_reconnect(
        &mut self,
        player_id: PlayerId,
        sender: EventSender,
    ) -> Result<(), LobbyError> {
        let Some(session) = self.players.get_mut(&player_id) else {
            // Either never joined, or the grace period already removed
            // them — a fresh Join is required then.
            return Err(LobbyError::NotJoined(player_id, self.lobby_id));
        };

        session.reconnect(sender);
        info!(lobby_id = %self.lobby_id, %player_id, "player reconnected");

        // Replay: the snapshot carries the full stroke log of the turn.
        self.push_snapshot_to(player_id);
        Ok(())
    }

    fn handle_disconnected(&mut self, player_id: PlayerId) {
        let Some(session) = self.players.get_mut(&player_id) else {
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                "disconnect signal for unknown player — dropped"
            );
            return;
        };
        session.mark_disconnected();
        info!(
            lobby_id = %self.lobby_id,
            %player_id,
            "player disconnected, grace period started"
        );
    }

    /// Removes a player for good: explicit leave or grace expiry.
    fn remove_player(&mut self, player_id: PlayerId, reason: &str) {
        if self.players.remove(&player_id).is_none() {
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                "removal of unknown player — dropped"
            );
            return;
        }
        self.join_order.retain(|id| *id != player_id);
        self.drawn_this_round.remove(&player_id);

        info!(
            lobby_id = %self.lobby_id,
            %player_id,
            reason,
            players = self.players.len(),
            "player removed"
        );

        if self.host == Some(player_id) {
            self.host = self.join_order.first().copied();
        }

        if self.drawer == Some(player_id) && self.phase == Phase::Drawing {
            // The turn cannot continue without its drawer.
            self.begin_reveal("drawer gone");
            self.drawer = None;
        } else if self.phase == Phase::Drawing {
            // A departing guesser may have been the last one missing.
            self.maybe_complete_turn();
        }
    }

    // -----------------------------------------------------------------
    // Game start
    // -----------------------------------------------------------------

    fn handle_start(&mut self, player_id: PlayerId) {
        if self.phase != Phase::Waiting {
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                phase = %self.phase,
                "start outside Waiting — dropped"
            );
            return;
        }
        if self.host != Some(player_id) {
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                "start from non-host — dropped"
            );
            return;
        }
        if self.connected_count() < self.config.min_players_to_start {
            debug!(
                lobby_id = %self.lobby_id,
                players = self.connected_count(),
                needed = self.config.min_players_to_start,
                "start without enough players — dropped"
            );
            return;
        }
        self.start_game();
    }

    fn start_game(&mut self) {
        info!(
            lobby_id = %self.lobby_id,
            players = self.players.len(),
            rounds = self.config.max_rounds,
            "game starting"
        );
        self.round = 1;
        self.turn = 0;
        self.drawn_this_round.clear();
        for session in self.players.values_mut() {
            session.score = 0;
        }
        self.begin_next_turn();
    }

    // -----------------------------------------------------------------
    // Turn lifecycle
    // -----------------------------------------------------------------

    /// Picks the next drawer and opens a new turn, or finishes the game
    /// when the rotation has run its course.
    fn begin_next_turn(&mut self) {
        self.clear_turn_state();

        if self.rotation_count() < 2 {
            // A drawing game needs a drawer and at least one guesser.
            info!(
                lobby_id = %self.lobby_id,
                "not enough players left to continue — ending game"
            );
            self.finish_game();
            return;
        }

        let drawer = match self.next_drawer() {
            Some(d) => d,
            None => {
                // Everyone still present has drawn: the round is over.
                if self.round >= self.config.max_rounds {
                    self.finish_game();
                    return;
                }
                self.round += 1;
                self.drawn_this_round.clear();
                match self.next_drawer() {
                    Some(d) => d,
                    None => {
                        // Cannot happen with rotation_count() >= 2 and a
                        // cleared set; reset defensively rather than die.
                        self.reset_turn("no drawer after round rollover");
                        return;
                    }
                }
            }
        };

        self.phase = Phase::Selecting;
        self.drawer = Some(drawer);
        self.drawn_this_round.insert(drawer);

        let word = self.selector.draw();
        self.word_hint = Some(words::mask_word(&word));
        self.word = Some(word);

        // Make the Selecting step observable before Drawing opens.
        self.flush();

        self.turn += 1;
        self.phase = Phase::Drawing;
        for session in self.players.values_mut() {
            let eligible = session.id != drawer;
            session.begin_turn(eligible);
        }
        self.turn_record = Some(TurnRecord { correct: Vec::new() });
        self.timer.start(self.config.draw_duration);

        info!(
            lobby_id = %self.lobby_id,
            %drawer,
            round = self.round,
            turn = self.turn,
            "turn started"
        );

        let hint = self.word_hint.clone().unwrap_or_default();
        self.outbox.push((
            Recipient::All,
            Event::TurnStarted {
                drawer,
                round: self.round,
                turn: self.turn,
                word_hint: hint,
                seconds: self.config.draw_duration.as_secs(),
            },
        ));
        if let Some(word) = self.word.clone() {
            self.outbox
                .push((Recipient::Player(drawer), Event::WordAssigned { word }));
        }
    }

    /// Ends the Drawing phase: reveal the word, settle the drawer's
    /// points, and schedule the next turn.
    fn begin_reveal(&mut self, reason: &str) {
        let Some(word) = self.word.clone() else {
            self.reset_turn("revealing without a word");
            return;
        };

        self.timer.cancel();

        let correct = self
            .turn_record
            .as_ref()
            .map_or(0, |r| r.correct.len() as u32);
        if correct > 0 {
            if let Some(drawer) = self.drawer {
                if let Some(session) = self.players.get_mut(&drawer) {
                    session.award(scoring::drawer_points(correct));
                }
            }
        }
        self.turn_record = None;

        self.phase = Phase::Revealing;
        self.outbox
            .push((Recipient::All, Event::WordRevealed { word }));
        self.timer.start(self.config.reveal_delay);

        info!(
            lobby_id = %self.lobby_id,
            reason,
            correct,
            round = self.round,
            turn = self.turn,
            "turn over, revealing word"
        );
    }

    fn finish_game(&mut self) {
        self.clear_turn_state();
        self.phase = Phase::Finished;

        let mut standings: Vec<Standing> = self
            .join_order
            .iter()
            .filter_map(|id| self.players.get(id))
            .map(|s| Standing {
                player_id: s.id,
                name: s.name.clone(),
                score: s.score,
            })
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        let winner = standings.first().map(|s| s.player_id);

        info!(
            lobby_id = %self.lobby_id,
            winner = ?winner,
            "game finished"
        );

        self.outbox
            .push((Recipient::All, Event::GameSummary { standings, winner }));
    }

    /// Clears everything tied to the turn in flight.
    fn clear_turn_state(&mut self) {
        self.timer.cancel();
        self.drawer = None;
        self.word = None;
        self.word_hint = None;
        self.stroke_log.clear();
        self.turn_record = None;
    }

    /// Defensive recovery: one corrupted turn must not end the lobby.
    /// Logs the anomaly, throws the turn away, and moves on.
    fn reset_turn(&mut self, why: &str) {
        error!(
            lobby_id = %self.lobby_id,
            why,
            phase = %self.phase,
            round = self.round,
            turn = self.turn,
            "invariant violation — resetting turn"
        );
        self.clear_turn_state();
        if self.phase.is_terminal() {
            return;
        }
        if self.rotation_count() >= 2 {
            self.begin_next_turn();
        } else {
            self.phase = Phase::Waiting;
        }
    }

    fn on_timer_expired(&mut self) {
        match self.phase {
            Phase::Drawing => self.begin_reveal("time up"),
            Phase::Revealing => self.begin_next_turn(),
            phase => {
                // The timer is cancelled on every transition that makes
                // it moot, so this indicates a bookkeeping slip.
                warn!(
                    lobby_id = %self.lobby_id,
                    %phase,
                    "timer fired outside a timed phase — ignored"
                );
            }
        }
    }

    // -----------------------------------------------------------------
    // Guesses
    // -----------------------------------------------------------------

    fn handle_guess(&mut self, player_id: PlayerId, text: String) {
        if self.phase != Phase::Drawing {
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                phase = %self.phase,
                "guess outside Drawing — dropped"
            );
            return;
        }
        let (has_guessed, eligible) = match self.players.get(&player_id) {
            Some(s) => (s.has_guessed_this_turn, s.eligible_this_turn),
            None => {
                debug!(
                    lobby_id = %self.lobby_id,
                    %player_id,
                    "guess from unknown player — dropped"
                );
                return;
            }
        };
        if self.drawer == Some(player_id) {
            // The drawer knows the word; not an error anyone else sees.
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                "guess from the drawer — dropped"
            );
            return;
        }
        if has_guessed {
            // Already solved it. Dropping also keeps a solver from
            // spelling the word out in chat for the rest.
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                "guess after solving — dropped"
            );
            return;
        }

        let Some(word) = self.word.clone() else {
            self.reset_turn("drawing phase without a word");
            return;
        };

        if !words::matches_guess(&word, &text) {
            self.outbox
                .push((Recipient::All, Event::Chat { player_id, text }));
            return;
        }

        if !eligible {
            // Mid-turn joiners don't score, and broadcasting a correct
            // word as chat would spoil the turn — drop it.
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                "correct guess from ineligible player — dropped"
            );
            return;
        }

        let Some(record) = self.turn_record.as_mut() else {
            self.reset_turn("drawing phase without a turn record");
            return;
        };
        record.correct.push(player_id);
        let rank = record.correct.len() as u32;

        let total_guessers = self
            .players
            .values()
            .filter(|p| p.eligible_this_turn)
            .count() as u32;
        let ratio = self.timer.remaining_ratio().unwrap_or(0.0);
        let points = scoring::guesser_points(ratio, rank, total_guessers);

        if let Some(session) = self.players.get_mut(&player_id) {
            session.has_guessed_this_turn = true;
            session.award(points);
        }

        info!(
            lobby_id = %self.lobby_id,
            %player_id,
            rank,
            points,
            "correct guess"
        );

        // Anonymized: the word itself is withheld so the turn stays
        // playable for everyone else.
        self.outbox.push((
            Recipient::All,
            Event::GuessResult {
                player_id,
                correct: true,
            },
        ));

        self.maybe_complete_turn();
    }

    /// Drawing ends early once every eligible guesser has solved it.
    fn maybe_complete_turn(&mut self) {
        if self.phase != Phase::Drawing {
            return;
        }
        let mut any_eligible = false;
        let mut all_guessed = true;
        for p in self.players.values().filter(|p| p.eligible_this_turn) {
            any_eligible = true;
            if !p.has_guessed_this_turn {
                all_guessed = false;
            }
        }
        if any_eligible && all_guessed {
            self.begin_reveal("all guessed");
        }
    }

    // -----------------------------------------------------------------
    // Strokes
    // -----------------------------------------------------------------

    fn handle_stroke(&mut self, player_id: PlayerId, stroke: Stroke) {
        if self.phase != Phase::Drawing || self.drawer != Some(player_id) {
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                phase = %self.phase,
                "stroke from non-drawer or outside Drawing — dropped"
            );
            return;
        }
        if !self.config.brush_size_ok(stroke.brush_size) {
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                brush_size = stroke.brush_size,
                "stroke with out-of-range brush size — dropped"
            );
            return;
        }
        self.stroke_log.push(stroke);
    }

    fn handle_clear_canvas(&mut self, player_id: PlayerId) {
        if self.phase != Phase::Drawing || self.drawer != Some(player_id) {
            debug!(
                lobby_id = %self.lobby_id,
                %player_id,
                "canvas clear from non-drawer — dropped"
            );
            return;
        }
        self.stroke_log.clear();
    }

    // -----------------------------------------------------------------
    // Housekeeping tick
    // -----------------------------------------------------------------

    /// Runs once per second. Returns `true` when the lobby should shut
    /// down (empty past the timeout).
    fn on_housekeeping(&mut self) -> bool {
        // Disconnect-grace sweep.
        let grace = self.config.disconnect_grace;
        let expired: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| !p.in_rotation(grace) && !p.is_connected())
            .map(|p| p.id)
            .collect();
        for player_id in expired {
            self.remove_player(player_id, "grace period expired");
        }

        // Countdown broadcast while a turn is open.
        if self.phase == Phase::Drawing {
            if let Some(remaining) = self.timer.remaining() {
                self.outbox.push((
                    Recipient::All,
                    Event::TimerTick {
                        seconds_remaining: remaining.as_secs(),
                    },
                ));
            }
        }

        // Empty-lobby timeout.
        if self.players.is_empty() {
            let since = *self.empty_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= self.config.empty_timeout {
                info!(
                    lobby_id = %self.lobby_id,
                    "empty past timeout — shutting down"
                );
                return true;
            }
        } else {
            self.empty_since = None;
        }

        false
    }

    // -----------------------------------------------------------------
    // Broadcast
    // -----------------------------------------------------------------

    /// Emits everything this command produced: the snapshot diff first
    /// (state context), then the queued cause-specific events.
    fn flush(&mut self) {
        let next = self.snapshot();
        let mut batch: Vec<(Recipient, Event)> =
            view::diff(&self.last_snapshot, &next)
                .into_iter()
                .map(|event| (self.diff_recipient(&event), event))
                .collect();
        batch.append(&mut self.outbox);
        self.last_snapshot = next;

        for (recipient, event) in batch {
            self.deliver(recipient, event);
        }
    }

    /// Stroke echoes skip the drawer — they already have the stroke
    /// locally. Everything else from the diff goes to everyone.
    fn diff_recipient(&self, event: &Event) -> Recipient {
        match (event, self.drawer) {
            (Event::StrokeAppended { .. }, Some(drawer)) => {
                Recipient::AllExcept(drawer)
            }
            _ => Recipient::All,
        }
    }

    /// Fans one event out to its recipients. A full outbound channel
    /// marks that player disconnected instead of blocking the loop.
    fn deliver(&mut self, recipient: Recipient, event: Event) {
        let targets: Vec<PlayerId> = match recipient {
            Recipient::All => self.join_order.clone(),
            Recipient::Player(id) => vec![id],
            Recipient::AllExcept(excluded) => self
                .join_order
                .iter()
                .copied()
                .filter(|id| *id != excluded)
                .collect(),
        };

        for player_id in targets {
            let Some(session) = self.players.get(&player_id) else {
                continue;
            };
            if !session.is_connected() {
                continue;
            }
            match session.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        lobby_id = %self.lobby_id,
                        %player_id,
                        "outbound channel full — treating player as disconnected"
                    );
                    if let Some(session) = self.players.get_mut(&player_id) {
                        session.mark_disconnected();
                    }
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(
                        lobby_id = %self.lobby_id,
                        %player_id,
                        "outbound channel closed — treating player as disconnected"
                    );
                    if let Some(session) = self.players.get_mut(&player_id) {
                        session.mark_disconnected();
                    }
                }
            }
        }
    }

    /// Queues a personalized full snapshot for one player.
    fn push_snapshot_to(&mut self, player_id: PlayerId) {
        let snapshot = self.snapshot();
        let view = view::render(&snapshot, self.word.as_deref(), player_id);
        self.outbox
            .push((Recipient::Player(player_id), Event::LobbySnapshot { view }));
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            lobby_id: self.lobby_id,
            phase: self.phase,
            round: self.round,
            max_rounds: self.config.max_rounds,
            host: self.host,
            drawer: self.drawer,
            word_hint: self.word_hint.clone(),
            players: self
                .join_order
                .iter()
                .filter_map(|id| self.players.get(id))
                .map(PlayerSession::info)
                .collect(),
            strokes: self.stroke_log.clone(),
        }
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Next player in join order who is still in the rotation and has
    /// not drawn this round.
    fn next_drawer(&self) -> Option<PlayerId> {
        let grace = self.config.disconnect_grace;
        self.join_order
            .iter()
            .filter_map(|id| self.players.get(id))
            .find(|p| p.in_rotation(grace) && !self.drawn_this_round.contains(&p.id))
            .map(|p| p.id)
    }

    /// Players currently occupying a rotation slot.
    fn rotation_count(&self) -> usize {
        let grace = self.config.disconnect_grace;
        self.players.values().filter(|p| p.in_rotation(grace)).count()
    }

    fn connected_count(&self) -> usize {
        self.players.values().filter(|p| p.is_connected()).count()
    }

    fn info(&self) -> LobbyInfo {
        LobbyInfo {
            lobby_id: self.lobby_id,
            phase: self.phase,
            round: self.round,
            player_count: self.players.len(),
            max_players: self.config.max_players,
        }
    }
}

/// Spawns a new lobby actor task and returns a handle to it.
///
/// The config is validated on the way in, so the actor can rely on its
/// invariants (non-empty word pool, sane bounds).
pub fn spawn_lobby(lobby_id: LobbyId, config: LobbyConfig) -> LobbyHandle {
    let config = config.validated();
    let selector = match config.word_seed {
        Some(seed) => WordSelector::with_seed(
            &config.word_pool,
            config.word_difficulty,
            seed,
        ),
        None => WordSelector::new(&config.word_pool, config.word_difficulty),
    };

    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
    let last_snapshot = Snapshot::empty(lobby_id, config.max_rounds);

    let actor = LobbyActor {
        lobby_id,
        config,
        phase: Phase::Waiting,
        players: HashMap::new(),
        join_order: Vec::new(),
        host: None,
        drawer: None,
        word: None,
        word_hint: None,
        round: 0,
        turn: 0,
        drawn_this_round: HashSet::new(),
        stroke_log: Vec::new(),
        turn_record: None,
        timer: TurnTimer::new(),
        selector,
        receiver: rx,
        outbox: Vec::new(),
        last_snapshot,
        empty_since: None,
    };

    tokio::spawn(actor.run());

    LobbyHandle {
        lobby_id,
        sender: tx,
    }
}
