//! Lobby registry: creates, tracks, and routes players to lobbies.
//!
//! This is the process-wide entry point for the transport/API layer.
//! Connection-handling code never touches lobby state directly — it goes
//! through a handle obtained here, and the registry enforces the
//! one-lobby-per-player invariant.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use scrawl_protocol::{Command, LobbyId, PlayerId};
use tracing::info;

use crate::config::LobbyConfig;
use crate::error::LobbyError;
use crate::lobby::{LobbyHandle, LobbyInfo, spawn_lobby};
use crate::player::EventSender;

/// Counter for generating unique lobby IDs.
static NEXT_LOBBY_ID: AtomicU64 = AtomicU64::new(1);

/// Manages all active lobbies and tracks which player is in which lobby.
pub struct LobbyRegistry {
    /// Active lobbies, keyed by lobby ID.
    lobbies: HashMap<LobbyId, LobbyHandle>,

    /// Maps each player to the lobby they're currently in.
    /// A player can be in at most ONE lobby at a time (key invariant).
    player_lobbies: HashMap<PlayerId, LobbyId>,
}

impl LobbyRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            lobbies: HashMap::new(),
            player_lobbies: HashMap::new(),
        }
    }

    /// Creates a new lobby and returns its ID.
    pub fn create_lobby(&mut self, config: LobbyConfig) -> LobbyId {
        let lobby_id = LobbyId(NEXT_LOBBY_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_lobby(lobby_id, config);
        self.lobbies.insert(lobby_id, handle);
        info!(%lobby_id, "lobby created");
        lobby_id
    }

    /// Adds a player to a lobby, registering their outbound channel.
    ///
    /// Enforces the "one lobby at a time" invariant.
    pub async fn join_lobby(
        &mut self,
        player_id: PlayerId,
        lobby_id: LobbyId,
        name: impl Into<String>,
        sender: EventSender,
    ) -> Result<(), LobbyError> {
        if let Some(current) = self.player_lobbies.get(&player_id) {
            return Err(LobbyError::AlreadyJoined(player_id, *current));
        }

        let handle = self
            .lobbies
            .get(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;

        handle.join(player_id, name, sender).await?;
        self.player_lobbies.insert(player_id, lobby_id);
        Ok(())
    }

    /// Reattaches a player to their lobby after a connection drop.
    pub async fn reconnect(
        &self,
        player_id: PlayerId,
        sender: EventSender,
    ) -> Result<LobbyId, LobbyError> {
        let lobby_id = self
            .player_lobbies
            .get(&player_id)
            .copied()
            .ok_or(LobbyError::NoLobby(player_id))?;
        let handle = self
            .lobbies
            .get(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;
        handle.reconnect(player_id, sender).await?;
        Ok(lobby_id)
    }

    /// Removes a player from their current lobby.
    pub async fn leave_lobby(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), LobbyError> {
        let lobby_id = self
            .player_lobbies
            .get(&player_id)
            .copied()
            .ok_or(LobbyError::NoLobby(player_id))?;

        if let Some(handle) = self.lobbies.get(&lobby_id) {
            handle.command(Command::Leave { player_id }).await?;
        }

        self.player_lobbies.remove(&player_id);
        Ok(())
    }

    /// Routes a wire command to the sending player's lobby.
    pub async fn route_command(
        &self,
        command: Command,
    ) -> Result<(), LobbyError> {
        let player_id = command.player_id();
        let lobby_id = self
            .player_lobbies
            .get(&player_id)
            .ok_or(LobbyError::NoLobby(player_id))?;

        let handle = self
            .lobbies
            .get(lobby_id)
            .ok_or(LobbyError::NotFound(*lobby_id))?;

        handle.command(command).await
    }

    /// Relays a transport-level disconnect signal.
    pub async fn player_disconnected(
        &self,
        player_id: PlayerId,
    ) -> Result<(), LobbyError> {
        let lobby_id = self
            .player_lobbies
            .get(&player_id)
            .ok_or(LobbyError::NoLobby(player_id))?;
        let handle = self
            .lobbies
            .get(lobby_id)
            .ok_or(LobbyError::NotFound(*lobby_id))?;
        handle.player_disconnected(player_id).await
    }

    /// Returns info about a specific lobby.
    pub async fn lobby_info(
        &self,
        lobby_id: LobbyId,
    ) -> Result<LobbyInfo, LobbyError> {
        let handle = self
            .lobbies
            .get(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;
        handle.info().await
    }

    /// Shuts a lobby down and removes all its players from the index.
    pub async fn destroy_lobby(
        &mut self,
        lobby_id: LobbyId,
    ) -> Result<(), LobbyError> {
        let handle = self
            .lobbies
            .remove(&lobby_id)
            .ok_or(LobbyError::NotFound(lobby_id))?;

        let _ = handle.shutdown().await;
        self.player_lobbies.retain(|_, lid| *lid != lobby_id);

        info!(%lobby_id, "lobby destroyed");
        Ok(())
    }

    /// Drops registry entries for lobbies whose actors have stopped on
    /// their own (empty past the timeout). Call periodically.
    pub fn prune_dead(&mut self) -> usize {
        let dead: Vec<LobbyId> = self
            .lobbies
            .iter()
            .filter(|(_, handle)| handle.is_closed())
            .map(|(id, _)| *id)
            .collect();
        for lobby_id in &dead {
            self.lobbies.remove(lobby_id);
            self.player_lobbies.retain(|_, lid| lid != lobby_id);
            info!(%lobby_id, "pruned dead lobby");
        }
        dead.len()
    }

    /// Returns the lobby a player is currently in, if any.
    pub fn player_lobby(&self, player_id: &PlayerId) -> Option<LobbyId> {
        self.player_lobbies.get(player_id).copied()
    }

    /// Returns a handle to a lobby, if it exists.
    pub fn handle(&self, lobby_id: LobbyId) -> Option<LobbyHandle> {
        self.lobbies.get(&lobby_id).cloned()
    }

    /// Returns the number of active lobbies.
    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    /// Lists all active lobby IDs.
    pub fn lobby_ids(&self) -> Vec<LobbyId> {
        self.lobbies.keys().copied().collect()
    }
}

impl Default for LobbyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
