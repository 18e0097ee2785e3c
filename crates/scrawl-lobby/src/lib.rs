//! Lobby and round engine for Scrawl.
//!
//! Each lobby runs as an isolated Tokio task (actor model) owning all of
//! its state: players, drawer rotation, the secret word, timers, and the
//! stroke log. The outside world talks to it only through a command
//! channel, and receives events on per-player bounded channels.
//!
//! # Key types
//!
//! - [`LobbyRegistry`] — process-wide create/lookup/destroy of lobbies
//! - [`LobbyHandle`] — send commands to a running lobby actor
//! - [`LobbyConfig`] — round count, timings, brush sizes, word pool
//! - [`WordSelector`] — non-repeating word draws per turn
//! - [`scoring`] — pure point formulas for guessers and the drawer
//! - [`Snapshot`]/[`diff`](view::diff) — the broadcast/diff layer

pub mod scoring;
pub mod view;
pub mod words;

mod config;
mod error;
mod lobby;
mod player;
mod registry;

pub use config::LobbyConfig;
pub use error::LobbyError;
pub use lobby::{LobbyHandle, LobbyInfo, spawn_lobby};
pub use player::{ConnectionState, EventSender, PlayerSession};
pub use registry::LobbyRegistry;
pub use view::Snapshot;
pub use words::{Difficulty, WordSelector};
