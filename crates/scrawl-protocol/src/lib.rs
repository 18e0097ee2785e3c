//! Wire protocol for Scrawl.
//!
//! This crate defines the "language" spoken between the lobby engine and
//! the transport layer:
//!
//! - **Types** ([`Command`], [`Event`], [`LobbyView`], identity newtypes) —
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer knows nothing about lobbies or timers — it only
//! defines message shapes. The lobby engine consumes [`Command`]s and
//! produces [`Event`]s; the transport layer owns the bytes on both sides.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Command, Event, LobbyId, LobbyView, Phase, PlayerId, PlayerInfo, Point,
    Recipient, Standing, Stroke,
};
