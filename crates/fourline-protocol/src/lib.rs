//! Wire protocol for the Fourline match server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`Cell`], the id newtypes) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the gateway
//! (connection context). It doesn't know about sockets or matches — it only
//! knows how to serialize and deserialize events.
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Gateway (connection context)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Cell, ClientEvent, Coord, Grid, MatchId, PlayerId, Recipient,
    ServerEvent, COLS, ROWS,
};
