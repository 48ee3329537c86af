//! # Fourline
//!
//! Authoritative real-time Connect-Four match server.
//!
//! The server holds canonical board state, enforces turn order, detects
//! win and draw conditions, and broadcasts every transition to the
//! connections attached to a match. User accounts and game history live
//! in adjacent services; the server consumes them through the
//! [`IdentityResolver`](fourline_backend::IdentityResolver) and
//! [`OutcomeStore`](fourline_backend::OutcomeStore) seams.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use fourline::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let server = ServerBuilder::new()
//!         .bind("0.0.0.0:3000")
//!         .build(IdentityFromId, MemoryOutcomeStore::new())
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod gateway;
mod server;

pub use error::ServerError;
pub use server::{Server, ServerBuilder};

/// One-stop imports for embedding or testing the server.
pub mod prelude {
    pub use crate::{Server, ServerBuilder, ServerError};
    pub use fourline_backend::{
        BackendError, IdentityFromId, IdentityResolver, MemoryOutcomeStore,
        OutcomeRecord, OutcomeStore, StaticDirectory,
    };
    pub use fourline_match::{MatchError, MatchStatus, DRAW_SCORE, WIN_SCORE};
    pub use fourline_protocol::{
        Cell, ClientEvent, Codec, Coord, JsonCodec, MatchId, PlayerId,
        ServerEvent,
    };
}
