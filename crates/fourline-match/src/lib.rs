//! The authoritative match core for Fourline.
//!
//! Each live match runs as an isolated Tokio task (actor model) owning the
//! canonical board and seat state. The registry maps opaque match ids to
//! actor handles; the gateway talks to matches only through those handles,
//! so every mutation of a match is serialized by its actor while distinct
//! matches proceed fully in parallel.
//!
//! # Key types
//!
//! - [`Board`] — the pure Connect-Four board engine
//! - [`MatchSession`] — the per-match state machine (pending → playing →
//!   finished)
//! - [`MatchRegistry`] — creates, tracks, and evicts matches by id
//! - [`MatchHandle`] — send commands to a running match actor
//! - [`MatchError`] — everything a join or move can be rejected with

mod actor;
mod board;
mod error;
mod registry;
mod session;

pub use actor::{EventSender, MatchHandle, MatchSummary};
pub use board::{Board, WinLine};
pub use error::MatchError;
pub use registry::MatchRegistry;
pub use session::{
    MatchSession, MatchStatus, Outcome, SessionEvents, DRAW_SCORE, WIN_SCORE,
};
