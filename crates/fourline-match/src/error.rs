//! Error types for the match core.

use fourline_protocol::{MatchId, PlayerId};

use crate::MatchStatus;

/// Everything a match operation can be rejected with.
///
/// All of these are validation or stale-state rejections: they are
/// reported to the originating connection, never broadcast, and never
/// mutate match state.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No match exists under this id.
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// Both seats are already taken.
    #[error("match {0} is full")]
    MatchFull(MatchId),

    /// The player already occupies a seat in this match.
    #[error("player {0} is already seated in this match")]
    AlreadySeated(PlayerId),

    /// The seat at the current-turn index belongs to someone else.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The column index is outside `0..7`.
    #[error("column {0} is out of range")]
    ColumnOutOfRange(usize),

    /// The topmost row of the column is already occupied.
    #[error("column {0} is full")]
    ColumnFull(usize),

    /// The match is not in a state that allows this operation — e.g. a
    /// move against a match that is still pending or already finished.
    #[error("match is {0}, not accepting moves")]
    InvalidState(MatchStatus),

    /// The match actor is gone (its command channel closed). Seen by
    /// stale moves that race with eviction.
    #[error("match {0} is no longer available")]
    Unavailable(MatchId),
}
