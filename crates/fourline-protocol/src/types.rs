//! Core protocol types for Fourline's wire format.
//!
//! Everything here gets serialized to JSON, sent over the persistent
//! connection, and deserialized on the other side. The shapes are fixed:
//! browser clients match on the `type` tag of each event, so a renamed
//! field is a broken client.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable, opaque player identifier.
///
/// The id is issued by the identity service; the match server never
/// interprets it, only compares it and hands it back out in events.
/// A newtype around `String` keeps a `PlayerId` from being confused with
/// a `MatchId` (both are strings underneath).
///
/// `#[serde(transparent)]` serializes this as the bare string, not as
/// `{ "0": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque match identifier, chosen by the client that creates the match.
///
/// Same newtype pattern as [`PlayerId`]. The first `join` naming an unknown
/// id creates the match; every later `join`/`move` with the same id routes
/// to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    /// Returns the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MatchId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Board cells
// ---------------------------------------------------------------------------

/// Number of board rows. Row 0 is the top, row `ROWS - 1` the bottom.
pub const ROWS: usize = 6;

/// Number of board columns.
pub const COLS: usize = 7;

/// One cell of the board.
///
/// On the wire a cell is the number `0` (empty), `1` (player 1), or `2`
/// (player 2) — the encoding the web client has always used. The
/// `into`/`try_from` attributes route serde through the `u8` conversions
/// below so the JSON stays numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    /// No piece.
    Empty,
    /// A piece belonging to seat 1.
    P1,
    /// A piece belonging to seat 2.
    P2,
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        match cell {
            Cell::Empty => 0,
            Cell::P1 => 1,
            Cell::P2 => 2,
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::P1),
            2 => Ok(Cell::P2),
            other => Err(format!("invalid cell value {other}")),
        }
    }
}

/// The full board as it appears on the wire: 6 rows of 7 cells,
/// row-major, top row first.
pub type Grid = [[Cell; COLS]; ROWS];

/// A board coordinate. Used for `lastMove` and `winningCells`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coord {
    /// Row index, 0 at the top.
    pub row: usize,
    /// Column index, 0 at the left.
    pub col: usize,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// The match session returns `(Recipient, ServerEvent)` pairs; the actor
/// fans each one out to the right connections. This never travels on the
/// wire — it's routing metadata for the server side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Send to every player in the match.
    All,

    /// Send to one specific player.
    Player(PlayerId),

    /// Send to everyone except the specified player. Used for events a
    /// player triggers by going away (their socket is already gone).
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Client events
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "join", "matchId": "m1", "playerId": "p1" }`. Disconnection
/// has no event — it is the socket closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// "Seat me in this match." Creates the match if the id is unknown.
    Join {
        match_id: MatchId,
        player_id: PlayerId,
    },

    /// "Drop my piece into this column."
    Move { match_id: MatchId, column: usize },
}

// ---------------------------------------------------------------------------
// Server events
// ---------------------------------------------------------------------------

/// Events the server sends to clients.
///
/// Same internally tagged representation as [`ClientEvent`]. `waiting`,
/// `playerAssigned`, and `error` go to a single connection; the rest are
/// broadcast to every connection in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First joiner only: the match exists but has one seat filled.
    Waiting { message: String },

    /// Tells a joiner which seat they occupy (1 or 2). Seat order is
    /// join order is turn order.
    PlayerAssigned { seat: u8 },

    /// Both seats are filled; play begins.
    GameStart { board: Grid, current_turn: PlayerId },

    /// A move was accepted and the game continues.
    GameUpdate {
        board: Grid,
        current_turn: PlayerId,
        last_move: Coord,
    },

    /// The match reached a terminal state on the board.
    ///
    /// `winner` is the 1-based seat number, or `null` for a draw.
    /// `winning_cells` holds the four cells of the winning line (empty for
    /// a draw). `score` is the point value: 3 for a win, 1 per player for
    /// a draw.
    GameOver {
        board: Grid,
        winner: Option<u8>,
        winning_cells: Vec<Coord>,
        score: u32,
        winning_player_id: Option<PlayerId>,
    },

    /// An opponent disconnected mid-game; the named player wins by forfeit.
    PlayerLeft { winner: PlayerId, score: u32 },

    /// Something the sender did was rejected. Sent to the offending
    /// connection only; never broadcast.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
