//! The per-match state machine.
//!
//! A `MatchSession` owns the canonical board and seat list for one match
//! and decides every transition. It is plain synchronous state: the actor
//! in [`crate::actor`] serializes access, so nothing here needs locks.

use std::time::{Duration, Instant};

use fourline_protocol::{Cell, Coord, MatchId, PlayerId, Recipient, ServerEvent};

use crate::{Board, MatchError};

/// Points awarded to a winner (including a win by forfeit).
pub const WIN_SCORE: u32 = 3;

/// Points awarded to each player on a draw.
pub const DRAW_SCORE: u32 = 1;

/// Seats per match.
const SEATS: usize = 2;

/// The lifecycle state of a match.
///
/// Transitions are strictly forward:
///
/// ```text
/// Pending → Playing → Finished
/// ```
///
/// - **Pending**: zero or one seat filled, board untouched.
/// - **Playing**: both seats filled, board open for moves.
/// - **Finished**: terminal. The board is immutable and the outcome is
///   computed; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Pending,
    Playing,
    Finished,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// The immutable terminal record of a finished match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The winning player, or `None` for a draw.
    pub winner: Option<PlayerId>,
    /// The four cells of the winning line; empty for draws and forfeits.
    pub winning_cells: Vec<Coord>,
    /// [`WIN_SCORE`] or [`DRAW_SCORE`].
    pub score: u32,
}

/// Events a session operation produced, each tagged with its recipient.
pub type SessionEvents = Vec<(Recipient, ServerEvent)>;

/// One match's authoritative state: seats, turn, board, outcome.
#[derive(Debug, Clone)]
pub struct MatchSession {
    match_id: MatchId,
    status: MatchStatus,
    /// Seat order = join order = turn order. Seat 0 plays `Cell::P1`.
    seats: Vec<PlayerId>,
    /// Index into `seats` of the player to move.
    turn: usize,
    board: Board,
    outcome: Option<Outcome>,
    started: Option<Instant>,
}

impl MatchSession {
    /// Creates a pending match with no one seated.
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            status: MatchStatus::Pending,
            seats: Vec::with_capacity(SEATS),
            turn: 0,
            board: Board::new(),
            outcome: None,
            started: None,
        }
    }

    /// Seats a player. On the second join the match transitions to
    /// playing and the returned events include the `gameStart` broadcast.
    ///
    /// # Errors
    /// - [`MatchError::InvalidState`] — the match is already finished
    /// - [`MatchError::AlreadySeated`] — the player holds a seat here
    /// - [`MatchError::MatchFull`] — both seats are taken
    pub fn join(
        &mut self,
        player: PlayerId,
        display_name: &str,
    ) -> Result<SessionEvents, MatchError> {
        if self.status == MatchStatus::Finished {
            return Err(MatchError::InvalidState(self.status));
        }
        if self.seats.contains(&player) {
            return Err(MatchError::AlreadySeated(player));
        }
        if self.seats.len() >= SEATS {
            return Err(MatchError::MatchFull(self.match_id.clone()));
        }

        self.seats.push(player.clone());
        let seat = self.seats.len() as u8;
        tracing::info!(
            match_id = %self.match_id,
            player = %player,
            name = display_name,
            seat,
            "player seated"
        );

        let mut events = vec![(
            Recipient::Player(player.clone()),
            ServerEvent::PlayerAssigned { seat },
        )];

        if self.seats.len() == SEATS {
            self.status = MatchStatus::Playing;
            self.started = Some(Instant::now());
            tracing::info!(match_id = %self.match_id, "match started");
            events.push((
                Recipient::All,
                ServerEvent::GameStart {
                    board: self.board.cells(),
                    current_turn: self.seats[self.turn].clone(),
                },
            ));
        } else {
            events.push((
                Recipient::Player(player),
                ServerEvent::Waiting {
                    message: format!("{display_name} joined, waiting for an opponent"),
                },
            ));
        }

        Ok(events)
    }

    /// Applies a move: drop the piece, then settle win / draw / next turn.
    ///
    /// # Errors
    /// - [`MatchError::InvalidState`] — the match is not playing
    /// - [`MatchError::NotYourTurn`] — the current-turn seat is not
    ///   `player`'s
    /// - [`MatchError::ColumnOutOfRange`] / [`MatchError::ColumnFull`] —
    ///   per the board engine's drop contract; state is unchanged
    pub fn play(
        &mut self,
        player: &PlayerId,
        column: usize,
    ) -> Result<SessionEvents, MatchError> {
        if self.status != MatchStatus::Playing {
            return Err(MatchError::InvalidState(self.status));
        }
        if self.seats[self.turn] != *player {
            return Err(MatchError::NotYourTurn(player.clone()));
        }

        let piece = if self.turn == 0 { Cell::P1 } else { Cell::P2 };
        let (board, row) = self.board.drop_piece(column, piece)?;
        self.board = board;

        if let Some(win) = self.board.check_win() {
            let winning_cells = win.cells.to_vec();
            self.finish(Outcome {
                winner: Some(player.clone()),
                winning_cells: winning_cells.clone(),
                score: WIN_SCORE,
            });
            return Ok(vec![(
                Recipient::All,
                ServerEvent::GameOver {
                    board: self.board.cells(),
                    winner: Some(self.turn as u8 + 1),
                    winning_cells,
                    score: WIN_SCORE,
                    winning_player_id: Some(player.clone()),
                },
            )]);
        }

        if self.board.is_full() {
            self.finish(Outcome {
                winner: None,
                winning_cells: Vec::new(),
                score: DRAW_SCORE,
            });
            return Ok(vec![(
                Recipient::All,
                ServerEvent::GameOver {
                    board: self.board.cells(),
                    winner: None,
                    winning_cells: Vec::new(),
                    score: DRAW_SCORE,
                    winning_player_id: None,
                },
            )]);
        }

        self.turn = 1 - self.turn;
        Ok(vec![(
            Recipient::All,
            ServerEvent::GameUpdate {
                board: self.board.cells(),
                current_turn: self.seats[self.turn].clone(),
                last_move: Coord { row, col: column },
            },
        )])
    }

    /// Handles a player leaving (always a disconnect in practice).
    ///
    /// Returns the events to dispatch and whether the match is over and
    /// should be evicted. Leaving mid-play forfeits: the remaining player
    /// is declared winner. Leaving a pending match evicts it silently.
    /// Unknown players and already-finished matches are no-ops.
    pub fn leave(&mut self, player: &PlayerId) -> (SessionEvents, bool) {
        if !self.seats.contains(player) {
            return (Vec::new(), self.status == MatchStatus::Finished);
        }

        match self.status {
            MatchStatus::Pending => {
                self.seats.retain(|seated| seated != player);
                tracing::info!(
                    match_id = %self.match_id,
                    player = %player,
                    "player left pending match"
                );
                (Vec::new(), true)
            }
            MatchStatus::Playing => {
                let winner = self
                    .seats
                    .iter()
                    .find(|seated| *seated != player)
                    .expect("a playing match has two seats")
                    .clone();
                self.finish(Outcome {
                    winner: Some(winner.clone()),
                    winning_cells: Vec::new(),
                    score: WIN_SCORE,
                });
                tracing::info!(
                    match_id = %self.match_id,
                    leaver = %player,
                    winner = %winner,
                    "player left mid-game, remaining player wins"
                );
                let events = vec![(
                    Recipient::AllExcept(player.clone()),
                    ServerEvent::PlayerLeft {
                        winner,
                        score: WIN_SCORE,
                    },
                )];
                (events, true)
            }
            MatchStatus::Finished => (Vec::new(), true),
        }
    }

    /// The single transition into the terminal state. The outcome is set
    /// once here and never touched again.
    fn finish(&mut self, outcome: Outcome) {
        self.status = MatchStatus::Finished;
        self.outcome = Some(outcome);
        tracing::info!(match_id = %self.match_id, "match finished");
    }

    /// Returns the match id.
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Returns the current lifecycle status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Returns `true` once the match has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// Returns the seated players in seat order.
    pub fn participants(&self) -> Vec<PlayerId> {
        self.seats.clone()
    }

    /// Returns the outcome, once the match is finished.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Time spent in the playing state; zero if the match never started.
    pub fn play_duration(&self) -> Duration {
        self.started.map(|t| t.elapsed()).unwrap_or(Duration::ZERO)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    fn session() -> MatchSession {
        MatchSession::new(MatchId::from("m1"))
    }

    /// A session with both players seated, game started, p1 to move.
    fn playing_session() -> MatchSession {
        let mut s = session();
        s.join(pid("p1"), "p1").unwrap();
        s.join(pid("p2"), "p2").unwrap();
        s
    }

    fn has_event(events: &SessionEvents, f: impl Fn(&ServerEvent) -> bool) -> bool {
        events.iter().any(|(_, ev)| f(ev))
    }

    // =====================================================================
    // join
    // =====================================================================

    #[test]
    fn test_first_join_assigns_seat_one_and_waits() {
        let mut s = session();
        let events = s.join(pid("p1"), "Aragorn").unwrap();

        assert_eq!(s.status(), MatchStatus::Pending);
        assert!(has_event(&events, |ev| matches!(
            ev,
            ServerEvent::PlayerAssigned { seat: 1 }
        )));
        assert!(has_event(&events, |ev| matches!(
            ev,
            ServerEvent::Waiting { message } if message.contains("Aragorn")
        )));
        // Both events are addressed to the joiner only.
        assert!(events
            .iter()
            .all(|(to, _)| *to == Recipient::Player(pid("p1"))));
    }

    #[test]
    fn test_second_join_starts_game_with_seat_one_to_move() {
        let mut s = session();
        s.join(pid("p1"), "p1").unwrap();
        let events = s.join(pid("p2"), "p2").unwrap();

        assert_eq!(s.status(), MatchStatus::Playing);
        assert!(has_event(&events, |ev| matches!(
            ev,
            ServerEvent::PlayerAssigned { seat: 2 }
        )));
        let start = events
            .iter()
            .find(|(to, ev)| {
                *to == Recipient::All && matches!(ev, ServerEvent::GameStart { .. })
            })
            .expect("gameStart should broadcast");
        match &start.1 {
            ServerEvent::GameStart { current_turn, .. } => {
                assert_eq!(*current_turn, pid("p1"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_third_join_rejected_with_match_full() {
        let mut s = playing_session();
        let result = s.join(pid("p3"), "p3");
        assert!(matches!(result, Err(MatchError::MatchFull(_))));
        assert_eq!(s.participants().len(), 2);
    }

    #[test]
    fn test_rejoin_rejected_with_already_seated() {
        let mut s = session();
        s.join(pid("p1"), "p1").unwrap();
        let result = s.join(pid("p1"), "p1");
        assert!(matches!(result, Err(MatchError::AlreadySeated(p)) if p == pid("p1")));
    }

    #[test]
    fn test_join_finished_match_rejected() {
        let mut s = playing_session();
        s.leave(&pid("p2"));
        let result = s.join(pid("p3"), "p3");
        assert!(matches!(
            result,
            Err(MatchError::InvalidState(MatchStatus::Finished))
        ));
    }

    // =====================================================================
    // play — turn order and validation
    // =====================================================================

    #[test]
    fn test_move_before_game_starts_rejected() {
        let mut s = session();
        s.join(pid("p1"), "p1").unwrap();
        let result = s.play(&pid("p1"), 0);
        assert!(matches!(
            result,
            Err(MatchError::InvalidState(MatchStatus::Pending))
        ));
    }

    #[test]
    fn test_turns_alternate() {
        let mut s = playing_session();

        // p2 may not open.
        assert!(matches!(
            s.play(&pid("p2"), 0),
            Err(MatchError::NotYourTurn(p)) if p == pid("p2")
        ));

        // p1 moves; moving again is rejected.
        s.play(&pid("p1"), 0).unwrap();
        assert!(matches!(
            s.play(&pid("p1"), 1),
            Err(MatchError::NotYourTurn(_))
        ));

        // Now p2 may move.
        s.play(&pid("p2"), 1).unwrap();
    }

    #[test]
    fn test_rejected_move_does_not_flip_turn() {
        let mut s = playing_session();
        assert!(s.play(&pid("p1"), 99).is_err());
        // Still p1's turn: a legal p1 move goes through.
        let events = s.play(&pid("p1"), 0).unwrap();
        assert!(has_event(&events, |ev| matches!(
            ev,
            ServerEvent::GameUpdate { .. }
        )));
    }

    #[test]
    fn test_update_carries_last_move_and_next_turn() {
        let mut s = playing_session();
        let events = s.play(&pid("p1"), 3).unwrap();

        let (to, ev) = &events[0];
        assert_eq!(*to, Recipient::All);
        match ev {
            ServerEvent::GameUpdate {
                current_turn,
                last_move,
                board,
            } => {
                assert_eq!(*current_turn, pid("p2"));
                assert_eq!(*last_move, Coord { row: 5, col: 3 });
                assert_eq!(board[5][3], Cell::P1);
            }
            other => panic!("expected gameUpdate, got {other:?}"),
        }
    }

    // =====================================================================
    // play — terminal transitions
    // =====================================================================

    /// Plays p1 across the bottom row (cols 0..=3) while p2 fills the far
    /// columns, ending with p1's horizontal win on row 5.
    fn play_to_horizontal_win(s: &mut MatchSession) -> SessionEvents {
        s.play(&pid("p1"), 0).unwrap();
        s.play(&pid("p2"), 4).unwrap();
        s.play(&pid("p1"), 1).unwrap();
        s.play(&pid("p2"), 5).unwrap();
        s.play(&pid("p1"), 2).unwrap();
        s.play(&pid("p2"), 6).unwrap();
        s.play(&pid("p1"), 3).unwrap()
    }

    #[test]
    fn test_winning_move_finishes_with_cells_and_score() {
        let mut s = playing_session();
        let events = play_to_horizontal_win(&mut s);

        assert_eq!(s.status(), MatchStatus::Finished);
        let (to, ev) = &events[0];
        assert_eq!(*to, Recipient::All);
        match ev {
            ServerEvent::GameOver {
                winner,
                winning_cells,
                score,
                winning_player_id,
                ..
            } => {
                assert_eq!(*winner, Some(1));
                assert_eq!(*winning_player_id, Some(pid("p1")));
                assert_eq!(*score, WIN_SCORE);
                assert_eq!(
                    *winning_cells,
                    vec![
                        Coord { row: 5, col: 0 },
                        Coord { row: 5, col: 1 },
                        Coord { row: 5, col: 2 },
                        Coord { row: 5, col: 3 },
                    ]
                );
            }
            other => panic!("expected gameOver, got {other:?}"),
        }

        let outcome = s.outcome().expect("outcome should be computed");
        assert_eq!(outcome.winner, Some(pid("p1")));
        assert_eq!(outcome.score, WIN_SCORE);
    }

    #[test]
    fn test_moves_after_game_over_rejected() {
        let mut s = playing_session();
        play_to_horizontal_win(&mut s);
        let result = s.play(&pid("p2"), 0);
        assert!(matches!(
            result,
            Err(MatchError::InvalidState(MatchStatus::Finished))
        ));
    }

    #[test]
    fn test_filling_the_board_without_line_is_a_draw() {
        let mut s = playing_session();

        // Reproduces the line-free full board from the board-engine tests.
        // Columns are filled in pairs (one column whose stack starts with
        // P1, one that starts with P2): the order a, b, b, a keeps the
        // turn alternation aligned with each column's required piece
        // pattern. Since the final position has no four-in-a-row, no
        // prefix of it can either.
        let column_order = [
            0, 2, 2, 0, 0, 2, 2, 0, 0, 2, 2, 0, // pair (0, 2)
            1, 3, 3, 1, 1, 3, 3, 1, 1, 3, 3, 1, // pair (1, 3)
            4, 6, 6, 4, 4, 6, 6, 4, 4, 6, 6, 4, // pair (4, 6)
            5, 5, 5, 5, 5, 5, // col 5 alternates on its own
        ];
        let mut last = Vec::new();
        for (i, &col) in column_order.iter().enumerate() {
            let mover = if i % 2 == 0 { pid("p1") } else { pid("p2") };
            last = s.play(&mover, col).unwrap();
            assert_eq!(
                s.is_finished(),
                i == column_order.len() - 1,
                "only the 42nd move may finish the match"
            );
        }

        assert_eq!(s.status(), MatchStatus::Finished);
        match &last[0].1 {
            ServerEvent::GameOver {
                winner,
                score,
                winning_cells,
                winning_player_id,
                ..
            } => {
                assert_eq!(*winner, None, "draw has no winner");
                assert_eq!(*winning_player_id, None);
                assert_eq!(*score, DRAW_SCORE);
                assert!(winning_cells.is_empty());
            }
            other => panic!("expected gameOver, got {other:?}"),
        }
        let outcome = s.outcome().unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.score, DRAW_SCORE);
    }

    // =====================================================================
    // leave
    // =====================================================================

    #[test]
    fn test_leave_mid_game_forfeits_to_remaining_player() {
        let mut s = playing_session();
        let (events, over) = s.leave(&pid("p1"));

        assert!(over);
        assert_eq!(s.status(), MatchStatus::Finished);
        let (to, ev) = &events[0];
        assert_eq!(*to, Recipient::AllExcept(pid("p1")));
        match ev {
            ServerEvent::PlayerLeft { winner, score } => {
                assert_eq!(*winner, pid("p2"));
                assert_eq!(*score, WIN_SCORE);
            }
            other => panic!("expected playerLeft, got {other:?}"),
        }
        let outcome = s.outcome().unwrap();
        assert_eq!(outcome.winner, Some(pid("p2")));
        assert!(outcome.winning_cells.is_empty());
    }

    #[test]
    fn test_leave_pending_match_evicts_silently() {
        let mut s = session();
        s.join(pid("p1"), "p1").unwrap();
        let (events, over) = s.leave(&pid("p1"));

        assert!(over);
        assert!(events.is_empty(), "pending eviction emits no outcome");
        assert!(s.outcome().is_none());
    }

    #[test]
    fn test_leave_by_stranger_is_a_no_op() {
        let mut s = playing_session();
        let (events, over) = s.leave(&pid("p9"));
        assert!(!over);
        assert!(events.is_empty());
        assert_eq!(s.status(), MatchStatus::Playing);
    }

    #[test]
    fn test_leave_after_finish_keeps_original_outcome() {
        let mut s = playing_session();
        play_to_horizontal_win(&mut s);
        let before = s.outcome().cloned();

        let (events, over) = s.leave(&pid("p2"));

        assert!(over);
        assert!(events.is_empty());
        assert_eq!(s.outcome().cloned(), before, "outcome is immutable");
    }
}
