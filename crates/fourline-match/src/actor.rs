//! Match actor: an isolated Tokio task that owns one match.
//!
//! Each live match runs in its own task, communicating with the outside
//! world through an mpsc channel. No shared mutable state, just message
//! passing — which is exactly the per-match serialization the session
//! needs, while distinct matches run fully in parallel.

use std::collections::HashMap;

use fourline_backend::{OutcomeRecord, OutcomeStore};
use fourline_protocol::{MatchId, PlayerId, Recipient, ServerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::{MatchError, MatchSession, MatchStatus};

/// Channel sender for delivering events to one player's connection handler.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a match actor through its channel.
///
/// The `oneshot::Sender` in each variant is a reply channel: the caller
/// sends a command and awaits the response on it.
pub(crate) enum MatchCommand {
    /// Seat a player and register their event channel.
    Join {
        player_id: PlayerId,
        display_name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    /// Apply a move from a player.
    Play {
        player_id: PlayerId,
        column: usize,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    /// Remove a player (disconnect). Replies `true` when the match is
    /// over and should be evicted from the registry.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<bool>,
    },

    /// Request a snapshot of the match metadata.
    Summary {
        reply: oneshot::Sender<MatchSummary>,
    },
}

/// A snapshot of match metadata (not the board itself). Lobby fodder.
#[derive(Debug, Clone)]
pub struct MatchSummary {
    /// The match id.
    pub match_id: MatchId,
    /// Current lifecycle status.
    pub status: MatchStatus,
    /// Number of seated players.
    pub players: usize,
}

/// Handle to a running match actor. Cheap to clone — it's an
/// `mpsc::Sender` wrapper. The registry holds one per match.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    /// Returns the match id this handle points at.
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Returns `true` once the actor has exited (match over or evicted).
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats a player, registering the channel their events go out on.
    pub async fn join(
        &self,
        player_id: PlayerId,
        display_name: String,
        sender: EventSender,
    ) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Join {
                player_id,
                display_name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id.clone()))?
    }

    /// Applies a move.
    pub async fn play(&self, player_id: PlayerId, column: usize) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Play {
                player_id,
                column,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id.clone()))?
    }

    /// Removes a player. Returns `true` when the match ended and the
    /// caller should evict it from the registry.
    pub async fn leave(&self, player_id: PlayerId) -> Result<bool, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id.clone()))
    }

    /// Requests the current match summary.
    pub async fn summary(&self) -> Result<MatchSummary, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Summary { reply: reply_tx })
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id.clone()))
    }
}

/// The internal actor state. Runs inside a Tokio task and exits when the
/// match reaches a terminal state, which closes the command channel.
struct MatchActor<S: OutcomeStore> {
    session: MatchSession,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, EventSender>,
    store: S,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl<S: OutcomeStore> MatchActor<S> {
    /// Runs the actor loop, processing commands until the match ends.
    async fn run(mut self) {
        tracing::debug!(match_id = %self.session.match_id(), "match actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                MatchCommand::Join {
                    player_id,
                    display_name,
                    sender,
                    reply,
                } => {
                    match self.session.join(player_id.clone(), &display_name) {
                        Ok(events) => {
                            self.senders.insert(player_id, sender);
                            self.dispatch(events);
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            let _ = reply.send(Err(e));
                        }
                    }
                }

                MatchCommand::Play {
                    player_id,
                    column,
                    reply,
                } => match self.session.play(&player_id, column) {
                    Ok(events) => {
                        // The persistence write comes before the terminal
                        // broadcast: a crash in between loses the broadcast,
                        // never the record.
                        if self.session.is_finished() {
                            self.persist_outcome().await;
                        }
                        self.dispatch(events);
                        let _ = reply.send(Ok(()));
                        if self.session.is_finished() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                },

                MatchCommand::Leave { player_id, reply } => {
                    let was_finished = self.session.is_finished();
                    let (events, over) = self.session.leave(&player_id);
                    self.senders.remove(&player_id);
                    if over && !was_finished && self.session.outcome().is_some() {
                        self.persist_outcome().await;
                    }
                    self.dispatch(events);
                    let _ = reply.send(over);
                    if over {
                        break;
                    }
                }

                MatchCommand::Summary { reply } => {
                    let _ = reply.send(MatchSummary {
                        match_id: self.session.match_id().clone(),
                        status: self.session.status(),
                        players: self.session.participants().len(),
                    });
                }
            }
        }

        tracing::debug!(match_id = %self.session.match_id(), "match actor stopped");
    }

    /// Hands the terminal snapshot to the persistence collaborator.
    /// Called exactly once per finished match; failures are logged and do
    /// not block the broadcast that follows.
    async fn persist_outcome(&self) {
        let Some(outcome) = self.session.outcome() else {
            return;
        };
        let record = OutcomeRecord {
            match_id: self.session.match_id().clone(),
            winner: outcome.winner.clone(),
            score: outcome.score,
            participants: self.session.participants(),
            duration: self.session.play_duration(),
        };
        if let Err(e) = self.store.record(record).await {
            tracing::warn!(
                match_id = %self.session.match_id(),
                error = %e,
                "failed to record match outcome"
            );
        }
    }

    /// Fans events out to their recipients. Delivery is per-player and
    /// best-effort: one closed channel never aborts the rest.
    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for sender in self.senders.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                Recipient::Player(player_id) => {
                    self.send_to(&player_id, event);
                }
                Recipient::AllExcept(excluded) => {
                    for (player_id, sender) in &self.senders {
                        if *player_id != excluded {
                            let _ = sender.send(event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends one event to a single player. Silently drops if the
    /// receiver is gone (player disconnected).
    fn send_to(&self, player_id: &PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(player_id) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a new match actor task and returns a handle to talk to it.
///
/// `channel_size` bounds the command channel — if it fills, callers wait.
pub(crate) fn spawn_match<S: OutcomeStore>(
    match_id: MatchId,
    store: S,
    channel_size: usize,
) -> MatchHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = MatchActor {
        session: MatchSession::new(match_id.clone()),
        senders: HashMap::new(),
        store,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    MatchHandle {
        match_id,
        sender: tx,
    }
}
