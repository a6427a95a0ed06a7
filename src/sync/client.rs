//! Client-side prediction and reconciliation.
//!
//! The predictor keeps the authoritative log it has been told about plus at
//! most one pending move of its own. A pending move is applied locally at
//! once so the UI can show it, and is either confirmed by the matching
//! broadcast or thrown away. The predicted state is never a source of
//! truth: on any disagreement the whole local copy is replaced.

use serde::{Deserialize, Serialize};

use crate::codec::{self, encode};
use crate::core::{Action, GameState, InitialSnapshot, PlayerId};
use crate::matches::{
    replay, ClockSnapshot, MatchError, MatchId, MatchStatus, MoveLog, Recovery, UndoNegotiation,
};
use crate::rules;

use super::error::SyncError;
use super::protocol::{ClientRequest, MatchUpdate, MatchView};

/// How many times a client retries a refused submission on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_auto_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_auto_retries: 1,
        }
    }
}

/// A move applied locally but not yet confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMove {
    pub index: u32,
    pub action: Action,
    pub predicted: GameState,
}

/// What an incoming broadcast did to the local copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Our pending move was appended as predicted.
    Confirmed { index: u32 },
    /// Another entry took our pending move's place; the prediction was
    /// discarded and the state replaced.
    Replaced { index: u32 },
    /// An entry we had no prediction for (usually the opponent's move).
    Applied { index: u32 },
    /// The log was truncated by an accepted undo.
    Rewound { log_len: u32 },
    /// Status, clocks or undo changed; the log did not.
    Refreshed,
    /// The match ended (time, resignation or abandonment) before our
    /// pending move at `index` was appended. The prediction was dropped.
    Dropped { index: u32 },
    /// Already seen, or for another match.
    Ignored,
    /// The broadcast does not follow from our copy; fetch a `MatchView` and
    /// call [`ClientPredictor::resync`].
    NeedsResync,
}

/// What to do after the server refused our submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionOutcome {
    /// Fetch a view, resync, then predict `action` again.
    Retry { action: Action },
    /// Fetch a view and resync; do not resubmit.
    Resync,
    /// Give up and show the error.
    Surface,
}

pub struct ClientPredictor {
    match_id: MatchId,
    player: PlayerId,
    snapshot: InitialSnapshot,
    confirmed: MoveLog,
    confirmed_state: GameState,
    status: MatchStatus,
    undo: Option<UndoNegotiation>,
    clocks: ClockSnapshot,
    pending: Option<PendingMove>,
    retry: RetryPolicy,
    retries_used: u32,
}

impl ClientPredictor {
    /// Build a local copy from an authoritative view.
    pub fn from_view(player: PlayerId, view: &MatchView) -> Result<Self, SyncError> {
        let confirmed_state = verified_replay(view)?;
        Ok(Self {
            match_id: view.match_id,
            player,
            snapshot: view.snapshot.clone(),
            confirmed: view.log.clone(),
            confirmed_state,
            status: view.status,
            undo: view.undo,
            clocks: ClockSnapshot {
                remaining_ms: view.remaining_ms,
            },
            pending: None,
            retry: RetryPolicy::default(),
            retries_used: 0,
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// State to display: the prediction if there is one.
    #[must_use]
    pub fn state(&self) -> &GameState {
        self.pending
            .as_ref()
            .map_or(&self.confirmed_state, |pending| &pending.predicted)
    }

    /// Last state the server has confirmed.
    #[must_use]
    pub fn confirmed_state(&self) -> &GameState {
        &self.confirmed_state
    }

    #[must_use]
    pub fn confirmed_log(&self) -> &MoveLog {
        &self.confirmed
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingMove> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    #[must_use]
    pub fn undo(&self) -> Option<UndoNegotiation> {
        self.undo
    }

    #[must_use]
    pub fn clocks(&self) -> ClockSnapshot {
        self.clocks
    }

    /// Apply `action` locally and produce the request to send.
    ///
    /// Runs the same codec and rules checks the server will, so a move the
    /// server would refuse for those reasons never leaves the client.
    pub fn predict(&mut self, action: Action) -> Result<ClientRequest, SyncError> {
        if self.pending.is_some() {
            return Err(SyncError::PredictionPending);
        }
        let reject = |source: MatchError| SyncError::Rejected {
            match_id: self.match_id,
            source,
        };
        match self.status {
            MatchStatus::InProgress => {}
            MatchStatus::WaitingForOpponent => return Err(reject(MatchError::MatchNotStarted)),
            _ => return Err(reject(MatchError::MatchAlreadyOver)),
        }
        let state = &self.confirmed_state;
        if state.to_move != self.player {
            return Err(reject(MatchError::NotYourTurn {
                expected: state.to_move,
                actual: self.player,
            }));
        }
        codec::validate_against(state, action).map_err(|e| reject(e.into()))?;
        let predicted = rules::apply(state, action).map_err(|e| reject(e.into()))?;

        let index = self.confirmed.next_index();
        tracing::debug!(match_id = %self.match_id, index, %action, "move predicted");
        self.pending = Some(PendingMove {
            index,
            action,
            predicted,
        });
        Ok(ClientRequest::SubmitMove {
            match_id: self.match_id,
            player: self.player,
            claimed_index: index,
            action_id: u32::from(encode(action)),
        })
    }

    /// Fold in a broadcast.
    pub fn on_update(&mut self, update: &MatchUpdate) -> Reconciliation {
        if update.match_id != self.match_id {
            return Reconciliation::Ignored;
        }
        let outcome = self.reconcile(update);
        if outcome == Reconciliation::NeedsResync {
            self.pending = None;
        } else if outcome != Reconciliation::Ignored {
            self.status = update.status;
            self.undo = update.undo;
            self.clocks = update.clocks;
        }
        tracing::debug!(
            match_id = %self.match_id,
            log_len = update.log_len,
            outcome = ?outcome,
            "broadcast reconciled"
        );
        outcome
    }

    fn reconcile(&mut self, update: &MatchUpdate) -> Reconciliation {
        let local_len = self.confirmed.next_index();

        if update.truncated {
            if update.log_len > local_len {
                return Reconciliation::NeedsResync;
            }
            let mut log = self.confirmed.clone();
            log.truncate(update.log_len);
            let Ok(state) = replay(&self.snapshot, &log) else {
                return Reconciliation::NeedsResync;
            };
            if state.digest() != update.digest {
                return Reconciliation::NeedsResync;
            }
            self.confirmed = log;
            self.confirmed_state = state;
            self.pending = None;
            return Reconciliation::Rewound {
                log_len: update.log_len,
            };
        }

        let Some(entry) = update.appended else {
            if update.log_len != local_len || self.confirmed_state.digest() != update.digest {
                return Reconciliation::NeedsResync;
            }
            if update.status.is_closed() {
                if let Some(pending) = self.pending.take() {
                    return Reconciliation::Dropped {
                        index: pending.index,
                    };
                }
            }
            return Reconciliation::Refreshed;
        };

        if entry.index < local_len {
            // At-least-once delivery: already folded in.
            return Reconciliation::Ignored;
        }
        if entry.index > local_len {
            return Reconciliation::NeedsResync;
        }
        let Ok(next) = rules::apply(&self.confirmed_state, entry.action) else {
            return Reconciliation::NeedsResync;
        };
        if next.digest() != update.digest || !self.confirmed.push(entry) {
            return Reconciliation::NeedsResync;
        }
        self.confirmed_state = next;

        match self.pending.take() {
            Some(pending) if pending.index == entry.index && pending.action == entry.action => {
                self.retries_used = 0;
                Reconciliation::Confirmed { index: entry.index }
            }
            Some(_) => Reconciliation::Replaced { index: entry.index },
            None => Reconciliation::Applied { index: entry.index },
        }
    }

    /// The server refused our pending move. The prediction is rolled back.
    pub fn on_rejection(&mut self, error: &SyncError) -> RejectionOutcome {
        let pending = self.pending.take();
        let outcome = match (error.recovery(), pending) {
            (Recovery::RefetchAndRetry, Some(pending))
                if self.retries_used < self.retry.max_auto_retries =>
            {
                self.retries_used += 1;
                RejectionOutcome::Retry {
                    action: pending.action,
                }
            }
            (Recovery::Resync, _) => RejectionOutcome::Resync,
            _ => {
                self.retries_used = 0;
                RejectionOutcome::Surface
            }
        };
        tracing::debug!(
            match_id = %self.match_id,
            error = %error,
            outcome = ?outcome,
            "submission rejected"
        );
        outcome
    }

    /// Replace the whole local copy with an authoritative view.
    pub fn resync(&mut self, view: &MatchView) -> Result<(), SyncError> {
        let state = verified_replay(view)?;
        self.match_id = view.match_id;
        self.snapshot = view.snapshot.clone();
        self.confirmed = view.log.clone();
        self.confirmed_state = state;
        self.status = view.status;
        self.undo = view.undo;
        self.clocks = ClockSnapshot {
            remaining_ms: view.remaining_ms,
        };
        self.pending = None;
        tracing::debug!(match_id = %self.match_id, log_len = self.confirmed.len(), "resynced");
        Ok(())
    }
}

fn verified_replay(view: &MatchView) -> Result<GameState, SyncError> {
    let state = replay(&view.snapshot, &view.log)?;
    let actual = state.digest();
    if actual != view.digest {
        return Err(SyncError::Diverged {
            expected: view.digest,
            actual,
        });
    }
    Ok(state)
}
