//! Match errors and how a client should recover from each.

use crate::codec::CodecError;
use crate::core::{Action, PlayerId};
use crate::rules::{IllegalReason, RulesError};

use super::replay::ReplayError;

/// What the caller should do after a rejected request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// The client's prediction was wrong: replace it with the authoritative
    /// state. Never retried.
    Resync,
    /// Refetch the authoritative state, then retry once at most.
    RefetchAndRetry,
    /// Report to the user.
    Surface,
}

/// Errors from the match state machine.
///
/// Every rejected request leaves the match unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    MalformedAction(#[from] CodecError),

    #[error("illegal action {action}: {reason}")]
    IllegalAction {
        action: Action,
        reason: IllegalReason,
    },

    #[error("not your turn: {expected} is to move, got a request from {actual}")]
    NotYourTurn {
        expected: PlayerId,
        actual: PlayerId,
    },

    #[error("match is already over")]
    MatchAlreadyOver,

    #[error("stale submission: log has {expected_index} entries, request claimed index {claimed_index}")]
    StaleSubmission {
        expected_index: u32,
        claimed_index: u32,
    },

    #[error("match is waiting for an opponent")]
    MatchNotStarted,

    #[error("{0} is already seated")]
    AlreadySeated(PlayerId),

    #[error("undo is disabled for this match")]
    UndoDisabled,

    #[error("an undo request is already pending")]
    UndoAlreadyPending,

    #[error("undo target {target_index} is not before the end of a log of {log_len} entries")]
    UndoTargetOutOfRange { target_index: u32, log_len: u32 },

    #[error("no undo request is pending")]
    NoPendingUndo,

    #[error("{0} cannot answer their own undo request")]
    OwnUndoRequest(PlayerId),

    #[error("authoritative log does not replay: {0}")]
    CorruptLog(#[from] ReplayError),
}

impl From<RulesError> for MatchError {
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::IllegalAction { action, reason } => {
                MatchError::IllegalAction { action, reason }
            }
        }
    }
}

impl MatchError {
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        match self {
            MatchError::MalformedAction(_) | MatchError::IllegalAction { .. } => Recovery::Resync,
            MatchError::NotYourTurn { .. }
            | MatchError::MatchAlreadyOver
            | MatchError::StaleSubmission { .. } => Recovery::RefetchAndRetry,
            _ => Recovery::Surface,
        }
    }
}
