//! Errors raised by the sync layer.

use crate::core::StateDigest;
use crate::matches::{MatchError, MatchId, Recovery, ReplayError};

use super::store::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("{0} does not exist")]
    UnknownMatch(MatchId),

    #[error("{match_id} rejected the request: {source}")]
    Rejected {
        match_id: MatchId,
        source: MatchError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("local copy diverged: expected state {expected}, computed {actual}")]
    Diverged {
        expected: StateDigest,
        actual: StateDigest,
    },

    #[error("a predicted move is still awaiting confirmation")]
    PredictionPending,

    #[error("match lock was poisoned")]
    LockPoisoned,
}

impl SyncError {
    /// The match-level error, if the match itself refused the request.
    #[must_use]
    pub fn match_error(&self) -> Option<&MatchError> {
        match self {
            SyncError::Rejected { source, .. } => Some(source),
            _ => None,
        }
    }

    /// How a client should react. Infrastructure failures are surfaced.
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        match self {
            SyncError::Rejected { source, .. } => source.recovery(),
            SyncError::Store(StoreError::Conflict { .. }) | SyncError::Diverged { .. } => {
                Recovery::RefetchAndRetry
            }
            _ => Recovery::Surface,
        }
    }
}
