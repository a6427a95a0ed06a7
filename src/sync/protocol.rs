//! Wire messages between clients and the server validator.
//!
//! Requests carry actions as raw integers: whatever arrives off the wire is
//! decoded and validated by the server, never trusted. Broadcasts carry the
//! digest of the authoritative state so a client can prove it agrees with
//! the server after every entry.

use serde::{Deserialize, Serialize};

use crate::core::{InitialSnapshot, PlayerId, PlayerMap, StateDigest};
use crate::matches::{
    ClockSnapshot, MatchId, MatchState, MatchStatus, MoveLog, MoveLogEntry, ReplayError,
    UndoNegotiation,
};

/// A request from a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Join {
        match_id: MatchId,
        player: PlayerId,
    },
    SubmitMove {
        match_id: MatchId,
        player: PlayerId,
        claimed_index: u32,
        action_id: u32,
    },
    RequestUndo {
        match_id: MatchId,
        player: PlayerId,
        target_index: u32,
    },
    RespondUndo {
        match_id: MatchId,
        player: PlayerId,
        accept: bool,
    },
    Resign {
        match_id: MatchId,
        player: PlayerId,
    },
}

impl ClientRequest {
    #[must_use]
    pub fn match_id(&self) -> MatchId {
        match *self {
            ClientRequest::Join { match_id, .. }
            | ClientRequest::SubmitMove { match_id, .. }
            | ClientRequest::RequestUndo { match_id, .. }
            | ClientRequest::RespondUndo { match_id, .. }
            | ClientRequest::Resign { match_id, .. } => match_id,
        }
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        match *self {
            ClientRequest::Join { player, .. }
            | ClientRequest::SubmitMove { player, .. }
            | ClientRequest::RequestUndo { player, .. }
            | ClientRequest::RespondUndo { player, .. }
            | ClientRequest::Resign { player, .. } => player,
        }
    }
}

/// Broadcast after every accepted request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub match_id: MatchId,
    /// Authoritative log length after the request.
    pub log_len: u32,
    /// The entry the request appended, if any.
    pub appended: Option<MoveLogEntry>,
    /// The log was truncated to `log_len` by an accepted undo.
    pub truncated: bool,
    pub status: MatchStatus,
    pub undo: Option<UndoNegotiation>,
    pub clocks: ClockSnapshot,
    /// Digest of the replayed state after the request.
    pub digest: StateDigest,
}

impl MatchUpdate {
    /// Describe `state` after a request that started from a log of
    /// `previous_len` entries.
    pub fn describe(state: &MatchState, previous_len: u32) -> Result<Self, ReplayError> {
        let log_len = state.log().next_index();
        let appended = if log_len == previous_len.saturating_add(1) {
            state.log().last().copied()
        } else {
            None
        };
        Ok(Self {
            match_id: state.id(),
            log_len,
            appended,
            truncated: log_len < previous_len,
            status: state.status(),
            undo: state.undo(),
            clocks: state.clocks().snapshot(),
            digest: state.current_state()?.digest(),
        })
    }
}

/// Everything a client needs to rebuild its copy of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    pub match_id: MatchId,
    pub snapshot: InitialSnapshot,
    pub log: MoveLog,
    pub status: MatchStatus,
    pub undo: Option<UndoNegotiation>,
    /// Remaining time at the moment the view was taken, counting the
    /// running clock.
    pub remaining_ms: PlayerMap<u64>,
    pub digest: StateDigest,
}

impl MatchView {
    pub fn of(state: &MatchState, now_ms: u64) -> Result<Self, ReplayError> {
        let current = state.current_state()?;
        let remaining_ms = PlayerMap::new(|player| match state.status() {
            MatchStatus::InProgress => state
                .clocks()
                .remaining_at(player, current.to_move, now_ms),
            _ => state.clocks().remaining(player),
        });
        Ok(Self {
            match_id: state.id(),
            snapshot: state.snapshot().clone(),
            log: state.log().clone(),
            status: state.status(),
            undo: state.undo(),
            remaining_ms,
            digest: current.digest(),
        })
    }
}
