//! Authoritative replay: the current game state is always recomputed from
//! the initial snapshot and the log, never stored on its own.

use crate::codec::{self, CodecError};
use crate::core::{Action, GameState, InitialSnapshot, PlayerId, WIRE_VERSION};
use crate::rules::{self, RulesError};

use super::log::MoveLogEntry;

/// A stored log that no longer replays.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("snapshot is wire version {found}, this build reads version {expected}")]
    VersionMismatch { expected: u16, found: u16 },

    #[error("entry at position {position} claims index {found}")]
    IndexGap { position: u32, found: u32 },

    #[error("entry {index} was made by {actual} but {expected} was to move")]
    WrongPlayer {
        index: u32,
        expected: PlayerId,
        actual: PlayerId,
    },

    #[error("entry {index} follows the end of the game")]
    PastTerminal { index: u32 },

    #[error("entry {index}: {source}")]
    Malformed { index: u32, source: CodecError },

    #[error("entry {index}: {source}")]
    Illegal { index: u32, source: RulesError },
}

/// Replay validated log entries on top of `snapshot`.
///
/// Deterministic: the same snapshot and entries always produce the same
/// bytes.
pub fn replay<'a>(
    snapshot: &InitialSnapshot,
    entries: impl IntoIterator<Item = &'a MoveLogEntry>,
) -> Result<GameState, ReplayError> {
    check_version(snapshot)?;
    let mut state = snapshot.state().clone();
    for (position, entry) in (0u32..).zip(entries) {
        if entry.index != position {
            return Err(ReplayError::IndexGap {
                position,
                found: entry.index,
            });
        }
        if entry.acting_player != state.to_move {
            return Err(ReplayError::WrongPlayer {
                index: entry.index,
                expected: state.to_move,
                actual: entry.acting_player,
            });
        }
        state = step(&state, entry.index, entry.action)?;
    }
    Ok(state)
}

/// Replay bare actions, each made by whoever is to move.
pub fn replay_actions(
    snapshot: &InitialSnapshot,
    actions: impl IntoIterator<Item = Action>,
) -> Result<GameState, ReplayError> {
    check_version(snapshot)?;
    let mut state = snapshot.state().clone();
    for (index, action) in (0u32..).zip(actions) {
        state = step(&state, index, action)?;
    }
    Ok(state)
}

fn check_version(snapshot: &InitialSnapshot) -> Result<(), ReplayError> {
    if snapshot.version != WIRE_VERSION {
        return Err(ReplayError::VersionMismatch {
            expected: WIRE_VERSION,
            found: snapshot.version,
        });
    }
    Ok(())
}

fn step(state: &GameState, index: u32, action: Action) -> Result<GameState, ReplayError> {
    if state.is_over() {
        return Err(ReplayError::PastTerminal { index });
    }
    codec::validate_against(state, action)
        .map_err(|source| ReplayError::Malformed { index, source })?;
    rules::apply(state, action).map_err(|source| ReplayError::Illegal { index, source })
}
