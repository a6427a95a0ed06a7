//! Persistence seam for authoritative matches.
//!
//! The validator only needs to load a match by id and write it back
//! conditionally: a write succeeds only if the stored match is still at the
//! revision the writer read. That conditional write keeps two validators
//! that share a store from overwriting each other, whether they both append
//! at the same index or one resigns while the other negotiates an undo.

use std::sync::RwLock;

use rustc_hash::FxHashMap;

use crate::matches::{MatchId, MatchState};

/// Errors surfaced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("match store lock was poisoned")]
    LockPoisoned,

    #[error("{0} already exists")]
    AlreadyExists(MatchId),

    #[error("{0} not found")]
    NotFound(MatchId),

    #[error("{match_id} changed underneath: expected revision {expected}, found {actual}")]
    Conflict {
        match_id: MatchId,
        expected: u64,
        actual: u64,
    },
}

/// Durable storage for matches, keyed by id.
pub trait MatchStore: Send + Sync {
    /// Store a new match. Fails if the id is taken.
    fn create(&self, state: &MatchState) -> Result<(), StoreError>;

    /// Load a match.
    fn load(&self, id: MatchId) -> Result<Option<MatchState>, StoreError>;

    /// Overwrite a match if the stored copy is still at `expected_revision`.
    fn save_if(&self, state: &MatchState, expected_revision: u64) -> Result<(), StoreError>;

    /// Ids of every stored match.
    fn ids(&self) -> Result<Vec<MatchId>, StoreError>;
}

/// In-memory store for tests and single-process servers.
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    matches: RwLock<FxHashMap<MatchId, MatchState>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchStore for InMemoryMatchStore {
    fn create(&self, state: &MatchState) -> Result<(), StoreError> {
        let mut matches = self
            .matches
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        if matches.contains_key(&state.id()) {
            return Err(StoreError::AlreadyExists(state.id()));
        }
        matches.insert(state.id(), state.clone());
        Ok(())
    }

    fn load(&self, id: MatchId) -> Result<Option<MatchState>, StoreError> {
        let matches = self
            .matches
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(matches.get(&id).cloned())
    }

    fn save_if(&self, state: &MatchState, expected_revision: u64) -> Result<(), StoreError> {
        let mut matches = self
            .matches
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let stored = matches
            .get_mut(&state.id())
            .ok_or(StoreError::NotFound(state.id()))?;
        let actual = stored.revision();
        if actual != expected_revision {
            return Err(StoreError::Conflict {
                match_id: state.id(),
                expected: expected_revision,
                actual,
            });
        }
        *stored = state.clone();
        Ok(())
    }

    fn ids(&self) -> Result<Vec<MatchId>, StoreError> {
        let matches = self
            .matches
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        let mut ids: Vec<MatchId> = matches.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
