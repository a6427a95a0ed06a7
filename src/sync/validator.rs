//! The server validator: sole source of truth for every match.
//!
//! Each request runs under a per-match mutex:
//! 1. Load the match from the store
//! 2. Run the request against the `MatchState` (which replays the log)
//! 3. Write back conditionally on the revision that was loaded
//! 4. Broadcast the resulting update
//!
//! The mutex serializes writers inside one process; the conditional write
//! catches writers in other processes sharing the store. Of two concurrent
//! submissions at the same index exactly one is appended and the other gets
//! `StaleSubmission`.

use std::sync::{Arc, Mutex, RwLock};

use rustc_hash::FxHashMap;

use crate::core::{InitialSnapshot, MatchConfig, PlayerId, Terminal};
use crate::matches::{MatchError, MatchId, MatchState, MatchStatus, SubmitOutcome, UndoNegotiation};

use super::error::SyncError;
use super::protocol::{ClientRequest, MatchUpdate, MatchView};
use super::store::MatchStore;
use super::transport::{Broadcaster, TimeSource};

pub struct ServerValidator<S, B, T> {
    store: S,
    broadcaster: B,
    time: T,
    locks: RwLock<FxHashMap<MatchId, Arc<Mutex<()>>>>,
}

impl<S, B, T> ServerValidator<S, B, T>
where
    S: MatchStore,
    B: Broadcaster,
    T: TimeSource,
{
    pub fn new(store: S, broadcaster: B, time: T) -> Self {
        Self {
            store,
            broadcaster,
            time,
            locks: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    /// Create a match whose snapshot follows `config.placement`.
    pub fn create_match(&self, id: MatchId, config: MatchConfig) -> Result<MatchView, SyncError> {
        let now = self.time.now_ms();
        self.insert(MatchState::new(id, config, now), now)
    }

    /// Create a match from an explicit starting position.
    pub fn create_match_with_snapshot(
        &self,
        id: MatchId,
        config: MatchConfig,
        snapshot: InitialSnapshot,
    ) -> Result<MatchView, SyncError> {
        let now = self.time.now_ms();
        self.insert(MatchState::with_snapshot(id, config, snapshot, now), now)
    }

    /// Authoritative view of a match, for clients that need to resync.
    pub fn view(&self, id: MatchId) -> Result<MatchView, SyncError> {
        let state = self.load(id)?;
        Ok(MatchView::of(&state, self.time.now_ms())?)
    }

    /// Dispatch a wire request.
    pub fn handle(&self, request: ClientRequest) -> Result<MatchUpdate, SyncError> {
        let id = request.match_id();
        let (_, update) = match request {
            ClientRequest::Join { player, .. } => {
                self.mutate(id, |m, now| m.join(player, now).map(drop))?
            }
            ClientRequest::SubmitMove {
                player,
                claimed_index,
                action_id,
                ..
            } => self.mutate(id, |m, now| {
                m.submit_move(claimed_index, action_id, player, now).map(drop)
            })?,
            ClientRequest::RequestUndo {
                player,
                target_index,
                ..
            } => self.mutate(id, |m, now| {
                m.request_undo(player, target_index, now).map(drop)
            })?,
            ClientRequest::RespondUndo { player, accept, .. } => {
                self.mutate(id, |m, now| m.respond_undo(player, accept, now).map(drop))?
            }
            ClientRequest::Resign { player, .. } => {
                self.mutate(id, |m, now| m.resign(player, now).map(drop))?
            }
        };
        Ok(update)
    }

    pub fn join(&self, id: MatchId, player: PlayerId) -> Result<MatchStatus, SyncError> {
        Ok(self.mutate(id, |m, now| m.join(player, now))?.0)
    }

    pub fn submit_move(
        &self,
        id: MatchId,
        player: PlayerId,
        claimed_index: u32,
        action_id: u32,
    ) -> Result<SubmitOutcome, SyncError> {
        let (outcome, _) = self.mutate(id, |m, now| {
            m.submit_move(claimed_index, action_id, player, now)
        })?;
        if let Some(entry) = outcome.entry() {
            tracing::info!(
                match_id = %id,
                %player,
                index = entry.index,
                action = %entry.action,
                "move accepted"
            );
        }
        Ok(outcome)
    }

    pub fn request_undo(
        &self,
        id: MatchId,
        player: PlayerId,
        target_index: u32,
    ) -> Result<UndoNegotiation, SyncError> {
        Ok(self
            .mutate(id, |m, now| m.request_undo(player, target_index, now))?
            .0)
    }

    pub fn respond_undo(
        &self,
        id: MatchId,
        player: PlayerId,
        accept: bool,
    ) -> Result<UndoNegotiation, SyncError> {
        Ok(self
            .mutate(id, |m, now| m.respond_undo(player, accept, now))?
            .0)
    }

    pub fn resign(&self, id: MatchId, player: PlayerId) -> Result<Terminal, SyncError> {
        Ok(self.mutate(id, |m, now| m.resign(player, now))?.0)
    }

    pub fn abandon(&self, id: MatchId) -> Result<(), SyncError> {
        Ok(self.mutate(id, |m, now| m.abandon(now))?.0)
    }

    /// Idle check across every stored match. Returns the matches this call
    /// ended on time.
    pub fn sweep_timeouts(&self) -> Result<Vec<(MatchId, Terminal)>, SyncError> {
        let mut ended = Vec::new();
        for id in self.store.ids()? {
            let (terminal, _) = self.mutate(id, |m, now| m.check_timeout(now))?;
            if let Some(terminal) = terminal {
                tracing::info!(match_id = %id, winner = ?terminal.winner, "clock expired while idle");
                ended.push((id, terminal));
            }
        }
        Ok(ended)
    }

    // === Internals ===

    fn insert(&self, state: MatchState, now_ms: u64) -> Result<MatchView, SyncError> {
        self.store.create(&state)?;
        tracing::info!(match_id = %state.id(), "match created");
        Ok(MatchView::of(&state, now_ms)?)
    }

    fn load(&self, id: MatchId) -> Result<MatchState, SyncError> {
        self.store.load(id)?.ok_or(SyncError::UnknownMatch(id))
    }

    fn match_lock(&self, id: MatchId) -> Result<Arc<Mutex<()>>, SyncError> {
        {
            let locks = self.locks.read().map_err(|_| SyncError::LockPoisoned)?;
            if let Some(lock) = locks.get(&id) {
                return Ok(Arc::clone(lock));
            }
        }
        let mut locks = self.locks.write().map_err(|_| SyncError::LockPoisoned)?;
        Ok(Arc::clone(locks.entry(id).or_default()))
    }

    /// Run `op` against the stored match under its lock. Persists and
    /// broadcasts only if `op` succeeded and changed something.
    fn mutate<R>(
        &self,
        id: MatchId,
        op: impl FnOnce(&mut MatchState, u64) -> Result<R, MatchError>,
    ) -> Result<(R, MatchUpdate), SyncError> {
        let lock = self.match_lock(id)?;
        let _guard = lock.lock().map_err(|_| SyncError::LockPoisoned)?;

        let mut state = self.load(id)?;
        let previous_len = state.log().next_index();
        let previous_revision = state.revision();
        let now = self.time.now_ms();

        let value = match op(&mut state, now) {
            Ok(value) => value,
            Err(source) => {
                match &source {
                    MatchError::StaleSubmission {
                        expected_index,
                        claimed_index,
                    } => tracing::warn!(
                        match_id = %id,
                        expected_index,
                        claimed_index,
                        "stale submission rejected"
                    ),
                    other => tracing::warn!(match_id = %id, error = %other, "request rejected"),
                }
                return Err(SyncError::Rejected {
                    match_id: id,
                    source,
                });
            }
        };

        let update = MatchUpdate::describe(&state, previous_len)?;
        if state.revision() != previous_revision {
            self.store.save_if(&state, previous_revision)?;
            self.broadcaster.broadcast(&update);
        }
        Ok((value, update))
    }
}
