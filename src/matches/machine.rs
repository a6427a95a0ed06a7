//! The match state machine.
//!
//! ```text
//! WaitingForOpponent ──join×2──▶ InProgress ──win / resign / timeout──▶ Completed
//!          │                         │
//!          └──────────abandon────────┴──────────────────────────────▶ Abandoned
//! ```
//!
//! A `MatchState` stores the initial snapshot, the move log, clocks and
//! undo negotiation. The current `GameState` is derived by replay on
//! demand. Every operation either succeeds and records a journal entry, or
//! fails and leaves the whole match untouched.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::core::{
    GameState, InitialSnapshot, MatchConfig, PlayerId, PlayerMap, Terminal, TerminalReason,
};
use crate::rules;

use super::clock::Clocks;
use super::error::MatchError;
use super::events::{JournalEntry, MatchEvent, UndoNegotiation, UndoStatus};
use super::log::{MoveLog, MoveLogEntry};
use super::replay::{replay, ReplayError};

/// Identifier of a match, assigned by whoever creates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchStatus {
    WaitingForOpponent,
    InProgress,
    Completed { terminal: Terminal },
    Abandoned,
}

impl MatchStatus {
    /// No further moves will ever be accepted.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, MatchStatus::Completed { .. } | MatchStatus::Abandoned)
    }
}

/// Result of an accepted `submit_move`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The move was appended and the game continues.
    Appended(MoveLogEntry),
    /// The move was appended and ended the game.
    Completed {
        entry: MoveLogEntry,
        terminal: Terminal,
    },
    /// The mover's clock had already run out; the move was discarded.
    TimedOut(Terminal),
}

impl SubmitOutcome {
    /// The appended entry, unless the move was discarded.
    #[must_use]
    pub fn entry(&self) -> Option<&MoveLogEntry> {
        match self {
            SubmitOutcome::Appended(entry) | SubmitOutcome::Completed { entry, .. } => Some(entry),
            SubmitOutcome::TimedOut(_) => None,
        }
    }

    #[must_use]
    pub fn terminal(&self) -> Option<Terminal> {
        match self {
            SubmitOutcome::Appended(_) => None,
            SubmitOutcome::Completed { terminal, .. } | SubmitOutcome::TimedOut(terminal) => {
                Some(*terminal)
            }
        }
    }
}

/// Authoritative state of one match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    id: MatchId,
    config: MatchConfig,
    snapshot: InitialSnapshot,
    log: MoveLog,
    status: MatchStatus,
    seated: PlayerMap<bool>,
    undo: Option<UndoNegotiation>,
    clocks: Clocks,
    journal: Vector<JournalEntry>,
}

impl MatchState {
    /// Create a match whose snapshot follows `config.placement`.
    #[must_use]
    pub fn new(id: MatchId, config: MatchConfig, created_at_ms: u64) -> Self {
        let snapshot = InitialSnapshot::from_placement(config.placement);
        Self::with_snapshot(id, config, snapshot, created_at_ms)
    }

    /// Create a match from an explicit starting position.
    #[must_use]
    pub fn with_snapshot(
        id: MatchId,
        config: MatchConfig,
        snapshot: InitialSnapshot,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            clocks: Clocks::new(config.clocks, created_at_ms),
            config,
            snapshot,
            log: MoveLog::new(),
            status: MatchStatus::WaitingForOpponent,
            seated: PlayerMap::default(),
            undo: None,
            journal: Vector::new(),
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> MatchId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[must_use]
    pub fn snapshot(&self) -> &InitialSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn log(&self) -> &MoveLog {
        &self.log
    }

    #[must_use]
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    #[must_use]
    pub fn terminal(&self) -> Option<Terminal> {
        match self.status {
            MatchStatus::Completed { terminal } => Some(terminal),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_seated(&self, player: PlayerId) -> bool {
        self.seated[player]
    }

    #[must_use]
    pub fn undo(&self) -> Option<UndoNegotiation> {
        self.undo
    }

    #[must_use]
    pub fn clocks(&self) -> &Clocks {
        &self.clocks
    }

    #[must_use]
    pub fn journal(&self) -> &Vector<JournalEntry> {
        &self.journal
    }

    /// Counts every recorded transition. Two copies of a match with the same
    /// revision have been through the same history, even when their logs
    /// are the same length.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.journal.len() as u64
    }

    /// The current game state, recomputed from the snapshot and the log.
    pub fn current_state(&self) -> Result<GameState, ReplayError> {
        replay(&self.snapshot, &self.log)
    }

    /// Index of `player`'s most recent move: the target for "take back my
    /// last move".
    #[must_use]
    pub fn undo_target_for(&self, player: PlayerId) -> Option<u32> {
        self.log
            .iter()
            .rev()
            .find(|entry| entry.acting_player == player)
            .map(|entry| entry.index)
    }

    // === Transitions ===

    /// Seat a player. The match starts once both players are seated.
    pub fn join(&mut self, player: PlayerId, now_ms: u64) -> Result<MatchStatus, MatchError> {
        if self.status.is_closed() {
            return Err(MatchError::MatchAlreadyOver);
        }
        if self.seated[player] {
            return Err(MatchError::AlreadySeated(player));
        }

        self.seated[player] = true;
        self.record(now_ms, MatchEvent::Joined { player });

        if self.seated.iter().all(|(_, &seated)| seated) {
            self.status = MatchStatus::InProgress;
            self.clocks.restart(now_ms);
            self.record(now_ms, MatchEvent::Started);
            tracing::debug!(match_id = %self.id, "match started");
        }
        Ok(self.status)
    }

    /// Validate and append a move.
    ///
    /// Checks, in order: the match is open, `claimed_index` equals the log
    /// length, it is `acting`'s turn, the wire id decodes and is
    /// legal in the replayed state, and `acting` still has time. A move that
    /// arrives after the mover's clock ran out ends the match instead.
    pub fn submit_move(
        &mut self,
        claimed_index: u32,
        raw_action: u32,
        acting: PlayerId,
        now_ms: u64,
    ) -> Result<SubmitOutcome, MatchError> {
        self.ensure_in_progress()?;
        let state = self.current_state()?;
        if state.is_over() {
            return Err(MatchError::MatchAlreadyOver);
        }
        // The index check runs first so a duplicate of an accepted move is
        // reported as stale even though the turn has passed.
        let expected_index = self.log.next_index();
        if claimed_index != expected_index {
            return Err(MatchError::StaleSubmission {
                expected_index,
                claimed_index,
            });
        }
        if acting != state.to_move {
            return Err(MatchError::NotYourTurn {
                expected: state.to_move,
                actual: acting,
            });
        }

        let action = codec::decode_for(&state, raw_action)?;
        let next = rules::apply(&state, action)?;

        let clock_snapshot = match self.clocks.charge(acting, now_ms) {
            Ok(snapshot) => snapshot,
            Err(expired) => {
                tracing::debug!(
                    match_id = %self.id,
                    player = %expired.player,
                    elapsed_ms = expired.elapsed_ms,
                    remaining_ms = expired.remaining_ms,
                    "late move discarded"
                );
                return Ok(SubmitOutcome::TimedOut(self.time_out(acting, now_ms)));
            }
        };

        if let Some(negotiation) = self.undo.take() {
            self.record(now_ms, MatchEvent::UndoCancelled { negotiation });
        }
        let entry = self.log.append(acting, action, clock_snapshot, now_ms);
        self.record(
            now_ms,
            MatchEvent::MoveAppended {
                index: entry.index,
                player: acting,
                action,
            },
        );
        tracing::debug!(match_id = %self.id, index = entry.index, %action, "move appended");

        match next.terminal {
            Some(terminal) => {
                self.complete(terminal, now_ms);
                Ok(SubmitOutcome::Completed { entry, terminal })
            }
            None => Ok(SubmitOutcome::Appended(entry)),
        }
    }

    /// Ask to truncate the log back to `target_index` entries.
    pub fn request_undo(
        &mut self,
        requester: PlayerId,
        target_index: u32,
        now_ms: u64,
    ) -> Result<UndoNegotiation, MatchError> {
        if !self.config.allow_undo {
            return Err(MatchError::UndoDisabled);
        }
        self.ensure_in_progress()?;
        let log_len = self.log.next_index();
        if target_index >= log_len {
            return Err(MatchError::UndoTargetOutOfRange {
                target_index,
                log_len,
            });
        }
        if self.undo.is_some() {
            return Err(MatchError::UndoAlreadyPending);
        }

        let negotiation = UndoNegotiation {
            requested_by: requester,
            target_index,
            status: UndoStatus::Pending,
        };
        self.undo = Some(negotiation);
        self.record(
            now_ms,
            MatchEvent::UndoRequested {
                by: requester,
                target_index,
            },
        );
        tracing::debug!(match_id = %self.id, %requester, target_index, "undo requested");
        Ok(negotiation)
    }

    /// Accept or reject the pending undo request.
    ///
    /// Accepting charges the player to move for the time used so far, the
    /// negotiation included, with no increment, then truncates the log. If
    /// that charge exhausts their budget the match ends on time instead and
    /// the request comes back as [`UndoStatus::Lapsed`].
    pub fn respond_undo(
        &mut self,
        responder: PlayerId,
        accept: bool,
        now_ms: u64,
    ) -> Result<UndoNegotiation, MatchError> {
        self.ensure_in_progress()?;
        let pending = self.undo.ok_or(MatchError::NoPendingUndo)?;
        if responder == pending.requested_by {
            return Err(MatchError::OwnUndoRequest(responder));
        }

        if accept {
            let to_move = self.current_state()?.to_move;
            if let Err(expired) = self.clocks.consume(to_move, now_ms) {
                tracing::debug!(
                    match_id = %self.id,
                    player = %expired.player,
                    elapsed_ms = expired.elapsed_ms,
                    remaining_ms = expired.remaining_ms,
                    "clock ran out during undo negotiation"
                );
                let negotiation = UndoNegotiation {
                    status: UndoStatus::Lapsed,
                    ..pending
                };
                self.undo = None;
                self.record(now_ms, MatchEvent::UndoCancelled { negotiation });
                self.time_out(to_move, now_ms);
                return Ok(negotiation);
            }
        }

        let negotiation = UndoNegotiation {
            status: if accept {
                UndoStatus::Accepted
            } else {
                UndoStatus::Rejected
            },
            ..pending
        };
        self.undo = None;
        if accept {
            self.log.truncate(negotiation.target_index);
        }
        self.record(
            now_ms,
            MatchEvent::UndoResolved {
                negotiation,
                responder,
            },
        );
        tracing::debug!(
            match_id = %self.id,
            %responder,
            accepted = accept,
            log_len = self.log.len(),
            "undo resolved"
        );
        Ok(negotiation)
    }

    /// Resign. The opponent wins; the board is not consulted.
    pub fn resign(&mut self, player: PlayerId, now_ms: u64) -> Result<Terminal, MatchError> {
        self.ensure_in_progress()?;
        self.undo = None;
        self.record(now_ms, MatchEvent::Resigned { player });
        let terminal = Terminal::won_by(player.other(), TerminalReason::Resignation);
        self.complete(terminal, now_ms);
        Ok(terminal)
    }

    /// Idle check: end the match if the player to move has run out of time.
    ///
    /// Returns the terminal outcome if this call ended the match.
    pub fn check_timeout(&mut self, now_ms: u64) -> Result<Option<Terminal>, MatchError> {
        if self.status != MatchStatus::InProgress {
            return Ok(None);
        }
        let to_move = self.current_state()?.to_move;
        if self.clocks.check(to_move, now_ms).is_ok() {
            return Ok(None);
        }
        Ok(Some(self.time_out(to_move, now_ms)))
    }

    /// Close a match that will never finish.
    pub fn abandon(&mut self, now_ms: u64) -> Result<(), MatchError> {
        if self.status.is_closed() {
            return Err(MatchError::MatchAlreadyOver);
        }
        self.status = MatchStatus::Abandoned;
        self.undo = None;
        self.record(now_ms, MatchEvent::Abandoned);
        tracing::debug!(match_id = %self.id, "match abandoned");
        Ok(())
    }

    // === Helpers ===

    fn ensure_in_progress(&self) -> Result<(), MatchError> {
        match self.status {
            MatchStatus::InProgress => Ok(()),
            MatchStatus::WaitingForOpponent => Err(MatchError::MatchNotStarted),
            MatchStatus::Completed { .. } | MatchStatus::Abandoned => {
                Err(MatchError::MatchAlreadyOver)
            }
        }
    }

    fn time_out(&mut self, player: PlayerId, now_ms: u64) -> Terminal {
        self.undo = None;
        self.record(now_ms, MatchEvent::TimedOut { player });
        let terminal = Terminal::won_by(player.other(), TerminalReason::Timeout);
        self.complete(terminal, now_ms);
        terminal
    }

    fn complete(&mut self, terminal: Terminal, now_ms: u64) {
        self.status = MatchStatus::Completed { terminal };
        self.record(now_ms, MatchEvent::Completed { terminal });
        tracing::debug!(
            match_id = %self.id,
            winner = ?terminal.winner,
            reason = %terminal.reason,
            "match completed"
        );
    }

    fn record(&mut self, at_ms: u64, event: MatchEvent) {
        self.journal.push_back(JournalEntry { at_ms, event });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::core::{ClockConfig, Position, SnapshotBuilder};
    use crate::matches::error::Recovery;

    fn started(config: MatchConfig) -> MatchState {
        let mut game = MatchState::new(MatchId(1), config, 0);
        game.join(PlayerId::ZERO, 0).unwrap();
        game.join(PlayerId::ONE, 0).unwrap();
        game
    }

    fn first_legal(game: &MatchState) -> u32 {
        let state = game.current_state().unwrap();
        u32::from(encode(rules::legal_actions(&state)[0]))
    }

    #[test]
    fn test_lifecycle() {
        let mut game = MatchState::new(MatchId(7), MatchConfig::default(), 0);
        assert_eq!(game.status(), MatchStatus::WaitingForOpponent);

        assert_eq!(
            game.submit_move(0, 0, PlayerId::ZERO, 0),
            Err(MatchError::MatchNotStarted)
        );
        assert_eq!(
            game.join(PlayerId::ZERO, 5).unwrap(),
            MatchStatus::WaitingForOpponent
        );
        assert_eq!(
            game.join(PlayerId::ZERO, 6),
            Err(MatchError::AlreadySeated(PlayerId::ZERO))
        );
        assert_eq!(game.join(PlayerId::ONE, 10).unwrap(), MatchStatus::InProgress);
        assert_eq!(game.clocks().reference_ms(), 10);
    }

    #[test]
    fn test_accepted_move_appends_and_charges() {
        let config = MatchConfig::default().with_clocks(ClockConfig::new(10_000, 1_000));
        let mut game = started(config);
        let raw = first_legal(&game);

        let outcome = game.submit_move(0, raw, PlayerId::ZERO, 2_500).unwrap();
        let entry = outcome.entry().copied().unwrap();

        assert_eq!(entry.index, 0);
        assert_eq!(entry.server_timestamp, 2_500);
        assert_eq!(entry.clock_snapshot.remaining(PlayerId::ZERO), 8_500);
        assert_eq!(entry.clock_snapshot.remaining(PlayerId::ONE), 10_000);
        assert_eq!(game.current_state().unwrap().to_move, PlayerId::ONE);
    }

    #[test]
    fn test_rejections_leave_match_unchanged() {
        let mut game = started(MatchConfig::default());
        let raw = first_legal(&game);
        let before = game.clone();

        assert_eq!(
            game.submit_move(0, raw, PlayerId::ONE, 1),
            Err(MatchError::NotYourTurn {
                expected: PlayerId::ZERO,
                actual: PlayerId::ONE
            })
        );
        assert_eq!(
            game.submit_move(1, raw, PlayerId::ZERO, 1),
            Err(MatchError::StaleSubmission {
                expected_index: 0,
                claimed_index: 1
            })
        );
        let err = game.submit_move(0, 500, PlayerId::ZERO, 1).unwrap_err();
        assert_eq!(err.recovery(), Recovery::Resync);

        assert_eq!(game, before);
    }

    #[test]
    fn test_illegal_action_rejected() {
        let mut game = started(MatchConfig::default());
        // Worker 0 at (2,1) moves north-east onto player 1's worker at (1,2).
        let raw = 2 * 9 + 7;
        assert!(matches!(
            game.submit_move(0, raw, PlayerId::ZERO, 1),
            Err(MatchError::IllegalAction { .. })
        ));
        assert!(game.log().is_empty());
    }

    #[test]
    fn test_winning_move_completes_match() {
        let at = |r, c| Position::new(r, c).unwrap();
        let snapshot = SnapshotBuilder::from_state(InitialSnapshot::standard().state())
            .level(at(2, 1), 2)
            .level(at(1, 1), 3)
            .build()
            .unwrap();
        let mut game = MatchState::with_snapshot(MatchId(2), MatchConfig::default(), snapshot, 0);
        game.join(PlayerId::ZERO, 0).unwrap();
        game.join(PlayerId::ONE, 0).unwrap();

        // Worker 0 north, null build.
        let outcome = game.submit_move(0, 9 + 4, PlayerId::ZERO, 100).unwrap();
        let terminal = Terminal::won_by(PlayerId::ZERO, TerminalReason::ReachedLevelThree);

        assert_eq!(outcome.terminal(), Some(terminal));
        assert_eq!(game.status(), MatchStatus::Completed { terminal });
        assert_eq!(
            game.submit_move(1, 0, PlayerId::ZERO, 200),
            Err(MatchError::MatchAlreadyOver)
        );
    }

    #[test]
    fn test_late_move_times_out() {
        let config = MatchConfig::default().with_clocks(ClockConfig::new(500, 0));
        let mut game = started(config);
        let raw = first_legal(&game);

        let outcome = game.submit_move(0, raw, PlayerId::ZERO, 1_200).unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::TimedOut(Terminal::won_by(PlayerId::ONE, TerminalReason::Timeout))
        );
        assert!(game.log().is_empty());
        assert!(game.status().is_closed());
    }

    #[test]
    fn test_check_timeout() {
        let config = MatchConfig::default().with_clocks(ClockConfig::new(1_000, 0));
        let mut game = started(config);

        assert_eq!(game.check_timeout(1_000).unwrap(), None);
        assert_eq!(
            game.check_timeout(1_001).unwrap(),
            Some(Terminal::won_by(PlayerId::ONE, TerminalReason::Timeout))
        );
        assert_eq!(game.check_timeout(5_000).unwrap(), None);
    }

    #[test]
    fn test_undo_accept_truncates() {
        let mut game = started(MatchConfig::default().with_undo(true));
        let before = game.current_state().unwrap();
        let raw = first_legal(&game);
        game.submit_move(0, raw, PlayerId::ZERO, 10).unwrap();

        game.request_undo(PlayerId::ZERO, 0, 20).unwrap();
        assert_eq!(
            game.respond_undo(PlayerId::ZERO, true, 30),
            Err(MatchError::OwnUndoRequest(PlayerId::ZERO))
        );
        let resolved = game.respond_undo(PlayerId::ONE, true, 30).unwrap();

        assert_eq!(resolved.status, UndoStatus::Accepted);
        assert!(game.log().is_empty());
        assert_eq!(game.undo(), None);
        assert_eq!(game.current_state().unwrap(), before);

        // Player one was to move from 10 until the answer at 30.
        assert_eq!(game.clocks().remaining(PlayerId::ZERO), 300_000 - 10 + 5_000);
        assert_eq!(game.clocks().remaining(PlayerId::ONE), 300_000 - 20);
        assert_eq!(game.clocks().reference_ms(), 30);
    }

    #[test]
    fn test_undo_lapses_when_clock_runs_out() {
        let config = MatchConfig::default().with_clocks(ClockConfig::new(1_000, 0));
        let mut game = started(config);
        let raw = first_legal(&game);
        game.submit_move(0, raw, PlayerId::ZERO, 100).unwrap();
        game.request_undo(PlayerId::ZERO, 0, 200).unwrap();

        let resolved = game.respond_undo(PlayerId::ONE, true, 1_500).unwrap();

        assert_eq!(resolved.status, UndoStatus::Lapsed);
        assert_eq!(game.log().len(), 1);
        assert_eq!(game.undo(), None);
        assert_eq!(
            game.terminal(),
            Some(Terminal::won_by(PlayerId::ZERO, TerminalReason::Timeout))
        );
    }

    #[test]
    fn test_revision_counts_transitions() {
        let mut game = started(MatchConfig::default());
        assert_eq!(game.revision(), 3);

        let raw = first_legal(&game);
        game.submit_move(0, raw, PlayerId::ZERO, 10).unwrap();
        game.request_undo(PlayerId::ZERO, 0, 20).unwrap();
        let requested = game.revision();
        assert_eq!(game.log().len(), 1);

        game.respond_undo(PlayerId::ONE, false, 30).unwrap();
        assert_eq!(game.log().len(), 1);
        assert_eq!(game.revision(), requested + 1);

        // Refused requests leave no trace.
        assert!(game.request_undo(PlayerId::ZERO, 5, 40).is_err());
        assert_eq!(game.revision(), requested + 1);
    }

    #[test]
    fn test_undo_reject_keeps_log() {
        let mut game = started(MatchConfig::default().with_undo(true));
        let raw = first_legal(&game);
        game.submit_move(0, raw, PlayerId::ZERO, 10).unwrap();

        game.request_undo(PlayerId::ZERO, 0, 20).unwrap();
        let resolved = game.respond_undo(PlayerId::ONE, false, 30).unwrap();

        assert_eq!(resolved.status, UndoStatus::Rejected);
        assert_eq!(game.log().len(), 1);
        assert_eq!(game.undo(), None);
    }

    #[test]
    fn test_undo_preconditions() {
        let mut game = started(MatchConfig::default().with_undo(false));
        assert_eq!(
            game.request_undo(PlayerId::ZERO, 0, 0),
            Err(MatchError::UndoDisabled)
        );

        let mut game = started(MatchConfig::default());
        assert_eq!(
            game.request_undo(PlayerId::ZERO, 0, 0),
            Err(MatchError::UndoTargetOutOfRange {
                target_index: 0,
                log_len: 0
            })
        );
        assert_eq!(
            game.respond_undo(PlayerId::ONE, true, 0),
            Err(MatchError::NoPendingUndo)
        );

        let raw = first_legal(&game);
        game.submit_move(0, raw, PlayerId::ZERO, 10).unwrap();
        game.request_undo(PlayerId::ONE, 0, 20).unwrap();
        assert_eq!(
            game.request_undo(PlayerId::ZERO, 0, 20),
            Err(MatchError::UndoAlreadyPending)
        );
    }

    #[test]
    fn test_new_move_cancels_pending_undo() {
        let mut game = started(MatchConfig::default().with_undo(true));
        let raw = first_legal(&game);
        game.submit_move(0, raw, PlayerId::ZERO, 10).unwrap();
        game.request_undo(PlayerId::ZERO, 0, 20).unwrap();

        let raw = first_legal(&game);
        game.submit_move(1, raw, PlayerId::ONE, 30).unwrap();

        assert_eq!(game.undo(), None);
        assert!(game
            .journal()
            .iter()
            .any(|line| matches!(line.event, MatchEvent::UndoCancelled { .. })));
    }

    #[test]
    fn test_resign() {
        let mut game = started(MatchConfig::default());
        let terminal = game.resign(PlayerId::ONE, 50).unwrap();

        assert_eq!(
            terminal,
            Terminal::won_by(PlayerId::ZERO, TerminalReason::Resignation)
        );
        assert_eq!(game.resign(PlayerId::ZERO, 60), Err(MatchError::MatchAlreadyOver));
    }

    #[test]
    fn test_abandon() {
        let mut game = MatchState::new(MatchId(3), MatchConfig::default(), 0);
        game.abandon(10).unwrap();

        assert_eq!(game.status(), MatchStatus::Abandoned);
        assert_eq!(game.abandon(20), Err(MatchError::MatchAlreadyOver));
        assert_eq!(
            game.join(PlayerId::ZERO, 30),
            Err(MatchError::MatchAlreadyOver)
        );
    }

    #[test]
    fn test_undo_target_for() {
        let mut game = started(MatchConfig::default());
        assert_eq!(game.undo_target_for(PlayerId::ZERO), None);

        for index in 0..3 {
            let player = game.current_state().unwrap().to_move;
            let raw = first_legal(&game);
            game.submit_move(index, raw, player, u64::from(index)).unwrap();
        }

        assert_eq!(game.undo_target_for(PlayerId::ZERO), Some(2));
        assert_eq!(game.undo_target_for(PlayerId::ONE), Some(1));
    }

    #[test]
    fn test_match_state_round_trips_through_json() {
        let mut game = started(MatchConfig::default());
        let raw = first_legal(&game);
        game.submit_move(0, raw, PlayerId::ZERO, 10).unwrap();

        let json = serde_json::to_string(&game).unwrap();
        let back: MatchState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, game);
    }
}
