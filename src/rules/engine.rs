//! Rules engine trait and the standard Santorini rules.
//!
//! The engine answers three questions about a `GameState`:
//! - What actions are legal
//! - What state an action produces
//! - Whether the game is over
//!
//! All three are pure: no I/O, no clock, no randomness. Enumeration order is
//! fixed (worker, then move direction, then build direction, each in table
//! order) so independent callers see identical results.

use serde::{Deserialize, Serialize};

use crate::core::{
    Action, Direction, GameState, Position, Terminal, TerminalReason, Worker, WorkerIndex,
    WINNING_LEVEL,
};

/// Why an action is not legal in a given state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IllegalReason {
    /// The game has already ended.
    GameOver,
    /// The acting worker is not on the board.
    WorkerMissing,
    /// The move leaves the board.
    MoveOffBoard,
    /// Another worker stands on the target cell.
    TargetOccupied,
    /// The target cell is domed.
    TargetDomed,
    /// The target is more than one level above the source.
    ClimbTooHigh,
    /// A non-winning move did not name a build.
    BuildMissing,
    /// The build leaves the board.
    BuildOffBoard,
    /// A worker stands on the build cell.
    BuildOccupied,
    /// The build cell is already domed.
    BuildOnDome,
}

impl std::fmt::Display for IllegalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            IllegalReason::GameOver => "the game is over",
            IllegalReason::WorkerMissing => "the worker is not on the board",
            IllegalReason::MoveOffBoard => "the move leaves the board",
            IllegalReason::TargetOccupied => "the target cell is occupied",
            IllegalReason::TargetDomed => "the target cell is domed",
            IllegalReason::ClimbTooHigh => "the target is more than one level up",
            IllegalReason::BuildMissing => "no build was given for a non-winning move",
            IllegalReason::BuildOffBoard => "the build leaves the board",
            IllegalReason::BuildOccupied => "the build cell is occupied",
            IllegalReason::BuildOnDome => "the build cell is already domed",
        };
        f.write_str(text)
    }
}

/// Errors from [`RulesEngine::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("illegal action {action}: {reason}")]
    IllegalAction {
        action: Action,
        reason: IllegalReason,
    },
}

/// What a legal action does once its move is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The worker reaches level 3; the build step is skipped.
    Win { from: Position, to: Position },
    /// Ordinary move followed by a build.
    Build {
        from: Position,
        to: Position,
        build: Position,
    },
}

/// Rules engine trait.
///
/// `StandardRules` is the only implementation shipped; the trait exists so
/// the search code and reference interpreters can be written against the
/// contract rather than the type.
pub trait RulesEngine {
    /// Resolve an action against a state, or explain why it is illegal.
    ///
    /// For a winning move the build field is not examined.
    fn resolve(&self, state: &GameState, action: Action) -> Result<Resolution, IllegalReason>;

    /// Enumerate every legal action for the player to move.
    ///
    /// Winning moves appear exactly once, with the null build direction.
    /// Returns empty for a terminal state.
    fn legal_actions(&self, state: &GameState) -> Vec<Action>;

    /// Apply an action, producing a new state.
    fn apply(&self, state: &GameState, action: Action) -> Result<GameState, RulesError>;

    /// Check if the game is over.
    ///
    /// Returns `Some(terminal)` if the game has ended, `None` if it continues.
    fn is_terminal(&self, state: &GameState) -> Option<Terminal>;

    // === Convenience Methods ===

    /// Is `action` legal in `state`?
    fn is_legal(&self, state: &GameState, action: Action) -> bool {
        self.resolve(state, action).is_ok()
    }

    /// Does the player to move have at least one legal action?
    fn has_legal_action(&self, state: &GameState) -> bool {
        !self.legal_actions(state).is_empty()
    }
}

/// Classic two-player Santorini without god powers.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardRules;

impl StandardRules {
    /// Resolve just the movement half of an action.
    fn resolve_move(
        state: &GameState,
        worker: WorkerIndex,
        movement: Direction,
    ) -> Result<(Position, Position), IllegalReason> {
        if state.terminal.is_some() {
            return Err(IllegalReason::GameOver);
        }
        let board = &state.board;
        let from = board
            .worker_position(Worker::new(state.to_move, worker))
            .ok_or(IllegalReason::WorkerMissing)?;
        let to = from.step(movement).ok_or(IllegalReason::MoveOffBoard)?;

        let target = board.cell(to);
        if !target.is_free() {
            return Err(IllegalReason::TargetOccupied);
        }
        if target.is_domed() {
            return Err(IllegalReason::TargetDomed);
        }
        if target.level > board.level(from) + 1 {
            return Err(IllegalReason::ClimbTooHigh);
        }
        Ok((from, to))
    }

    /// Resolve the build half, given the worker moved `from` → `to`.
    fn resolve_build(
        state: &GameState,
        from: Position,
        to: Position,
        build: Direction,
    ) -> Result<Position, IllegalReason> {
        if build.is_null() {
            return Err(IllegalReason::BuildMissing);
        }
        let at = to.step(build).ok_or(IllegalReason::BuildOffBoard)?;
        let cell = state.board.cell(at);
        // The vacated source cell is free after the move.
        if at != from && !cell.is_free() {
            return Err(IllegalReason::BuildOccupied);
        }
        if cell.is_domed() {
            return Err(IllegalReason::BuildOnDome);
        }
        Ok(at)
    }

    fn for_each_legal(state: &GameState, mut visit: impl FnMut(Action) -> bool) {
        for worker in WorkerIndex::all() {
            for movement in Direction::adjacent() {
                let Ok((from, to)) = Self::resolve_move(state, worker, movement) else {
                    continue;
                };
                if state.board.level(to) == WINNING_LEVEL {
                    if let Some(action) = Action::without_build(worker, movement) {
                        if !visit(action) {
                            return;
                        }
                    }
                    continue;
                }
                for build in Direction::adjacent() {
                    if Self::resolve_build(state, from, to, build).is_err() {
                        continue;
                    }
                    if let Some(action) = Action::new(worker, movement, build) {
                        if !visit(action) {
                            return;
                        }
                    }
                }
            }
        }
    }
}

impl RulesEngine for StandardRules {
    fn resolve(&self, state: &GameState, action: Action) -> Result<Resolution, IllegalReason> {
        let (from, to) = Self::resolve_move(state, action.worker(), action.movement())?;
        if state.board.level(to) == WINNING_LEVEL {
            return Ok(Resolution::Win { from, to });
        }
        let build = Self::resolve_build(state, from, to, action.build())?;
        Ok(Resolution::Build { from, to, build })
    }

    fn legal_actions(&self, state: &GameState) -> Vec<Action> {
        let mut actions = Vec::new();
        Self::for_each_legal(state, |action| {
            actions.push(action);
            true
        });
        actions
    }

    fn apply(&self, state: &GameState, action: Action) -> Result<GameState, RulesError> {
        let resolution = self
            .resolve(state, action)
            .map_err(|reason| RulesError::IllegalAction { action, reason })?;

        let mover = state.to_move;
        let mut next = state.clone();
        next.ply = next.ply.saturating_add(1);

        let (from, to) = match resolution {
            Resolution::Win { from, to } | Resolution::Build { from, to, .. } => (from, to),
        };
        let worker = next.board.cell_mut(from).occupant.take();
        next.board.cell_mut(to).occupant = worker;

        match resolution {
            Resolution::Win { .. } => {
                next.terminal = Some(Terminal::won_by(mover, TerminalReason::ReachedLevelThree));
            }
            Resolution::Build { build, .. } => {
                next.board.cell_mut(build).level += 1;
                next.to_move = mover.other();
                if !self.has_legal_action(&next) {
                    next.terminal = Some(Terminal::won_by(mover, TerminalReason::NoLegalActions));
                }
            }
        }
        Ok(next)
    }

    fn is_terminal(&self, state: &GameState) -> Option<Terminal> {
        state.terminal.or_else(|| {
            (!self.has_legal_action(state))
                .then(|| Terminal::won_by(state.to_move.other(), TerminalReason::NoLegalActions))
        })
    }

    fn has_legal_action(&self, state: &GameState) -> bool {
        let mut found = false;
        Self::for_each_legal(state, |_| {
            found = true;
            false
        });
        found
    }
}
