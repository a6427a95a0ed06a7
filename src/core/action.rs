//! Action representation: which worker moves where, then where it builds.
//!
//! An `Action` is a request, not a move. It only gains meaning when
//! interpreted against a `GameState` by the rules engine.
//!
//! ```
//! use santorini_sync::core::{Action, Direction, WorkerIndex};
//!
//! // Worker 0 steps north, then builds on the cell it just left.
//! let action = Action::new(WorkerIndex::FIRST, Direction::NORTH, Direction::SOUTH).unwrap();
//! assert_eq!(action.worker(), WorkerIndex::FIRST);
//!
//! // A worker always moves to an adjacent cell.
//! assert!(Action::new(WorkerIndex::FIRST, Direction::NULL, Direction::SOUTH).is_none());
//! ```

use serde::{Deserialize, Serialize};

use super::board::{Direction, WorkerIndex};

/// A (worker, move direction, build direction) triple.
///
/// The move direction is never the null direction. The build direction is
/// null only for moves that win outright, where the build step is skipped.
///
/// On the wire an action is its codec id (see [`crate::codec`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Action {
    worker: WorkerIndex,
    movement: Direction,
    build: Direction,
}

impl Action {
    /// Create an action. Returns `None` if `movement` is the null direction.
    #[must_use]
    pub fn new(worker: WorkerIndex, movement: Direction, build: Direction) -> Option<Self> {
        if movement.is_null() {
            return None;
        }
        Some(Self {
            worker,
            movement,
            build,
        })
    }

    /// An action whose build step is skipped (the canonical form of a winning move).
    #[must_use]
    pub fn without_build(worker: WorkerIndex, movement: Direction) -> Option<Self> {
        Self::new(worker, movement, Direction::NULL)
    }

    #[must_use]
    pub const fn worker(&self) -> WorkerIndex {
        self.worker
    }

    #[must_use]
    pub const fn movement(&self) -> Direction {
        self.movement
    }

    #[must_use]
    pub const fn build(&self) -> Direction {
        self.build
    }

    /// Same action with the build field replaced.
    #[must_use]
    pub const fn with_build(self, build: Direction) -> Self {
        Self { build, ..self }
    }

    /// Same action performed by the player's other worker.
    #[must_use]
    pub const fn with_worker(self, worker: WorkerIndex) -> Self {
        Self { worker, ..self }
    }

    /// Assemble an action whose move direction is already known to be non-null.
    pub(crate) const fn from_parts(
        worker: WorkerIndex,
        movement: Direction,
        build: Direction,
    ) -> Self {
        Self {
            worker,
            movement,
            build,
        }
    }

    /// Does this action skip its build step?
    #[must_use]
    pub const fn skips_build(&self) -> bool {
        self.build.is_null()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "worker {} moves {}",
            self.worker.index() + 1,
            self.movement.arrow()
        )?;
        if self.skips_build() {
            write!(f, " without building")
        } else {
            write!(f, " then builds {}", self.build.arrow())
        }
    }
}
