//! Initial snapshots: the versioned starting point every replay begins from.
//!
//! ## Construction
//!
//! - [`InitialSnapshot::standard`]: fixed cross placement
//! - [`InitialSnapshot::random`]: four distinct cells from a seeded RNG
//! - [`SnapshotBuilder`]: a board editor for custom positions, validated on
//!   `build()` (exactly two workers per player, levels 0-4, no worker on a
//!   dome)

use serde::{Deserialize, Serialize};

use super::board::{Board, Position, Worker, WorkerIndex, DOME_LEVEL};
use super::config::Placement;
use super::player::PlayerId;
use super::rng::GameRng;
use super::state::{GameState, WIRE_VERSION};

/// Errors from [`SnapshotBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("{player} has {found} workers on the board, expected 2")]
    WorkerCount { player: PlayerId, found: usize },

    #[error("level {level} at {position} is outside 0-4")]
    LevelOutOfRange { position: Position, level: u8 },

    #[error("worker placed on the dome at {position}")]
    WorkerOnDome { position: Position },

    #[error("worker {} of {} placed twice", .worker.index.index(), .worker.owner)]
    DuplicateWorker { worker: Worker },
}

/// The versioned starting state of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialSnapshot {
    /// Wire version the log that follows this snapshot is encoded with.
    pub version: u16,
    state: GameState,
}

impl InitialSnapshot {
    /// Empty board, cross placement, player 0 to move.
    #[must_use]
    pub fn standard() -> Self {
        let place = |row, col| Position::new(row, col);
        let mut builder = SnapshotBuilder::new();
        for (pos, owner, index) in [
            (place(2, 1), PlayerId::ZERO, WorkerIndex::FIRST),
            (place(2, 3), PlayerId::ZERO, WorkerIndex::SECOND),
            (place(1, 2), PlayerId::ONE, WorkerIndex::FIRST),
            (place(3, 2), PlayerId::ONE, WorkerIndex::SECOND),
        ] {
            if let Some(pos) = pos {
                builder = builder.place(pos, Worker::new(owner, index));
            }
        }
        builder.into_snapshot_unchecked()
    }

    /// Empty board with the four workers on distinct seeded-random cells.
    #[must_use]
    pub fn random(seed: u64) -> Self {
        let mut rng = GameRng::new(seed);
        let mut cells: Vec<Position> = Position::all().collect();
        rng.shuffle(&mut cells);

        let workers = [
            Worker::new(PlayerId::ZERO, WorkerIndex::FIRST),
            Worker::new(PlayerId::ONE, WorkerIndex::FIRST),
            Worker::new(PlayerId::ZERO, WorkerIndex::SECOND),
            Worker::new(PlayerId::ONE, WorkerIndex::SECOND),
        ];
        workers
            .into_iter()
            .zip(cells)
            .fold(SnapshotBuilder::new(), |builder, (worker, pos)| {
                builder.place(pos, worker)
            })
            .into_snapshot_unchecked()
    }

    /// Snapshot for a configured placement rule.
    #[must_use]
    pub fn from_placement(placement: Placement) -> Self {
        match placement {
            Placement::Standard => Self::standard(),
            Placement::Random { seed } => Self::random(seed),
        }
    }

    /// The starting game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }
}

/// Board editor for custom starting positions.
///
/// ```
/// use santorini_sync::core::{PlayerId, Position, SnapshotBuilder, Worker, WorkerIndex};
///
/// let at = |r, c| Position::new(r, c).unwrap();
/// let snapshot = SnapshotBuilder::new()
///     .place(at(0, 0), Worker::new(PlayerId::ZERO, WorkerIndex::FIRST))
///     .place(at(0, 4), Worker::new(PlayerId::ZERO, WorkerIndex::SECOND))
///     .place(at(4, 0), Worker::new(PlayerId::ONE, WorkerIndex::FIRST))
///     .place(at(4, 4), Worker::new(PlayerId::ONE, WorkerIndex::SECOND))
///     .level(at(1, 0), 3)
///     .build()
///     .unwrap();
/// assert_eq!(snapshot.state().board.level(at(1, 0)), 3);
/// ```
#[derive(Clone, Debug)]
pub struct SnapshotBuilder {
    board: Board,
    to_move: PlayerId,
    duplicate: Option<Worker>,
    bad_level: Option<(Position, u8)>,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self {
            board: Board::empty(),
            to_move: PlayerId::ZERO,
            duplicate: None,
            bad_level: None,
        }
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing from an existing state's board and turn.
    pub fn from_state(state: &GameState) -> Self {
        Self {
            board: state.board.clone(),
            to_move: state.to_move,
            ..Self::default()
        }
    }

    /// Set the level of a cell.
    pub fn level(mut self, pos: Position, level: u8) -> Self {
        if level > DOME_LEVEL {
            self.bad_level.get_or_insert((pos, level));
        } else {
            self.board.cell_mut(pos).level = level;
        }
        self
    }

    /// Put a worker on a cell, replacing any previous occupant of that cell.
    pub fn place(mut self, pos: Position, worker: Worker) -> Self {
        if let Some(existing) = self.board.worker_position(worker) {
            if existing != pos {
                self.duplicate.get_or_insert(worker);
            }
        }
        self.board.cell_mut(pos).occupant = Some(worker);
        self
    }

    /// Remove whatever worker stands on a cell.
    pub fn clear(mut self, pos: Position) -> Self {
        self.board.cell_mut(pos).occupant = None;
        self
    }

    /// Choose the player who moves first.
    pub fn to_move(mut self, player: PlayerId) -> Self {
        self.to_move = player;
        self
    }

    /// Validate and produce the snapshot.
    pub fn build(self) -> Result<InitialSnapshot, SnapshotError> {
        if let Some(worker) = self.duplicate {
            return Err(SnapshotError::DuplicateWorker { worker });
        }
        if let Some((position, level)) = self.bad_level {
            return Err(SnapshotError::LevelOutOfRange { position, level });
        }
        for player in PlayerId::all() {
            let found = self.board.worker_count(player);
            if found != WorkerIndex::COUNT {
                return Err(SnapshotError::WorkerCount { player, found });
            }
        }
        if let Some((position, _)) = self
            .board
            .cells()
            .find(|(_, cell)| cell.occupant.is_some() && cell.is_domed())
        {
            return Err(SnapshotError::WorkerOnDome { position });
        }
        Ok(self.into_snapshot_unchecked())
    }

    fn into_snapshot_unchecked(self) -> InitialSnapshot {
        InitialSnapshot {
            version: WIRE_VERSION,
            state: GameState::new(self.board, self.to_move),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(row: u8, col: u8) -> Position {
        Position::new(row, col).unwrap()
    }

    #[test]
    fn test_standard_placement() {
        let snapshot = InitialSnapshot::standard();
        let board = &snapshot.state().board;

        assert_eq!(snapshot.version, WIRE_VERSION);
        assert_eq!(snapshot.state().to_move, PlayerId::ZERO);
        assert_eq!(
            board.worker_positions(PlayerId::ZERO),
            [Some(at(2, 1)), Some(at(2, 3))]
        );
        assert_eq!(
            board.worker_positions(PlayerId::ONE),
            [Some(at(1, 2)), Some(at(3, 2))]
        );
        assert!(board.cells().all(|(_, c)| c.level == 0));
    }

    #[test]
    fn test_random_placement_is_seeded() {
        let a = InitialSnapshot::random(11);
        let b = InitialSnapshot::random(11);
        assert_eq!(a, b);

        for player in PlayerId::all() {
            assert_eq!(a.state().board.worker_count(player), 2);
        }
    }

    #[test]
    fn test_builder_rejects_missing_worker() {
        let result = SnapshotBuilder::new()
            .place(at(0, 0), Worker::new(PlayerId::ZERO, WorkerIndex::FIRST))
            .build();

        assert_eq!(
            result,
            Err(SnapshotError::WorkerCount {
                player: PlayerId::ZERO,
                found: 1
            })
        );
    }

    #[test]
    fn test_builder_rejects_duplicate_worker() {
        let worker = Worker::new(PlayerId::ONE, WorkerIndex::FIRST);
        let result = SnapshotBuilder::from_state(InitialSnapshot::standard().state())
            .place(at(0, 0), worker)
            .build();

        assert_eq!(result, Err(SnapshotError::DuplicateWorker { worker }));
    }

    #[test]
    fn test_builder_rejects_level_out_of_range() {
        let result = SnapshotBuilder::from_state(InitialSnapshot::standard().state())
            .level(at(0, 0), 5)
            .build();

        assert_eq!(
            result,
            Err(SnapshotError::LevelOutOfRange {
                position: at(0, 0),
                level: 5
            })
        );
    }

    #[test]
    fn test_builder_rejects_worker_on_dome() {
        let result = SnapshotBuilder::from_state(InitialSnapshot::standard().state())
            .level(at(2, 1), 4)
            .build();

        assert_eq!(result, Err(SnapshotError::WorkerOnDome { position: at(2, 1) }));
    }
}
