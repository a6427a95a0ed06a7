//! Board symmetries.
//!
//! The eight rotations and reflections of the square map legal actions to
//! legal actions, so the advisory oracle can canonicalise positions and
//! augment training data. Each symmetry moves cells and relabels directions
//! consistently: for every position `p` and direction `d`,
//! `map(p.step(d)) == map(p).step(map(d))`.
//!
//! Worker relabelling is a separate symmetry ([`swap_workers`]): the two
//! workers of a player are interchangeable on the board, but not in the
//! action id.

use crate::core::Direction as D;
use crate::core::{Action, Board, Direction, GameState, PlayerId, Position, BOARD_SIZE};

const EDGE: u8 = BOARD_SIZE as u8 - 1;

/// A rotation or reflection of the 5x5 board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symmetry {
    Identity,
    /// Quarter turn clockwise.
    Rotate90,
    Rotate180,
    /// Quarter turn anticlockwise.
    Rotate270,
    /// Mirror across the vertical axis.
    FlipLeftRight,
    /// Mirror across the horizontal axis.
    FlipUpDown,
    /// Mirror across the main diagonal.
    Transpose,
    /// Mirror across the anti-diagonal.
    AntiTranspose,
}

impl Symmetry {
    pub const ALL: [Symmetry; 8] = [
        Symmetry::Identity,
        Symmetry::Rotate90,
        Symmetry::Rotate180,
        Symmetry::Rotate270,
        Symmetry::FlipLeftRight,
        Symmetry::FlipUpDown,
        Symmetry::Transpose,
        Symmetry::AntiTranspose,
    ];

    /// The symmetry that undoes this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Symmetry::Rotate90 => Symmetry::Rotate270,
            Symmetry::Rotate270 => Symmetry::Rotate90,
            other => other,
        }
    }

    #[must_use]
    pub const fn position(self, pos: Position) -> Position {
        let (r, c) = (pos.row, pos.col);
        let (row, col) = match self {
            Symmetry::Identity => (r, c),
            Symmetry::Rotate90 => (c, EDGE - r),
            Symmetry::Rotate180 => (EDGE - r, EDGE - c),
            Symmetry::Rotate270 => (EDGE - c, r),
            Symmetry::FlipLeftRight => (r, EDGE - c),
            Symmetry::FlipUpDown => (EDGE - r, c),
            Symmetry::Transpose => (c, r),
            Symmetry::AntiTranspose => (EDGE - c, EDGE - r),
        };
        Position { row, col }
    }

    /// Relabel a direction. The null direction is a fixed point.
    #[must_use]
    #[rustfmt::skip]
    pub const fn direction(self, direction: Direction) -> Direction {
        let table: [Direction; Direction::COUNT] = match self {
            Symmetry::Identity => [
                D::NORTH_WEST, D::NORTH, D::NORTH_EAST,
                D::WEST, D::NULL, D::EAST,
                D::SOUTH_WEST, D::SOUTH, D::SOUTH_EAST,
            ],
            Symmetry::Rotate90 => [
                D::NORTH_EAST, D::EAST, D::SOUTH_EAST,
                D::NORTH, D::NULL, D::SOUTH,
                D::NORTH_WEST, D::WEST, D::SOUTH_WEST,
            ],
            Symmetry::Rotate180 => [
                D::SOUTH_EAST, D::SOUTH, D::SOUTH_WEST,
                D::EAST, D::NULL, D::WEST,
                D::NORTH_EAST, D::NORTH, D::NORTH_WEST,
            ],
            Symmetry::Rotate270 => [
                D::SOUTH_WEST, D::WEST, D::NORTH_WEST,
                D::SOUTH, D::NULL, D::NORTH,
                D::SOUTH_EAST, D::EAST, D::NORTH_EAST,
            ],
            Symmetry::FlipLeftRight => [
                D::NORTH_EAST, D::NORTH, D::NORTH_WEST,
                D::EAST, D::NULL, D::WEST,
                D::SOUTH_EAST, D::SOUTH, D::SOUTH_WEST,
            ],
            Symmetry::FlipUpDown => [
                D::SOUTH_WEST, D::SOUTH, D::SOUTH_EAST,
                D::WEST, D::NULL, D::EAST,
                D::NORTH_WEST, D::NORTH, D::NORTH_EAST,
            ],
            Symmetry::Transpose => [
                D::NORTH_WEST, D::WEST, D::SOUTH_WEST,
                D::NORTH, D::NULL, D::SOUTH,
                D::NORTH_EAST, D::EAST, D::SOUTH_EAST,
            ],
            Symmetry::AntiTranspose => [
                D::SOUTH_EAST, D::EAST, D::NORTH_EAST,
                D::SOUTH, D::NULL, D::NORTH,
                D::SOUTH_WEST, D::WEST, D::NORTH_WEST,
            ],
        };
        table[direction.index() as usize]
    }

    #[must_use]
    pub fn action(self, action: Action) -> Action {
        Action::from_parts(
            action.worker(),
            self.direction(action.movement()),
            self.direction(action.build()),
        )
    }

    #[must_use]
    pub fn board(self, board: &Board) -> Board {
        let mut out = Board::empty();
        for (pos, cell) in board.cells() {
            *out.cell_mut(self.position(pos)) = *cell;
        }
        out
    }

    /// Transform a state. Turn, terminal and ply are unchanged.
    #[must_use]
    pub fn state(self, state: &GameState) -> GameState {
        GameState {
            board: self.board(&state.board),
            ..state.clone()
        }
    }
}

/// Swap the labels of `player`'s two workers.
#[must_use]
pub fn swap_workers(state: &GameState, player: PlayerId) -> GameState {
    let mut next = state.clone();
    for pos in Position::all() {
        let cell = next.board.cell_mut(pos);
        if let Some(worker) = cell.occupant.as_mut() {
            if worker.owner == player {
                worker.index = worker.index.other();
            }
        }
    }
    next
}

/// The action that corresponds to `action` after [`swap_workers`] was applied
/// for the player to move.
#[must_use]
pub fn swap_action_worker(action: Action) -> Action {
    action.with_worker(action.worker().other())
}
