//! The 5x5 Santorini board: positions, directions, workers and cells.
//!
//! ## Direction table
//!
//! Nine relative offsets indexed 0-8 in row-major order over
//! `dy ∈ {-1,0,1}, dx ∈ {-1,0,1}`. Index 4 is the zero offset (the null
//! direction). The table is part of the wire contract: reordering it changes
//! every encoded action.
//!
//! ## Levels
//!
//! A cell's level is 0-3 for ordinary towers and 4 for a dome. Domes are
//! impassable and can never be built on again.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 5;

/// Standing on this level wins the game.
pub const WINNING_LEVEL: u8 = 3;

/// Capped cell: impassable, no further building.
pub const DOME_LEVEL: u8 = 4;

/// Row-major (dy, dx) offsets for direction indices 0-8.
pub const DIRECTION_OFFSETS: [(i8, i8); 9] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const DIRECTION_ARROWS: [char; 9] = ['↖', '↑', '↗', '←', 'Ø', '→', '↙', '↓', '↘'];

/// A cell coordinate. Row 0 is the top ("north") edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    /// Create a position, returning `None` off the board.
    #[must_use]
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Position reached by stepping once in `direction`, if still on the board.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dy, dx) = direction.offset();
        let row = self.row as i8 + dy;
        let col = self.col as i8 + dx;
        if row < 0 || col < 0 {
            return None;
        }
        Self::new(row as u8, col as u8)
    }

    /// Flat index in row-major order (0-24).
    #[must_use]
    pub const fn flat(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    /// Inverse of [`Position::flat`].
    #[must_use]
    pub const fn from_flat(index: usize) -> Option<Self> {
        if index < BOARD_SIZE * BOARD_SIZE {
            Some(Self {
                row: (index / BOARD_SIZE) as u8,
                col: (index % BOARD_SIZE) as u8,
            })
        } else {
            None
        }
    }

    /// All 25 positions in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE * BOARD_SIZE).filter_map(Self::from_flat)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Index into [`DIRECTION_OFFSETS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Direction(u8);

impl Direction {
    pub const NORTH_WEST: Direction = Direction(0);
    pub const NORTH: Direction = Direction(1);
    pub const NORTH_EAST: Direction = Direction(2);
    pub const WEST: Direction = Direction(3);
    /// Zero offset. Never a move; marks a skipped build.
    pub const NULL: Direction = Direction(4);
    pub const EAST: Direction = Direction(5);
    pub const SOUTH_WEST: Direction = Direction(6);
    pub const SOUTH: Direction = Direction(7);
    pub const SOUTH_EAST: Direction = Direction(8);

    /// Number of entries in the direction table.
    pub const COUNT: usize = 9;

    /// Create a direction from its table index.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Direction with the given offset, if it is in the table.
    #[must_use]
    pub fn from_offset(dy: i8, dx: i8) -> Option<Self> {
        if !(-1..=1).contains(&dy) || !(-1..=1).contains(&dx) {
            return None;
        }
        Some(Self(((dy + 1) * 3 + (dx + 1)) as u8))
    }

    /// Table index of this direction.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// `(dy, dx)` offset.
    #[must_use]
    pub const fn offset(self) -> (i8, i8) {
        DIRECTION_OFFSETS[self.0 as usize]
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    /// All nine directions in table order (including the null direction).
    pub fn all() -> impl Iterator<Item = Direction> {
        (0..Self::COUNT as u8).map(Direction)
    }

    /// The eight non-null directions in table order.
    pub fn adjacent() -> impl Iterator<Item = Direction> {
        Self::all().filter(|d| !d.is_null())
    }

    /// Arrow glyph used in human-readable move descriptions.
    #[must_use]
    pub const fn arrow(self) -> char {
        DIRECTION_ARROWS[self.0 as usize]
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("direction index {value} outside 0-8"))
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction.0
    }
}

/// Which of a player's two workers (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WorkerIndex(u8);

impl WorkerIndex {
    pub const FIRST: WorkerIndex = WorkerIndex(0);
    pub const SECOND: WorkerIndex = WorkerIndex(1);

    /// Workers per player.
    pub const COUNT: usize = 2;

    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// The player's other worker.
    #[must_use]
    pub const fn other(self) -> Self {
        Self(1 - self.0)
    }

    pub fn all() -> impl Iterator<Item = WorkerIndex> {
        [Self::FIRST, Self::SECOND].into_iter()
    }
}

impl TryFrom<u8> for WorkerIndex {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("worker index {value} outside 0-1"))
    }
}

impl From<WorkerIndex> for u8 {
    fn from(worker: WorkerIndex) -> Self {
        worker.0
    }
}

/// A specific worker on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Worker {
    pub owner: PlayerId,
    pub index: WorkerIndex,
}

impl Worker {
    #[must_use]
    pub const fn new(owner: PlayerId, index: WorkerIndex) -> Self {
        Self { owner, index }
    }
}

/// One board square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// 0-3 tower height, 4 = dome.
    pub level: u8,
    pub occupant: Option<Worker>,
}

impl Cell {
    #[must_use]
    pub const fn is_domed(&self) -> bool {
        self.level >= DOME_LEVEL
    }

    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

/// The 5x5 grid of cells.
///
/// Boards are plain values. The rules engine copies a board, edits the copy
/// and wraps it in a new `GameState`, so no mutation is ever observable
/// across transitions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An empty level-0 board with no workers.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cell(&self, pos: Position) -> &Cell {
        &self.cells[pos.row as usize][pos.col as usize]
    }

    pub(crate) fn cell_mut(&mut self, pos: Position) -> &mut Cell {
        &mut self.cells[pos.row as usize][pos.col as usize]
    }

    #[must_use]
    pub fn level(&self, pos: Position) -> u8 {
        self.cell(pos).level
    }

    #[must_use]
    pub fn occupant(&self, pos: Position) -> Option<Worker> {
        self.cell(pos).occupant
    }

    /// Where `worker` stands, if it is on the board.
    #[must_use]
    pub fn worker_position(&self, worker: Worker) -> Option<Position> {
        Position::all().find(|&pos| self.occupant(pos) == Some(worker))
    }

    /// Positions of both of a player's workers, in worker-index order.
    #[must_use]
    pub fn worker_positions(&self, player: PlayerId) -> [Option<Position>; WorkerIndex::COUNT] {
        let mut out = [None; WorkerIndex::COUNT];
        for pos in Position::all() {
            if let Some(worker) = self.occupant(pos) {
                if worker.owner == player {
                    out[worker.index.index() as usize] = Some(pos);
                }
            }
        }
        out
    }

    /// Number of workers a player has on the board.
    #[must_use]
    pub fn worker_count(&self, player: PlayerId) -> usize {
        Position::all()
            .filter(|&pos| self.occupant(pos).is_some_and(|w| w.owner == player))
            .count()
    }

    /// Highest level any of the player's workers stands on.
    #[must_use]
    pub fn highest_level(&self, player: PlayerId) -> u8 {
        self.worker_positions(player)
            .iter()
            .flatten()
            .map(|&pos| self.level(pos))
            .max()
            .unwrap_or(0)
    }

    /// Iterate over `(position, cell)` pairs in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Position, &Cell)> {
        Position::all().map(move |pos| (pos, self.cell(pos)))
    }
}

const LEVEL_GLYPHS: [char; 5] = ['·', '▂', '▅', '█', 'X'];

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "-".repeat(BOARD_SIZE * 3 + 1);
        writeln!(f, "{rule}")?;
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let cell = &self.cells[row][col];
                let glyph = LEVEL_GLYPHS[cell.level.min(DOME_LEVEL) as usize];
                match cell.occupant {
                    Some(w) => {
                        let tag = if w.owner == PlayerId::ZERO { 'a' } else { 'x' };
                        write!(f, "|{}{}", (tag as u8 + w.index.index()) as char, glyph)?
                    }
                    None => write!(f, "| {glyph}")?,
                }
            }
            writeln!(f, "|")?;
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
