//! Core value types: players, board, actions, state, snapshots, RNG, configuration.
//!
//! Everything here is a plain value. Nothing in this module performs I/O,
//! reads the time, or draws randomness except through an explicitly seeded
//! `GameRng`.

pub mod player;
pub mod board;
pub mod action;
pub mod state;
pub mod snapshot;
pub mod rng;
pub mod config;

pub use player::{InvalidPlayer, PlayerId, PlayerMap, PLAYER_COUNT};
pub use board::{
    Board, Cell, Direction, Position, Worker, WorkerIndex, BOARD_SIZE, DIRECTION_OFFSETS,
    DOME_LEVEL, WINNING_LEVEL,
};
pub use action::Action;
pub use state::{GameState, StateDigest, Terminal, TerminalReason, WIRE_VERSION};
pub use snapshot::{InitialSnapshot, SnapshotBuilder, SnapshotError};
pub use rng::GameRng;
pub use config::{ClockConfig, MatchConfig, Placement};
