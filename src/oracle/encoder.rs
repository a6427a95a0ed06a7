//! Board tensors for network input.
//!
//! The standard encoding is `[25, 3]`, one row per cell in row-major order
//! and three channels per cell:
//!
//! | channel | content |
//! |---|---|
//! | 0 | worker: `+1`/`+2` for the mover's first/second worker, `-1`/`-2` for the opponent's |
//! | 1 | building level, 0 to 4 |
//! | 2 | cell 0 carries the ply count (capped at 127), all other cells are 0 |
//!
//! The worker channel is always relative to the player to move, so a
//! network sees the same tensor for the same situation whichever seat is
//! on turn.

use crate::codec::ACTION_SPACE_SIZE;
use crate::core::{GameState, Position, BOARD_SIZE};

use super::network::EncodedState;

const CELLS: usize = BOARD_SIZE * BOARD_SIZE;
const CHANNELS: usize = 3;
const PLY_CAP: u32 = 127;

/// Converts a state into a network input tensor.
pub trait StateEncoder: Send + Sync {
    /// Encode `state` from the point of view of its player to move.
    fn encode(&self, state: &GameState) -> EncodedState;

    fn output_shape(&self) -> Vec<usize>;

    /// Length of the policy vector a network must produce.
    fn action_space_size(&self) -> usize {
        ACTION_SPACE_SIZE
    }
}

/// The `[25, 3]` cell-by-channel encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoardEncoder;

impl BoardEncoder {
    /// Flat tensor index of `channel` at `pos`.
    #[inline]
    #[must_use]
    pub const fn index(pos: Position, channel: usize) -> usize {
        pos.flat() * CHANNELS + channel
    }
}

impl StateEncoder for BoardEncoder {
    fn encode(&self, state: &GameState) -> EncodedState {
        let mut encoded = EncodedState::zeros(self.output_shape());

        for (pos, cell) in state.board.cells() {
            if let Some(worker) = cell.occupant {
                let magnitude = f32::from(worker.index.index() + 1);
                let sign = if worker.owner == state.to_move { 1.0 } else { -1.0 };
                encoded.set(Self::index(pos, 0), sign * magnitude);
            }
            encoded.set(Self::index(pos, 1), f32::from(cell.level));
        }

        if let Some(origin) = Position::new(0, 0) {
            encoded.set(Self::index(origin, 2), state.ply.min(PLY_CAP) as f32);
        }
        encoded
    }

    fn output_shape(&self) -> Vec<usize> {
        vec![CELLS, CHANNELS]
    }
}
