//! The move codec: the canonical mapping between an [`Action`] and the
//! bounded integer that crosses every process boundary.
//!
//! Codec validation and rules validation are separate layers. The codec
//! decides whether an integer names a well-formed action at all; the rules
//! engine decides whether that action is legal. Every externally supplied
//! action goes through both.
//!
//! [`Action`]: crate::core::Action

pub mod symmetry;
pub mod wire;

pub use symmetry::{swap_action_worker, swap_workers, Symmetry};
pub use wire::{
    decode, decode_for, encode, is_winning_move, legal_mask, validate_against, ActionId,
    CodecError, ACTION_SPACE_SIZE,
};

pub use crate::core::WIRE_VERSION;
