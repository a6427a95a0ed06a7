//! # santorini-sync
//!
//! Authoritative Santorini rules with a move-log synchronization protocol
//! between a server and optimistic clients.
//!
//! ## Design Principles
//!
//! 1. **Replay is the truth**: a match is an initial snapshot plus an
//!    append-only move log. The current state is always derived by replaying
//!    the log through the pure rules engine; it is never stored.
//!
//! 2. **Compare-and-swap admission**: a submission names the log index it
//!    expects to occupy. The server appends only if that index is the log's
//!    length, so two racing moves can never both land.
//!
//! 3. **Stable wire ids**: an action travels as one integer in `[0, 161]`
//!    (`worker * 81 + move * 9 + build`), fixed by `WIRE_VERSION`.
//!
//! 4. **Full-replacement reconciliation**: a client predicts its own move,
//!    then adopts the server's log wholesale and checks the state digest.
//!
//! ## Modules
//!
//! - `core`: players, board, actions, state, snapshots, RNG, configuration
//! - `rules`: legal actions, transitions, terminal detection
//! - `codec`: wire ids, structural validation, legal masks, symmetries
//! - `matches`: the match state machine, move log, clocks, undo, replay
//! - `sync`: server validator, client predictor, store and transport seams
//! - `oracle`: read-only move advice (heuristic and network backed)
//! - `mcts`: tree search and the search-backed oracle

pub mod core;
pub mod rules;
pub mod codec;
pub mod matches;
pub mod sync;
pub mod oracle;
pub mod mcts;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::{
    Action, Board, ClockConfig, Direction, GameRng, GameState, InitialSnapshot, MatchConfig,
    Placement, PlayerId, PlayerMap, Position, SnapshotBuilder, Terminal, TerminalReason,
    WorkerIndex, WIRE_VERSION,
};

pub use crate::rules::{RulesEngine, RulesError, StandardRules};

pub use crate::codec::{decode, encode, ActionId, CodecError, Symmetry, ACTION_SPACE_SIZE};

pub use crate::matches::{
    MatchError, MatchId, MatchState, MatchStatus, MoveLog, MoveLogEntry, Recovery, SubmitOutcome,
    UndoNegotiation,
};

pub use crate::sync::{
    ClientPredictor, ClientRequest, InMemoryMatchStore, MatchStore, MatchUpdate, MatchView,
    ServerValidator, SyncError,
};

pub use crate::oracle::{Advice, AdvisoryOracle, HeuristicOracle, NetworkOracle};

pub use crate::mcts::{MCTSConfig, MCTSOracle, MCTSSearch};
