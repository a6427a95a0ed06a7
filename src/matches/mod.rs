//! Matches: the move log, clocks, undo negotiation and the state machine
//! that ties them together.
//!
//! ## Key Types
//!
//! - `MatchState`: authoritative match, mutated only by validated requests
//! - `MoveLog` / `MoveLogEntry`: the append-only, gapless log
//! - `Clocks`: time accounting against a single reference point
//! - `replay`: the derived current `GameState`

pub mod clock;
pub mod error;
pub mod events;
pub mod log;
pub mod machine;
pub mod replay;

pub use clock::{Clocks, Expired};
pub use error::{MatchError, Recovery};
pub use events::{JournalEntry, MatchEvent, UndoNegotiation, UndoStatus};
pub use log::{ClockSnapshot, MoveLog, MoveLogEntry};
pub use machine::{MatchId, MatchState, MatchStatus, SubmitOutcome};
pub use replay::{replay, replay_actions, ReplayError};
