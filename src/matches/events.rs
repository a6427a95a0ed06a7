//! Undo negotiation state and the match event journal.

use serde::{Deserialize, Serialize};

use crate::core::{Action, PlayerId, Terminal};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoStatus {
    Pending,
    Accepted,
    Rejected,
    /// The player to move ran out of time before the answer arrived; the
    /// match ended on time and the log was kept.
    Lapsed,
}

/// A request to truncate the log back to `target_index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UndoNegotiation {
    pub requested_by: PlayerId,
    pub target_index: u32,
    pub status: UndoStatus,
}

/// Something that happened to a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    Joined { player: PlayerId },
    Started,
    MoveAppended {
        index: u32,
        player: PlayerId,
        action: Action,
    },
    UndoRequested { by: PlayerId, target_index: u32 },
    /// Accepted requests truncated the log to `target_index` entries.
    UndoResolved {
        negotiation: UndoNegotiation,
        responder: PlayerId,
    },
    /// A pending undo was superseded by a new move, or lapsed when the
    /// clock of the player to move ran out.
    UndoCancelled { negotiation: UndoNegotiation },
    Resigned { player: PlayerId },
    TimedOut { player: PlayerId },
    Completed { terminal: Terminal },
    Abandoned,
}

/// A journal line: an event and the server time it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub at_ms: u64,
    pub event: MatchEvent,
}
