//! Game state: the board plus whose turn it is and whether the game is over.
//!
//! ## Immutability
//!
//! A `GameState` is a value. Every transition produced by the rules engine
//! returns a fresh state; the previous one is never touched. This is what
//! makes replay from a snapshot and client-side rollback safe.
//!
//! ## Digest
//!
//! `digest()` hashes the state's fields in a fixed order with SHA-256.
//! Client and server compare digests after each log entry to confirm they
//! agree bit-for-bit.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::board::{Board, Position};
use super::player::PlayerId;

/// Version of the action encoding and direction table this state was built for.
pub const WIRE_VERSION: u16 = 1;

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalReason {
    /// The mover stepped onto a level-3 cell.
    #[serde(rename = "reached-level-3")]
    ReachedLevelThree,
    /// The player to move has no legal action.
    #[serde(rename = "no-legal-actions")]
    NoLegalActions,
    /// A player resigned.
    #[serde(rename = "resignation")]
    Resignation,
    /// A player's clock ran out.
    #[serde(rename = "timeout")]
    Timeout,
}

impl TerminalReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TerminalReason::ReachedLevelThree => "reached-level-3",
            TerminalReason::NoLegalActions => "no-legal-actions",
            TerminalReason::Resignation => "resignation",
            TerminalReason::Timeout => "timeout",
        }
    }

    const fn tag(self) -> u8 {
        match self {
            TerminalReason::ReachedLevelThree => 1,
            TerminalReason::NoLegalActions => 2,
            TerminalReason::Resignation => 3,
            TerminalReason::Timeout => 4,
        }
    }
}

impl std::fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Terminal {
    /// `None` is reserved for drawn outcomes; standard rules never produce one.
    pub winner: Option<PlayerId>,
    pub reason: TerminalReason,
}

impl Terminal {
    #[must_use]
    pub const fn won_by(winner: PlayerId, reason: TerminalReason) -> Self {
        Self {
            winner: Some(winner),
            reason,
        }
    }

    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        self.winner == Some(player)
    }
}

/// SHA-256 digest of a `GameState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateDigest(pub [u8; 32]);

impl std::fmt::Display for StateDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Complete state of one Santorini game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    /// Wire version this state is interpreted under.
    pub version: u16,

    pub board: Board,

    /// Player whose action is expected next.
    pub to_move: PlayerId,

    /// Set once the game is over on the board.
    pub terminal: Option<Terminal>,

    /// Number of actions applied since the snapshot (saturating).
    pub ply: u32,
}

impl GameState {
    /// Wrap a board as a fresh, non-terminal state.
    #[must_use]
    pub fn new(board: Board, to_move: PlayerId) -> Self {
        Self {
            version: WIRE_VERSION,
            board,
            to_move,
            terminal: None,
            ply: 0,
        }
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.terminal.is_some()
    }

    /// Canonical bincode encoding, used for persistence.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode a state produced by [`GameState::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// Fixed-order SHA-256 over every field.
    #[must_use]
    pub fn digest(&self) -> StateDigest {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update([self.to_move.raw()]);
        hasher.update(self.ply.to_le_bytes());
        match self.terminal {
            None => hasher.update([0u8, 0, 0]),
            Some(t) => hasher.update([
                t.reason.tag(),
                t.winner.map_or(0xFF, PlayerId::raw),
                1,
            ]),
        }
        for pos in Position::all() {
            let cell = self.board.cell(pos);
            let occupant = cell
                .occupant
                .map_or(0xFF, |w| w.owner.raw() * 2 + w.index.index());
            hasher.update([cell.level, occupant]);
        }
        StateDigest(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::{Worker, WorkerIndex};

    fn sample_state() -> GameState {
        let mut board = Board::empty();
        board.cell_mut(Position::new(2, 2).unwrap()).occupant =
            Some(Worker::new(PlayerId::ONE, WorkerIndex::SECOND));
        board.cell_mut(Position::new(0, 4).unwrap()).level = 3;
        GameState::new(board, PlayerId::ZERO)
    }

    #[test]
    fn test_new_state() {
        let state = sample_state();
        assert_eq!(state.version, WIRE_VERSION);
        assert_eq!(state.ply, 0);
        assert!(!state.is_over());
    }

    #[test]
    fn test_digest_is_stable_and_sensitive() {
        let state = sample_state();
        assert_eq!(state.digest(), state.clone().digest());

        let mut moved = state.clone();
        moved.to_move = PlayerId::ONE;
        assert_ne!(state.digest(), moved.digest());

        let mut ended = state.clone();
        ended.terminal = Some(Terminal::won_by(PlayerId::ZERO, TerminalReason::Resignation));
        assert_ne!(state.digest(), ended.digest());
    }

    #[test]
    fn test_digest_display_is_hex() {
        let text = sample_state().digest().to_string();
        assert_eq!(text.len(), 64);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_bincode_round_trip() {
        let state = sample_state();
        let bytes = state.to_bytes().unwrap();
        assert_eq!(GameState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn test_terminal_reason_serialization() {
        let json = serde_json::to_string(&TerminalReason::ReachedLevelThree).unwrap();
        assert_eq!(json, "\"reached-level-3\"");
        assert_eq!(TerminalReason::NoLegalActions.to_string(), "no-legal-actions");
    }
}
