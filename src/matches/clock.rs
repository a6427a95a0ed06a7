//! Per-player clock accounting.
//!
//! Time is measured from a single reference point: the match start, the
//! last appended move, or the last accepted undo, whichever is latest. Only
//! the player to move is ever charged. Expiry is detected when the next
//! event arrives or on an explicit idle check; nothing here is scheduled.

use serde::{Deserialize, Serialize};

use super::log::ClockSnapshot;
use crate::core::{ClockConfig, PlayerId, PlayerMap};

/// The charged player ran out of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expired {
    pub player: PlayerId,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clocks {
    config: ClockConfig,
    remaining: PlayerMap<u64>,
    reference_ms: u64,
}

impl Clocks {
    #[must_use]
    pub fn new(config: ClockConfig, reference_ms: u64) -> Self {
        Self {
            config,
            remaining: PlayerMap::with_value(config.initial_ms),
            reference_ms,
        }
    }

    #[must_use]
    pub fn config(&self) -> ClockConfig {
        self.config
    }

    /// Remaining budget as of the reference point.
    #[must_use]
    pub fn remaining(&self, player: PlayerId) -> u64 {
        self.remaining[player]
    }

    #[must_use]
    pub fn reference_ms(&self) -> u64 {
        self.reference_ms
    }

    /// Time since the reference point. Clocks never run backwards.
    #[must_use]
    pub fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.reference_ms)
    }

    /// Remaining budget for `player` at `now_ms`, charging the running clock
    /// if `player` is the one to move.
    #[must_use]
    pub fn remaining_at(&self, player: PlayerId, to_move: PlayerId, now_ms: u64) -> u64 {
        if player == to_move {
            self.remaining[player].saturating_sub(self.elapsed(now_ms))
        } else {
            self.remaining[player]
        }
    }

    /// Would charging `player` at `now_ms` exceed their budget?
    pub fn check(&self, player: PlayerId, now_ms: u64) -> Result<u64, Expired> {
        let elapsed_ms = self.elapsed(now_ms);
        let remaining_ms = self.remaining[player];
        if elapsed_ms > remaining_ms {
            return Err(Expired {
                player,
                elapsed_ms,
                remaining_ms,
            });
        }
        Ok(elapsed_ms)
    }

    /// Charge `player` for a move made at `now_ms`: deduct the elapsed time,
    /// add the increment and move the reference point.
    pub fn charge(&mut self, player: PlayerId, now_ms: u64) -> Result<ClockSnapshot, Expired> {
        let elapsed = self.check(player, now_ms)?;
        let remaining = &mut self.remaining[player];
        *remaining = (*remaining - elapsed).saturating_add(self.config.increment_ms);
        self.reference_ms = now_ms.max(self.reference_ms);
        Ok(self.snapshot())
    }

    /// Deduct the time `player` has used since the reference point, without
    /// an increment, and move the reference point. Used when the log changes
    /// without a move of theirs, such as an accepted undo.
    pub fn consume(&mut self, player: PlayerId, now_ms: u64) -> Result<(), Expired> {
        let elapsed = self.check(player, now_ms)?;
        self.remaining[player] -= elapsed;
        self.reference_ms = now_ms.max(self.reference_ms);
        Ok(())
    }

    /// Move the reference point without charging anyone.
    pub fn restart(&mut self, now_ms: u64) {
        self.reference_ms = now_ms.max(self.reference_ms);
    }

    #[must_use]
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            remaining_ms: self.remaining,
        }
    }
}
