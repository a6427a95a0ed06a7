//! The append-only move log.
//!
//! Entries are indexed from 0 without gaps. The only mutation besides
//! appending is truncation after an accepted undo. Backed by `im::Vector` so
//! that views and client copies share structure with the authoritative log.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{Action, PlayerId, PlayerMap};

/// Both players' remaining time right after an entry was appended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub remaining_ms: PlayerMap<u64>,
}

impl ClockSnapshot {
    #[must_use]
    pub fn remaining(&self, player: PlayerId) -> u64 {
        self.remaining_ms[player]
    }
}

/// One validated move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveLogEntry {
    pub index: u32,
    pub acting_player: PlayerId,
    pub action: Action,
    pub clock_snapshot: ClockSnapshot,
    /// Server time the entry was appended, in milliseconds.
    pub server_timestamp: u64,
}

/// Index-ordered sequence of validated moves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLog {
    entries: Vector<MoveLogEntry>,
}

impl MoveLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap stored entries without checking them; [`super::replay`] does.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = MoveLogEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index the next appended entry will receive.
    #[must_use]
    pub fn next_index(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn get(&self, index: u32) -> Option<&MoveLogEntry> {
        self.entries.get(index as usize)
    }

    #[must_use]
    pub fn last(&self) -> Option<&MoveLogEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MoveLogEntry> + '_ {
        self.entries.iter()
    }

    /// Actions in log order.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.entries.iter().map(|entry| entry.action)
    }

    /// Entries at or after `from`.
    #[must_use]
    pub fn since(&self, from: u32) -> Vec<MoveLogEntry> {
        self.entries.iter().skip(from as usize).copied().collect()
    }

    /// Append a move at the next index and return the stored entry.
    pub fn append(
        &mut self,
        acting_player: PlayerId,
        action: Action,
        clock_snapshot: ClockSnapshot,
        server_timestamp: u64,
    ) -> MoveLogEntry {
        let entry = MoveLogEntry {
            index: self.next_index(),
            acting_player,
            action,
            clock_snapshot,
            server_timestamp,
        };
        self.entries.push_back(entry);
        entry
    }

    /// Append an entry received from elsewhere. Refused unless its index is
    /// the next one.
    pub fn push(&mut self, entry: MoveLogEntry) -> bool {
        if entry.index != self.next_index() {
            return false;
        }
        self.entries.push_back(entry);
        true
    }

    /// Discard every entry at or after `len`.
    pub fn truncate(&mut self, len: u32) {
        self.entries.truncate((len as usize).min(self.entries.len()));
    }
}

impl<'a> IntoIterator for &'a MoveLog {
    type Item = &'a MoveLogEntry;
    type IntoIter = im::vector::Iter<'a, MoveLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Direction, WorkerIndex};

    fn action() -> Action {
        Action::new(WorkerIndex::FIRST, Direction::NORTH, Direction::SOUTH).unwrap()
    }

    #[test]
    fn test_append_assigns_gapless_indices() {
        let mut log = MoveLog::new();
        let a = log.append(PlayerId::ZERO, action(), ClockSnapshot::default(), 10);
        let b = log.append(PlayerId::ONE, action(), ClockSnapshot::default(), 20);

        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.next_index(), 2);
        assert_eq!(log.last(), Some(&b));
    }

    #[test]
    fn test_truncate() {
        let mut log = MoveLog::new();
        for ts in 0..5 {
            log.append(PlayerId::ZERO, action(), ClockSnapshot::default(), ts);
        }

        log.truncate(2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.next_index(), 2);

        log.truncate(10);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_push_requires_next_index() {
        let mut source = MoveLog::new();
        let first = source.append(PlayerId::ZERO, action(), ClockSnapshot::default(), 0);
        let second = source.append(PlayerId::ONE, action(), ClockSnapshot::default(), 1);

        let mut copy = MoveLog::new();
        assert!(!copy.push(second));
        assert!(copy.push(first));
        assert!(copy.push(second));
        assert_eq!(copy, source);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut log = MoveLog::new();
        log.append(PlayerId::ZERO, action(), ClockSnapshot::default(), 0);

        let copy = log.clone();
        log.append(PlayerId::ONE, action(), ClockSnapshot::default(), 1);

        assert_eq!(copy.len(), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.since(1).len(), 1);
    }
}
