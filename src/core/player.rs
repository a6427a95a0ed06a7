//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! Santorini is strictly a two-player game: `PlayerId(0)` moves first,
//! `PlayerId(1)` second. Construction outside that range is rejected.
//!
//! ## PlayerMap
//!
//! Fixed two-slot storage indexed by `PlayerId`, used for clocks, rewards
//! and anything else kept "per seat".

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of seats at a Santorini table.
pub const PLAYER_COUNT: usize = 2;

/// Player identifier (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerId(u8);

impl PlayerId {
    /// The player who moves first from the standard snapshot.
    pub const ZERO: PlayerId = PlayerId(0);
    /// The second player.
    pub const ONE: PlayerId = PlayerId(1);

    /// Create a player ID, returning `None` outside `0..2`.
    #[must_use]
    pub const fn new(id: u8) -> Option<Self> {
        if (id as usize) < PLAYER_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw id as transmitted on the wire.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// The opponent of this player.
    #[must_use]
    pub const fn other(self) -> Self {
        Self(1 - self.0)
    }

    /// Both players in seat order.
    ///
    /// ```
    /// use santorini_sync::core::PlayerId;
    ///
    /// let players: Vec<_> = PlayerId::all().collect();
    /// assert_eq!(players, vec![PlayerId::ZERO, PlayerId::ONE]);
    /// ```
    pub fn all() -> impl Iterator<Item = PlayerId> {
        [Self::ZERO, Self::ONE].into_iter()
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = InvalidPlayer;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidPlayer(value))
    }
}

impl From<PlayerId> for u8 {
    fn from(player: PlayerId) -> Self {
        player.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Raised when a raw id does not name one of the two seats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("player id {0} is not a seat (expected 0 or 1)")]
pub struct InvalidPlayer(pub u8);

/// Per-player data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use santorini_sync::core::{PlayerId, PlayerMap};
///
/// let mut clocks: PlayerMap<u64> = PlayerMap::with_value(60_000);
/// clocks[PlayerId::ONE] -= 1_500;
/// assert_eq!(clocks[PlayerId::ZERO], 60_000);
/// assert_eq!(clocks[PlayerId::ONE], 58_500);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: [T; PLAYER_COUNT],
}

impl<T> PlayerMap<T> {
    /// Create a map with values from a factory function.
    pub fn new(factory: impl Fn(PlayerId) -> T) -> Self {
        Self {
            data: [factory(PlayerId::ZERO), factory(PlayerId::ONE)],
        }
    }

    /// Create a map from explicit values in seat order.
    pub const fn from_array(data: [T; PLAYER_COUNT]) -> Self {
        Self { data }
    }

    /// Create a map with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            data: [value.clone(), value],
        }
    }

    /// Get a reference to a player's data.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    /// Get a mutable reference to a player's data.
    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        PlayerId::all().zip(self.data.iter())
    }

    /// Iterate over (PlayerId, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        PlayerId::all().zip(self.data.iter_mut())
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
