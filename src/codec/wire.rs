//! Action ids: the 0-161 integer exchanged between clients, the server and
//! the advisory oracle.
//!
//! `id = worker * 81 + move * 9 + build`, using the direction table in
//! [`crate::core::board`]. Changing either is a breaking protocol change and
//! must bump [`crate::core::WIRE_VERSION`].

use serde::{Deserialize, Serialize};

use crate::core::{Action, Direction, GameState, Worker, WorkerIndex, WINNING_LEVEL};

/// Number of distinct action ids.
pub const ACTION_SPACE_SIZE: usize = WorkerIndex::COUNT * Direction::COUNT * Direction::COUNT;

const WORKER_STRIDE: u8 = (Direction::COUNT * Direction::COUNT) as u8;
const MOVE_STRIDE: u8 = Direction::COUNT as u8;

/// Errors for externally supplied action ids. All of them mean the input
/// was malformed; none are worth retrying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("malformed action: id {0} is outside 0-161")]
    OutOfRange(u32),

    #[error("malformed action: id {0} uses the null move direction")]
    NullMove(u8),

    #[error("malformed action: id {0} skips its build on a move that does not win")]
    MissingBuild(ActionId),
}

/// A validated wire id in `[0, 161]`.
///
/// Every `ActionId` decodes to a structurally valid [`Action`]: the move
/// direction is never null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ActionId(u8);

impl ActionId {
    /// Raw integer value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Raw value as an index into a policy vector or mask.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The action this id names.
    #[must_use]
    pub fn action(self) -> Action {
        let worker = if self.0 >= WORKER_STRIDE {
            WorkerIndex::SECOND
        } else {
            WorkerIndex::FIRST
        };
        let rest = self.0 % WORKER_STRIDE;
        // `TryFrom` already excluded the null move.
        Action::from_parts(
            worker,
            TABLE[(rest / MOVE_STRIDE) as usize],
            TABLE[(rest % MOVE_STRIDE) as usize],
        )
    }
}

const TABLE: [Direction; Direction::COUNT] = [
    Direction::NORTH_WEST,
    Direction::NORTH,
    Direction::NORTH_EAST,
    Direction::WEST,
    Direction::NULL,
    Direction::EAST,
    Direction::SOUTH_WEST,
    Direction::SOUTH,
    Direction::SOUTH_EAST,
];

impl TryFrom<u32> for ActionId {
    type Error = CodecError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        let id = u8::try_from(raw)
            .ok()
            .filter(|&id| (id as usize) < ACTION_SPACE_SIZE)
            .ok_or(CodecError::OutOfRange(raw))?;
        if (id % WORKER_STRIDE) / MOVE_STRIDE == Direction::NULL.index() {
            return Err(CodecError::NullMove(id));
        }
        Ok(Self(id))
    }
}

impl From<ActionId> for u32 {
    fn from(id: ActionId) -> Self {
        u32::from(id.0)
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Encode an action. Always in `[0, 161]`.
#[must_use]
pub fn encode(action: Action) -> ActionId {
    ActionId(
        action.worker().index() * WORKER_STRIDE
            + action.movement().index() * MOVE_STRIDE
            + action.build().index(),
    )
}

/// Decode a raw wire integer.
///
/// Rejects values outside `[0, 161]` and the null move direction. A null
/// build is structurally fine here; whether it is allowed depends on the
/// state, see [`validate_against`].
pub fn decode(raw: u32) -> Result<Action, CodecError> {
    ActionId::try_from(raw).map(ActionId::action)
}

/// Does this action move a worker onto a level-3 cell in `state`?
#[must_use]
pub fn is_winning_move(state: &GameState, action: Action) -> bool {
    state
        .board
        .worker_position(Worker::new(state.to_move, action.worker()))
        .and_then(|from| from.step(action.movement()))
        .is_some_and(|to| state.board.level(to) == WINNING_LEVEL)
}

/// State-aware structural check: a skipped build is only well-formed on a
/// move that wins.
///
/// This is independent of the rules engine; both layers run on every
/// externally supplied action.
pub fn validate_against(state: &GameState, action: Action) -> Result<(), CodecError> {
    if action.skips_build() && !is_winning_move(state, action) {
        return Err(CodecError::MissingBuild(encode(action)));
    }
    Ok(())
}

/// Decode a raw wire integer and check it against `state`.
pub fn decode_for(state: &GameState, raw: u32) -> Result<Action, CodecError> {
    let action = decode(raw)?;
    validate_against(state, action)?;
    Ok(action)
}

/// Boolean mask over the action space, `true` at every legal id.
#[must_use]
pub fn legal_mask(state: &GameState) -> [bool; ACTION_SPACE_SIZE] {
    let mut mask = [false; ACTION_SPACE_SIZE];
    for action in crate::rules::legal_actions(state) {
        mask[encode(action).index()] = true;
    }
    mask
}

impl TryFrom<u8> for Action {
    type Error = CodecError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        decode(u32::from(raw))
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> Self {
        encode(action).raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InitialSnapshot, Position, SnapshotBuilder};

    #[test]
    fn test_action_space_size() {
        assert_eq!(ACTION_SPACE_SIZE, 162);
    }

    #[test]
    fn test_encode_formula() {
        let action = Action::new(WorkerIndex::SECOND, Direction::SOUTH, Direction::NORTH_WEST).unwrap();
        assert_eq!(encode(action).raw(), 81 + 7 * 9);

        let first = Action::new(WorkerIndex::FIRST, Direction::NORTH_WEST, Direction::NORTH_WEST).unwrap();
        assert_eq!(encode(first).raw(), 0);

        let last = Action::new(WorkerIndex::SECOND, Direction::SOUTH_EAST, Direction::SOUTH_EAST).unwrap();
        assert_eq!(encode(last).raw(), 161);
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        assert_eq!(decode(162), Err(CodecError::OutOfRange(162)));
        assert_eq!(decode(u32::MAX), Err(CodecError::OutOfRange(u32::MAX)));
    }

    #[test]
    fn test_decode_rejects_null_move() {
        // worker 0, move 4, build 0
        assert_eq!(decode(36), Err(CodecError::NullMove(36)));
        // worker 1, move 4, build 8
        assert_eq!(decode(81 + 36 + 8), Err(CodecError::NullMove(125)));
    }

    #[test]
    fn test_decode_accepts_null_build() {
        let action = decode(9 + 4).unwrap();
        assert_eq!(action.movement(), Direction::NORTH);
        assert!(action.skips_build());
    }

    #[test]
    fn test_validate_against_rejects_null_build_on_plain_move() {
        let state = InitialSnapshot::standard().state().clone();
        let action = Action::without_build(WorkerIndex::FIRST, Direction::NORTH).unwrap();

        assert_eq!(
            validate_against(&state, action),
            Err(CodecError::MissingBuild(encode(action)))
        );
        assert!(decode_for(&state, u32::from(encode(action).raw())).is_err());
    }

    #[test]
    fn test_validate_against_accepts_null_build_on_winning_move() {
        let at = |r, c| Position::new(r, c).unwrap();
        let snapshot = SnapshotBuilder::from_state(InitialSnapshot::standard().state())
            .level(at(2, 1), 2)
            .level(at(1, 1), 3)
            .build()
            .unwrap();
        let action = Action::without_build(WorkerIndex::FIRST, Direction::NORTH).unwrap();

        assert!(is_winning_move(snapshot.state(), action));
        assert_eq!(validate_against(snapshot.state(), action), Ok(()));
    }

    #[test]
    fn test_legal_mask_matches_legal_actions() {
        let state = InitialSnapshot::standard().state().clone();
        let mask = legal_mask(&state);
        let legal = crate::rules::legal_actions(&state);

        assert_eq!(mask.iter().filter(|&&m| m).count(), legal.len());
        for action in legal {
            assert!(mask[encode(action).index()]);
        }
    }

    #[test]
    fn test_action_id_serde_rejects_bad_ids() {
        assert!(serde_json::from_str::<ActionId>("161").is_ok());
        assert!(serde_json::from_str::<ActionId>("162").is_err());
        assert!(serde_json::from_str::<ActionId>("40").is_err());
    }
}
