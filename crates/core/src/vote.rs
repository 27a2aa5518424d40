//! Tri-state vote values and the toggle rule shared by the ledger and the
//! optimistic mirror.
//!
//! A voter's standing on a caption is one of three states. Submitting a
//! polarity moves between them:
//!
//! | current | submit `Up` | submit `Down` |
//! |---------|-------------|---------------|
//! | `None`  | `Up`        | `Down`        |
//! | `Up`    | `None`      | `Down`        |
//! | `Down`  | `Up`        | `None`        |
//!
//! Both sides must use [`VoteState::toggle`] so that the optimistic guess and
//! the persisted result agree.

use captionbattle_common::AppError;
use serde::{Deserialize, Serialize};

/// A submittable vote polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum VoteValue {
    /// +1
    Up,
    /// -1
    Down,
}

impl VoteValue {
    /// Stored representation.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// The other polarity.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(AppError::Validation(format!(
                "vote value must be 1 or -1, got {other}"
            ))),
        }
    }
}

impl From<VoteValue> for i16 {
    fn from(value: VoteValue) -> Self {
        value.as_i16()
    }
}

/// A voter's standing on one caption. `None` is the absence of a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum VoteState {
    /// No vote (0).
    #[default]
    None,
    /// Upvoted (+1).
    Up,
    /// Downvoted (-1).
    Down,
}

impl VoteState {
    /// Apply a submitted polarity: repeat removes, opposite switches, fresh inserts.
    #[must_use]
    pub const fn toggle(self, value: VoteValue) -> Self {
        match (self, value) {
            (Self::Up, VoteValue::Up) | (Self::Down, VoteValue::Down) => Self::None,
            (_, VoteValue::Up) => Self::Up,
            (_, VoteValue::Down) => Self::Down,
        }
    }

    /// Wire and display representation: 0, +1 or -1.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::None => 0,
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// The polarity held, if any.
    #[must_use]
    pub const fn value(self) -> Option<VoteValue> {
        match self {
            Self::None => None,
            Self::Up => Some(VoteValue::Up),
            Self::Down => Some(VoteValue::Down),
        }
    }

    /// Whether the voter has not voted.
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<VoteValue> for VoteState {
    fn from(value: VoteValue) -> Self {
        match value {
            VoteValue::Up => Self::Up,
            VoteValue::Down => Self::Down,
        }
    }
}

impl From<Option<VoteValue>> for VoteState {
    fn from(value: Option<VoteValue>) -> Self {
        value.map_or(Self::None, Self::from)
    }
}

impl TryFrom<i16> for VoteState {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        if value == 0 {
            Ok(Self::None)
        } else {
            VoteValue::try_from(value).map(Self::from)
        }
    }
}

impl From<VoteState> for i16 {
    fn from(state: VoteState) -> Self {
        state.as_i16()
    }
}

/// Up and down vote counts for one caption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateCount {
    /// Live +1 rows.
    pub up: u32,
    /// Live -1 rows.
    pub down: u32,
}

impl AggregateCount {
    /// Create a count pair.
    #[must_use]
    pub const fn new(up: u32, down: u32) -> Self {
        Self { up, down }
    }

    /// Net score: up minus down.
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.up as i64 - self.down as i64
    }

    /// Adjust for one voter moving from `from` to `to`.
    ///
    /// Leaving a polarity decrements its bucket; entering one increments it.
    #[must_use]
    pub const fn transition(self, from: VoteState, to: VoteState) -> Self {
        let mut next = self;
        match from {
            VoteState::Up => next.up = next.up.saturating_sub(1),
            VoteState::Down => next.down = next.down.saturating_sub(1),
            VoteState::None => {}
        }
        match to {
            VoteState::Up => next.up += 1,
            VoteState::Down => next.down += 1,
            VoteState::None => {}
        }
        next
    }

    /// Count a set of live vote states.
    pub fn tally<I>(states: I) -> Self
    where
        I: IntoIterator<Item = VoteState>,
    {
        states
            .into_iter()
            .fold(Self::default(), |acc, state| acc.transition(VoteState::None, state))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_table() {
        assert_eq!(VoteState::None.toggle(VoteValue::Up), VoteState::Up);
        assert_eq!(VoteState::None.toggle(VoteValue::Down), VoteState::Down);
        assert_eq!(VoteState::Up.toggle(VoteValue::Up), VoteState::None);
        assert_eq!(VoteState::Up.toggle(VoteValue::Down), VoteState::Down);
        assert_eq!(VoteState::Down.toggle(VoteValue::Up), VoteState::Up);
        assert_eq!(VoteState::Down.toggle(VoteValue::Down), VoteState::None);
    }

    #[test]
    fn test_vote_value_rejects_zero_and_out_of_range() {
        assert!(VoteValue::try_from(0).is_err());
        assert!(VoteValue::try_from(2).is_err());
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);
    }

    #[test]
    fn test_vote_state_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&VoteState::Down).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&VoteState::None).unwrap(), "0");
        let parsed: VoteState = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, VoteState::Up);
        assert!(serde_json::from_str::<VoteValue>("0").is_err());
    }

    #[test]
    fn test_transition_switch_moves_both_buckets() {
        let counts = AggregateCount::new(3, 1);
        let next = counts.transition(VoteState::Up, VoteState::Down);
        assert_eq!(next, AggregateCount::new(2, 2));
        assert_eq!(next.score(), 0);
    }

    #[test]
    fn test_transition_scenario_from_zero() {
        let mut vote = VoteState::None;
        let mut counts = AggregateCount::default();

        for (value, expected_vote, expected_counts) in [
            (VoteValue::Up, VoteState::Up, AggregateCount::new(1, 0)),
            (VoteValue::Up, VoteState::None, AggregateCount::new(0, 0)),
            (VoteValue::Down, VoteState::Down, AggregateCount::new(0, 1)),
        ] {
            let next = vote.toggle(value);
            counts = counts.transition(vote, next);
            vote = next;
            assert_eq!(vote, expected_vote);
            assert_eq!(counts, expected_counts);
        }
    }

    #[test]
    fn test_tally_matches_rows() {
        let counts = AggregateCount::tally([
            VoteState::Up,
            VoteState::Up,
            VoteState::Down,
            VoteState::None,
        ]);
        assert_eq!(counts, AggregateCount::new(2, 1));
        assert_eq!(counts.score(), 1);
    }
}
