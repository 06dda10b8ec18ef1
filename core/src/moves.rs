use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CreatureId, Position};

/// Largest coordinate magnitude a move may carry (2^53 - 1).
pub const MAX_SAFE_COORDINATE: i64 = 9_007_199_254_740_991;

/// Closed set of actions a bot may request for its creature in one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Step one column to the left, climbing or descending a single ledge.
    Left,
    /// Step one column to the right, climbing or descending a single ledge.
    Right,
    /// Climb one cell up a shaft braced on both sides.
    ClimbUp,
    /// Climb one cell down a shaft braced on both sides.
    ClimbDown,
    /// Dig the material at the target position.
    Dig(Position),
    /// Pick up the resting rock at the target position.
    PickUp(Position),
    /// Drop the carried rock into the target position.
    Drop(Position),
    /// Eat the material at the target position.
    Eat(Position),
    /// Bite another creature.
    Bite(BiteTarget),
}

/// Selects the victim of a bite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiteTarget {
    /// A specific living creature, wherever it stands.
    Creature(CreatureId),
    /// A random creature, other than the biter, occupying the position.
    Position(Position),
}

/// Discriminant of a [`Move`], used for diagnostics and the wire form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// See [`Move::Left`].
    Left,
    /// See [`Move::Right`].
    Right,
    /// See [`Move::ClimbUp`].
    ClimbUp,
    /// See [`Move::ClimbDown`].
    ClimbDown,
    /// See [`Move::Dig`].
    Dig,
    /// See [`Move::PickUp`].
    PickUp,
    /// See [`Move::Drop`].
    Drop,
    /// See [`Move::Eat`].
    Eat,
    /// See [`Move::Bite`].
    Bite,
}

impl MoveKind {
    const ALL: [MoveKind; 9] = [
        MoveKind::Left,
        MoveKind::Right,
        MoveKind::ClimbUp,
        MoveKind::ClimbDown,
        MoveKind::Dig,
        MoveKind::PickUp,
        MoveKind::Drop,
        MoveKind::Eat,
        MoveKind::Bite,
    ];

    /// Name used for the `type` tag of the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MoveKind::Left => "left",
            MoveKind::Right => "right",
            MoveKind::ClimbUp => "climb_up",
            MoveKind::ClimbDown => "climb_down",
            MoveKind::Dig => "dig",
            MoveKind::PickUp => "pick_up",
            MoveKind::Drop => "drop",
            MoveKind::Eat => "eat",
            MoveKind::Bite => "bite",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Move {
    /// Discriminant of the move.
    #[must_use]
    pub const fn kind(&self) -> MoveKind {
        match self {
            Move::Left => MoveKind::Left,
            Move::Right => MoveKind::Right,
            Move::ClimbUp => MoveKind::ClimbUp,
            Move::ClimbDown => MoveKind::ClimbDown,
            Move::Dig(_) => MoveKind::Dig,
            Move::PickUp(_) => MoveKind::PickUp,
            Move::Drop(_) => MoveKind::Drop,
            Move::Eat(_) => MoveKind::Eat,
            Move::Bite(_) => MoveKind::Bite,
        }
    }

    /// Position the move interacts with, if it targets one.
    #[must_use]
    pub const fn target(&self) -> Option<Position> {
        match self {
            Move::Dig(pos)
            | Move::PickUp(pos)
            | Move::Drop(pos)
            | Move::Eat(pos)
            | Move::Bite(BiteTarget::Position(pos)) => Some(*pos),
            Move::Left
            | Move::Right
            | Move::ClimbUp
            | Move::ClimbDown
            | Move::Bite(BiteTarget::Creature(_)) => None,
        }
    }

    /// Checks that every coordinate carried by the move is range-safe.
    pub fn validate(&self) -> Result<(), MoveError> {
        match self {
            Move::Left | Move::Right | Move::ClimbUp | Move::ClimbDown => Ok(()),
            Move::Bite(BiteTarget::Creature(_)) => Ok(()),
            Move::Dig(pos)
            | Move::PickUp(pos)
            | Move::Drop(pos)
            | Move::Eat(pos)
            | Move::Bite(BiteTarget::Position(pos)) => {
                check_coordinate(self.kind(), "x", pos.x())?;
                check_coordinate(self.kind(), "y", pos.y())
            }
        }
    }
}

fn check_coordinate(kind: MoveKind, axis: &'static str, value: i64) -> Result<(), MoveError> {
    if value.unsigned_abs() > MAX_SAFE_COORDINATE.unsigned_abs() {
        return Err(MoveError::CoordinateOutOfRange {
            kind,
            axis,
            value: value as f64,
        });
    }
    Ok(())
}

/// Returns a move stepping left.
#[must_use]
pub const fn left() -> Move {
    Move::Left
}

/// Returns a move stepping right.
#[must_use]
pub const fn right() -> Move {
    Move::Right
}

/// Returns a move climbing up.
#[must_use]
pub const fn climb_up() -> Move {
    Move::ClimbUp
}

/// Returns a move climbing down.
#[must_use]
pub const fn climb_down() -> Move {
    Move::ClimbDown
}

/// Returns a move digging at `(x, y)`.
#[must_use]
pub const fn dig(x: i64, y: i64) -> Move {
    Move::Dig(Position::new(x, y))
}

/// Returns a move picking up the rock at `(x, y)`.
#[must_use]
pub const fn pick_up_rock(x: i64, y: i64) -> Move {
    Move::PickUp(Position::new(x, y))
}

/// Returns a move dropping the carried rock at `(x, y)`.
#[must_use]
pub const fn drop_rock(x: i64, y: i64) -> Move {
    Move::Drop(Position::new(x, y))
}

/// Returns a move eating the material at `(x, y)`.
#[must_use]
pub const fn eat(x: i64, y: i64) -> Move {
    Move::Eat(Position::new(x, y))
}

/// Returns a move biting a random creature standing at `(x, y)`.
#[must_use]
pub const fn bite_by_pos(x: i64, y: i64) -> Move {
    Move::Bite(BiteTarget::Position(Position::new(x, y)))
}

/// Returns a move biting the creature with the provided identifier.
#[must_use]
pub const fn bite_by_creature(id: CreatureId) -> Move {
    Move::Bite(BiteTarget::Creature(id))
}

/// Loosely typed wire form of a move, as produced by scripted bots or a
/// human operator. Convert with [`Move::try_from`] before use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Move kind tag, e.g. `"dig"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Target position for positional moves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<RawPosition>,
    /// Victim identifier for bites by creature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victim: Option<f64>,
}

/// Unvalidated coordinates of a [`MoveRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl TryFrom<MoveRequest> for Move {
    type Error = MoveError;

    fn try_from(request: MoveRequest) -> Result<Self, Self::Error> {
        let kind = MoveKind::parse(&request.kind).ok_or(MoveError::UnknownKind(request.kind))?;
        let target = |pos: Option<RawPosition>| -> Result<Position, MoveError> {
            let pos = pos.ok_or(MoveError::MissingPosition { kind })?;
            Ok(Position::new(
                raw_coordinate(kind, "x", pos.x)?,
                raw_coordinate(kind, "y", pos.y)?,
            ))
        };

        let parsed = match kind {
            MoveKind::Left => Move::Left,
            MoveKind::Right => Move::Right,
            MoveKind::ClimbUp => Move::ClimbUp,
            MoveKind::ClimbDown => Move::ClimbDown,
            MoveKind::Dig => Move::Dig(target(request.pos)?),
            MoveKind::PickUp => Move::PickUp(target(request.pos)?),
            MoveKind::Drop => Move::Drop(target(request.pos)?),
            MoveKind::Eat => Move::Eat(target(request.pos)?),
            MoveKind::Bite => match (request.pos, request.victim) {
                (Some(_), Some(_)) => return Err(MoveError::AmbiguousBite),
                (None, None) => return Err(MoveError::MissingBiteTarget),
                (Some(pos), None) => Move::Bite(BiteTarget::Position(target(Some(pos))?)),
                (None, Some(victim)) => Move::Bite(BiteTarget::Creature(raw_victim(victim)?)),
            },
        };
        Ok(parsed)
    }
}

impl From<Move> for MoveRequest {
    fn from(value: Move) -> Self {
        let (pos, victim) = match value {
            Move::Bite(BiteTarget::Creature(id)) => (None, Some(f64::from(id.get()))),
            other => (
                other.target().map(|pos| RawPosition {
                    x: pos.x() as f64,
                    y: pos.y() as f64,
                }),
                None,
            ),
        };
        Self {
            kind: value.kind().as_str().to_owned(),
            pos,
            victim,
        }
    }
}

fn raw_coordinate(kind: MoveKind, axis: &'static str, value: f64) -> Result<i64, MoveError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(MoveError::NonIntegerCoordinate { kind, axis, value });
    }
    if value.abs() > MAX_SAFE_COORDINATE as f64 {
        return Err(MoveError::CoordinateOutOfRange { kind, axis, value });
    }
    Ok(value as i64)
}

fn raw_victim(value: f64) -> Result<CreatureId, MoveError> {
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(MoveError::InvalidVictim { value });
    }
    Ok(CreatureId::new(value as u32))
}

/// Reasons a bot's move is rejected before execution.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum MoveError {
    /// The `type` tag names none of the nine move kinds.
    #[error("invalid move: unknown type `{0}`")]
    UnknownKind(String),
    /// A positional move arrived without a position.
    #[error("invalid move: missing `pos` for {kind}")]
    MissingPosition {
        /// Kind of the offending move.
        kind: MoveKind,
    },
    /// A coordinate was fractional, infinite, or NaN.
    #[error("invalid move: `pos.{axis}` is not an integer ({value}) for {kind}")]
    NonIntegerCoordinate {
        /// Kind of the offending move.
        kind: MoveKind,
        /// Offending axis.
        axis: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A coordinate exceeded [`MAX_SAFE_COORDINATE`] in magnitude.
    #[error("invalid move: `pos.{axis}` is not a safe integer ({value}) for {kind}")]
    CoordinateOutOfRange {
        /// Kind of the offending move.
        kind: MoveKind,
        /// Offending axis.
        axis: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A bite carried both a victim and a position.
    #[error("invalid move: bite carries both `pos` and `victim`")]
    AmbiguousBite,
    /// A bite carried neither a victim nor a position.
    #[error("invalid move: missing `pos` or `victim` for bite")]
    MissingBiteTarget,
    /// The victim identifier was not a non-negative integer id.
    #[error("invalid move: `victim` is not a creature id ({value})")]
    InvalidVictim {
        /// Offending value.
        value: f64,
    },
}

/// Failures surfaced by a bot's decision call.
#[derive(Debug, Error)]
pub enum BotError {
    /// The bot reported that it could not decide.
    #[error("bot failed: {0}")]
    Failed(String),
    /// The bot panicked while deciding.
    #[error("bot panicked: {0}")]
    Panicked(String),
    /// The bot produced a malformed move.
    #[error(transparent)]
    InvalidMove(#[from] MoveError),
}

/// One entry of a creature's move log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Tick at which the decision was made.
    pub tick: u64,
    /// Position of the creature when it decided.
    pub position: Position,
    /// Move that was accepted, `None` when idle or rejected.
    pub action: Option<Move>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> Result<Move, MoveError> {
        let request: MoveRequest = serde_json::from_str(json).expect("well-formed json");
        Move::try_from(request)
    }

    #[test]
    fn parses_every_kind_from_wire_form() {
        assert_eq!(request(r#"{"type":"left"}"#), Ok(Move::Left));
        assert_eq!(request(r#"{"type":"climb_down"}"#), Ok(Move::ClimbDown));
        assert_eq!(
            request(r#"{"type":"pick_up","pos":{"x":-3,"y":12}}"#),
            Ok(pick_up_rock(-3, 12))
        );
        assert_eq!(
            request(r#"{"type":"bite","victim":7}"#),
            Ok(bite_by_creature(CreatureId::new(7)))
        );
        assert_eq!(
            request(r#"{"type":"bite","pos":{"x":1,"y":2}}"#),
            Ok(bite_by_pos(1, 2))
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        assert_eq!(
            request(r#"{"type":"teleport"}"#),
            Err(MoveError::UnknownKind("teleport".to_owned()))
        );
    }

    #[test]
    fn rejects_positional_move_without_pos() {
        assert_eq!(
            request(r#"{"type":"eat"}"#),
            Err(MoveError::MissingPosition {
                kind: MoveKind::Eat
            })
        );
    }

    #[test]
    fn rejects_fractional_and_unsafe_coordinates() {
        assert!(matches!(
            request(r#"{"type":"dig","pos":{"x":1.5,"y":2}}"#),
            Err(MoveError::NonIntegerCoordinate { axis: "x", .. })
        ));
        assert!(matches!(
            request(r#"{"type":"dig","pos":{"x":1,"y":1e300}}"#),
            Err(MoveError::CoordinateOutOfRange { axis: "y", .. })
        ));
    }

    #[test]
    fn bite_needs_exactly_one_target() {
        assert_eq!(
            request(r#"{"type":"bite"}"#),
            Err(MoveError::MissingBiteTarget)
        );
        assert_eq!(
            request(r#"{"type":"bite","victim":1,"pos":{"x":0,"y":0}}"#),
            Err(MoveError::AmbiguousBite)
        );
        assert!(matches!(
            request(r#"{"type":"bite","victim":-1}"#),
            Err(MoveError::InvalidVictim { .. })
        ));
    }

    #[test]
    fn typed_moves_survive_the_wire_form() {
        for action in [right(), dig(4, -2), drop_rock(0, 9), eat(3, 3)] {
            assert_eq!(Move::try_from(MoveRequest::from(action)), Ok(action));
        }
    }

    #[test]
    fn validate_flags_out_of_range_positions() {
        assert_eq!(dig(MAX_SAFE_COORDINATE, 0).validate(), Ok(()));
        assert!(matches!(
            eat(0, i64::MIN).validate(),
            Err(MoveError::CoordinateOutOfRange { axis: "y", .. })
        ));
        assert_eq!(left().validate(), Ok(()));
    }
}
