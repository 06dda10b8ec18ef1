//! Contract between the controller and the decision functions driving creatures.

use delve_core::{BotError, CreatureId, Move, MoveRecord, Position, Scratch};
use delve_world::World;
use serde::Serialize;

/// Read-only description of a creature as seen by bots.
///
/// Views never expose the driving bot, and a peer's view never carries its
/// scratch store or move log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreatureView {
    /// Identifier of the creature.
    pub id: CreatureId,
    /// Current position.
    pub position: Position,
    /// Remaining hit points.
    pub hp: i32,
    /// Remaining fullness.
    pub fullness: i32,
    /// Whether the creature is in free fall.
    pub falling: bool,
    /// Cells fallen since the fall started.
    pub fall_dist: u32,
    /// Whether the creature carries a rock.
    pub carrying_rock: bool,
    /// Most recent decisions, oldest first. Only filled in on a creature's
    /// own view, and only while the move log is on.
    pub last_moves: Vec<MoveRecord>,
}

/// Everything a bot may consult while deciding one creature's move.
#[derive(Debug)]
pub struct Turn<'a> {
    /// The creature being decided for.
    pub me: &'a CreatureView,
    /// Private scratch store of that creature; persists across ticks.
    pub scratch: &'a mut Scratch,
    /// Every other live creature.
    pub others: &'a [CreatureView],
    /// Read-only view of the world.
    pub world: &'a World,
    /// Current tick.
    pub tick: u64,
}

/// Decision function driving one or more creatures.
///
/// The same bot value drives every copy of itself in a match; per-creature
/// memory belongs in [`Turn::scratch`].
pub trait Bot {
    /// Stable identifier used for logs and competition results.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str {
        self.id()
    }

    /// Chooses the next move, or `None` to idle.
    fn run(&self, turn: Turn<'_>) -> Result<Option<Move>, BotError>;
}
