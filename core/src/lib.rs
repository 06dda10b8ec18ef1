#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Delve sandbox.
//!
//! This crate defines the vocabulary every other crate speaks: terrain
//! [`Cell`] materials, grid [`Position`]s, creature identifiers, and the
//! closed [`Move`] surface a bot may return. The world crate owns the grid
//! built from these cells, and the controller validates every move through
//! [`Move::validate`] before letting it touch live state.

mod moves;

use serde::{Deserialize, Serialize};

pub use moves::{
    bite_by_creature, bite_by_pos, climb_down, climb_up, dig, drop_rock, eat, left, pick_up_rock,
    right, BiteTarget, BotError, Move, MoveError, MoveKind, MoveRecord, MoveRequest, RawPosition,
    MAX_SAFE_COORDINATE,
};

/// Highest fall-momentum stage a rock can reach.
pub const ROCK_MAX_STAGE: u8 = 8;

/// Opaque key/value store owned by a single creature's bot.
///
/// The engine creates it empty at spawn and only ever hands it to the bot
/// driving that creature.
pub type Scratch = serde_json::Map<String, serde_json::Value>;

/// Terrain material occupying a single grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Open air.
    Empty,
    /// A sparse patch of grass standing on top of the ground.
    SmallGrassTufts,
    /// A dense patch of grass standing on top of the ground.
    LargeGrassTufts,
    /// Dirt covered with grass.
    GrassyDirt,
    /// Dirt stripped of anything edible.
    BarrenDirt,
    /// Plain dirt.
    Dirt,
    /// A loose rock; `stage` encodes consecutive ticks spent falling.
    Rock {
        /// Momentum stage, zero while at rest, saturating at [`ROCK_MAX_STAGE`].
        stage: u8,
    },
    /// Intact stone. Takes two digs to clear.
    Stone,
    /// Stone overgrown with moss.
    MossyStone,
    /// Stone that has been dug once.
    ChippedStone,
    /// Chipped stone overgrown with moss.
    MossyChippedStone,
    /// Indestructible floor material.
    Bedrock,
    /// Bedrock overgrown with moss.
    MossyBedrock,
}

impl Cell {
    /// A rock at rest.
    pub const RESTING_ROCK: Cell = Cell::Rock { stage: 0 };

    /// Reports whether the material blocks movement and falling.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(
            self,
            Cell::Empty | Cell::SmallGrassTufts | Cell::LargeGrassTufts
        )
    }

    /// Reports whether the material belongs to the rock family.
    #[must_use]
    pub const fn is_rock(self) -> bool {
        matches!(self, Cell::Rock { .. })
    }

    /// Reports whether the material is a rock carrying fall momentum.
    #[must_use]
    pub const fn is_falling_rock(self) -> bool {
        matches!(self, Cell::Rock { stage } if stage > 0)
    }

    /// Reports whether the material is one of the grass tuft sizes.
    #[must_use]
    pub const fn is_grass_tufts(self) -> bool {
        matches!(self, Cell::SmallGrassTufts | Cell::LargeGrassTufts)
    }

    /// Material left behind after a single successful dig, if diggable.
    #[must_use]
    pub const fn dug(self) -> Option<Cell> {
        match self {
            Cell::GrassyDirt
            | Cell::BarrenDirt
            | Cell::Dirt
            | Cell::ChippedStone
            | Cell::MossyChippedStone => Some(Cell::Empty),
            Cell::Stone => Some(Cell::ChippedStone),
            Cell::MossyStone => Some(Cell::MossyChippedStone),
            _ => None,
        }
    }

    /// Food category of the material together with what remains once eaten.
    #[must_use]
    pub const fn edible(self) -> Option<(Food, Cell)> {
        match self {
            Cell::SmallGrassTufts => Some((Food::SmallGrassTufts, Cell::Empty)),
            Cell::LargeGrassTufts => Some((Food::LargeGrassTufts, Cell::SmallGrassTufts)),
            Cell::GrassyDirt => Some((Food::GrassyDirt, Cell::BarrenDirt)),
            Cell::MossyStone => Some((Food::Moss, Cell::Stone)),
            Cell::MossyChippedStone => Some((Food::Moss, Cell::ChippedStone)),
            Cell::MossyBedrock => Some((Food::Moss, Cell::Bedrock)),
            _ => None,
        }
    }

    /// Moss-covered counterpart of a bare stone material.
    #[must_use]
    pub const fn mossy(self) -> Option<Cell> {
        match self {
            Cell::Stone => Some(Cell::MossyStone),
            Cell::ChippedStone => Some(Cell::MossyChippedStone),
            Cell::Bedrock => Some(Cell::MossyBedrock),
            _ => None,
        }
    }
}

/// Categories of edible material, each with its own nourishment values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Food {
    /// Small grass tufts.
    SmallGrassTufts,
    /// Large grass tufts.
    LargeGrassTufts,
    /// The grass layer of grassy dirt.
    GrassyDirt,
    /// Moss growing on any stone or bedrock material.
    Moss,
}

/// Render-only material drawn behind the terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BgCell {
    /// Open sky.
    Sky,
    /// Dirt backdrop.
    Dirt,
    /// Stone backdrop.
    Stone,
    /// Bedrock backdrop.
    Bedrock,
}

/// Unique identifier assigned to a creature once, at spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(u32);

impl CreatureId {
    /// Creates a new creature identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell. `y` grows upward from the bedrock floor.
///
/// Positions are not normalised: `x` may lie outside `0..width` and is
/// wrapped by the world on every access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i64,
    y: i64,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> i64 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> i64 {
        self.y
    }

    /// Returns the position displaced by the provided offsets.
    #[must_use]
    pub const fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Position directly beneath this one.
    #[must_use]
    pub const fn below(self) -> Self {
        self.offset(0, -1)
    }

    /// Position directly above this one.
    #[must_use]
    pub const fn above(self) -> Self {
        self.offset(0, 1)
    }
}
