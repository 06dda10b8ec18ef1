//! Live creature state owned by the controller.

use std::{collections::VecDeque, fmt, rc::Rc, sync::mpsc::Receiver};

use delve_core::{CreatureId, Move, MoveRecord, Position, Scratch};
use serde::Serialize;

use crate::{bot::CreatureView, Bot};

/// Identifier reported for creatures driven by a human operator.
pub const HUMAN_BOT_ID: &str = "human";

/// What decides a creature's moves.
pub(crate) enum Driver {
    Bot(Rc<dyn Bot>),
    Human(HumanLink),
}

/// Receiving end of a human operator's move channel.
pub(crate) struct HumanLink {
    pub(crate) moves: Receiver<Option<Move>>,
    pub(crate) safe: bool,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Bot(bot) => f.debug_tuple("Bot").field(&bot.id()).finish(),
            Driver::Human(link) => f.debug_struct("Human").field("safe", &link.safe).finish(),
        }
    }
}

/// A creature living in the world.
#[derive(Debug)]
pub struct Creature {
    pub(crate) id: CreatureId,
    pub(crate) position: Position,
    pub(crate) hp: i32,
    pub(crate) fullness: i32,
    pub(crate) falling: bool,
    pub(crate) fall_dist: u32,
    pub(crate) carrying_rock: bool,
    pub(crate) scratch: Scratch,
    pub(crate) driver: Driver,
    pub(crate) last_moves: VecDeque<MoveRecord>,
}

impl Creature {
    pub(crate) fn new(
        id: CreatureId,
        position: Position,
        hp: i32,
        fullness: i32,
        driver: Driver,
    ) -> Self {
        Self {
            id,
            position,
            hp,
            fullness,
            falling: false,
            fall_dist: 0,
            carrying_rock: false,
            scratch: Scratch::new(),
            driver,
            last_moves: VecDeque::new(),
        }
    }

    /// Identifier assigned at spawn.
    #[must_use]
    pub const fn id(&self) -> CreatureId {
        self.id
    }

    /// Current position; `x` is always within `0..width`.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn hp(&self) -> i32 {
        self.hp
    }

    /// Remaining fullness.
    #[must_use]
    pub const fn fullness(&self) -> i32 {
        self.fullness
    }

    /// Whether the creature is in free fall.
    #[must_use]
    pub const fn is_falling(&self) -> bool {
        self.falling
    }

    /// Cells fallen since the current fall started.
    #[must_use]
    pub const fn fall_dist(&self) -> u32 {
        self.fall_dist
    }

    /// Whether the creature carries a rock.
    #[must_use]
    pub const fn is_carrying_rock(&self) -> bool {
        self.carrying_rock
    }

    /// The bot's private scratch store, for debug display.
    #[must_use]
    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    /// Identifier of the bot driving the creature.
    #[must_use]
    pub fn bot_id(&self) -> &str {
        match &self.driver {
            Driver::Bot(bot) => bot.id(),
            Driver::Human(_) => HUMAN_BOT_ID,
        }
    }

    /// Whether a human operator drives the creature.
    #[must_use]
    pub fn is_human(&self) -> bool {
        matches!(self.driver, Driver::Human(_))
    }

    /// Recorded decisions, oldest first.
    pub fn last_moves(&self) -> impl Iterator<Item = &MoveRecord> {
        self.last_moves.iter()
    }

    /// Bot-facing view of the creature.
    #[must_use]
    pub fn view(&self) -> CreatureView {
        CreatureView {
            last_moves: self.last_moves.iter().copied().collect(),
            ..self.summary()
        }
    }

    fn summary(&self) -> CreatureView {
        CreatureView {
            id: self.id,
            position: self.position,
            hp: self.hp,
            fullness: self.fullness,
            falling: self.falling,
            fall_dist: self.fall_dist,
            carrying_rock: self.carrying_rock,
            last_moves: Vec::new(),
        }
    }

    /// View handed to other creatures' bots; never carries the move log.
    pub(crate) fn peer_view(&self) -> CreatureView {
        CreatureView {
            last_moves: Vec::new(),
            ..self.summary()
        }
    }

    pub(crate) fn record(&mut self, record: MoveRecord, capacity: usize) {
        if capacity == 0 {
            return;
        }
        while self.last_moves.len() >= capacity {
            let _ = self.last_moves.pop_front();
        }
        self.last_moves.push_back(record);
    }
}

/// Why a creature died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DeathCause {
    /// Landed after falling too far.
    Fall,
    /// Ran out of fullness and then hit points.
    Starvation,
    /// Struck by a falling or dropped rock.
    Crush,
    /// Bitten by another creature.
    Bite,
}

impl DeathCause {
    /// Whether the death site receives a fertilization burst.
    #[must_use]
    pub const fn fertilizes(self) -> bool {
        !matches!(self, DeathCause::Starvation)
    }
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeathCause::Fall => "fall",
            DeathCause::Starvation => "starvation",
            DeathCause::Crush => "crush",
            DeathCause::Bite => "bite",
        };
        f.write_str(label)
    }
}

/// Entry of the dead-creature ledger.
#[derive(Debug)]
pub struct DeadCreature {
    /// The creature as it was when it died.
    pub creature: Creature,
    /// Tick during which it died.
    pub died_tick: u64,
    /// What killed it.
    pub cause: DeathCause,
}
