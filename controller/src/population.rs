//! Live creature list, dead ledger, and removal bookkeeping.

use delve_core::{CreatureId, Position};
use delve_system_terrain::{CrushHandler, Terrain};
use delve_world::World;
use rand::Rng;
use tracing::debug;

use crate::creature::{Creature, DeadCreature, DeathCause};

/// Outcome of applying damage to a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Wound {
    Survived,
    /// The creature died; carries the site to fertilize, if any.
    Died(Option<Position>),
}

/// Creatures ordered by processing order, plus the dead ledger.
///
/// `cursor` is the index of the next creature to take its turn. Removing a
/// creature before the cursor shifts it back so no survivor is skipped.
#[derive(Debug, Default)]
pub(crate) struct Population {
    pub(crate) creatures: Vec<Creature>,
    pub(crate) dead: Vec<DeadCreature>,
    pub(crate) cursor: usize,
}

impl Population {
    pub(crate) fn index_of(&self, id: CreatureId) -> Option<usize> {
        self.creatures.iter().position(|creature| creature.id == id)
    }

    pub(crate) fn is_occupied(&self, pos: Position) -> bool {
        self.creatures.iter().any(|creature| creature.position == pos)
    }

    pub(crate) fn wound(
        &mut self,
        index: usize,
        amount: i32,
        cause: DeathCause,
        tick: u64,
    ) -> Wound {
        let creature = &mut self.creatures[index];
        creature.hp = creature.hp.saturating_sub(amount);
        if creature.hp > 0 {
            return Wound::Survived;
        }

        let creature = self.creatures.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        }
        debug!(
            creature = creature.id.get(),
            bot = creature.bot_id(),
            %cause,
            tick,
            "creature died"
        );
        let site = cause.fertilizes().then_some(creature.position);
        self.dead.push(DeadCreature {
            creature,
            died_tick: tick,
            cause,
        });
        Wound::Died(site)
    }

    /// Damages everyone at `pos`; survivors without footing are knocked down.
    ///
    /// Returns the sites of deaths that fertilize.
    pub(crate) fn crush(
        &mut self,
        pos: Position,
        damage: i32,
        on_solid_ground: bool,
        tick: u64,
    ) -> Vec<Position> {
        let victims: Vec<CreatureId> = self
            .creatures
            .iter()
            .filter(|creature| creature.position == pos)
            .map(|creature| creature.id)
            .collect();

        let mut sites = Vec::new();
        for id in victims {
            let Some(index) = self.index_of(id) else {
                continue;
            };
            match self.wound(index, damage, DeathCause::Crush, tick) {
                Wound::Survived => {
                    let victim = &mut self.creatures[index];
                    if !on_solid_ground && !victim.falling {
                        victim.position = victim.position.below();
                        victim.falling = true;
                    }
                }
                Wound::Died(site) => sites.extend(site),
            }
        }
        sites
    }
}

/// Routes rocks falling during the terrain pass onto the population.
pub(crate) struct RockFall<'a> {
    pub(crate) population: &'a mut Population,
    pub(crate) terrain: &'a Terrain,
    pub(crate) tick: u64,
}

impl CrushHandler for RockFall<'_> {
    fn is_occupied(&self, pos: Position) -> bool {
        self.population.is_occupied(pos)
    }

    fn crush<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
        pos: Position,
        damage: u32,
        on_solid_ground: bool,
    ) {
        let damage = i32::try_from(damage).unwrap_or(i32::MAX);
        for site in self
            .population
            .crush(pos, damage, on_solid_ground, self.tick)
        {
            self.terrain.fertilize(world, rng, site);
        }
    }
}
