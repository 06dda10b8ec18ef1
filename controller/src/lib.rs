#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven simulation controller for the Delve sandbox.
//!
//! The [`Controller`] owns the [`World`], the live creature list, and the
//! dead ledger. Each call to [`Controller::tick`] resolves every creature in
//! list order (gravity, hunger, decision, move execution), then runs one pass
//! of the terrain automaton. Bots are consulted through the [`Bot`] trait and
//! every move they return is validated before it touches live state.

mod bot;
mod competition;
mod config;
mod creature;
mod human;
mod population;


use std::{
    any::Any,
    mem,
    num::NonZeroU32,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
    time::{Duration, Instant},
};

use delve_core::{BiteTarget, BotError, Cell, CreatureId, Move, MoveRecord, Position};
use delve_system_spawning::{Config as SpawnConfig, Spawning};
use delve_system_terrain::Terrain;
use delve_world::{SimulatedStep, World};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

pub use bot::{Bot, CreatureView, Turn};
pub use competition::{run_competition, CompetitionOutcome};
pub use config::{ConfigError, FoodGain, Physiology, SandboxConfig};
pub use creature::{Creature, DeadCreature, DeathCause, HUMAN_BOT_ID};
pub use human::{HumanDisconnected, HumanInput};

use creature::Driver;
use population::{Population, RockFall, Wound};

/// A creature death observed during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Death {
    /// Identifier of the creature that died.
    pub id: CreatureId,
    /// What killed it.
    pub cause: DeathCause,
    /// Where it died.
    pub position: Position,
}

/// Summary of a single resolved tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tick that was resolved.
    pub tick: u64,
    /// Deaths in the order they happened.
    pub deaths: Vec<Death>,
    /// Whether a human operator resolved a move during the tick.
    pub human_move_accepted: bool,
}

/// Authoritative simulation state advanced one tick at a time.
#[derive(Debug)]
pub struct Controller {
    world: World,
    population: Population,
    tick: u64,
    timings: Vec<Duration>,
    physiology: Physiology,
    terrain: Terrain,
    rng: ChaCha8Rng,
    move_log_capacity: usize,
    next_id: u32,
}

impl Controller {
    /// Generates a world and spawns `copies` creatures per bot.
    ///
    /// Creatures receive shuffled identifiers and are processed in
    /// identifier order. With `debug` set every creature keeps a log of its
    /// most recent decisions.
    pub fn build(
        config: &SandboxConfig,
        bots: &[Rc<dyn Bot>],
        copies: usize,
        debug: bool,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if bots.is_empty() {
            return Err(ConfigError::NoBots);
        }
        if copies == 0 {
            return Err(ConfigError::ZeroCopies);
        }
        let width = NonZeroU32::new(config.width).ok_or(ConfigError::ZeroWidth)?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let world = World::generate(width, &config.world, &mut rng);
        let mut spawning = Spawning::new(SpawnConfig::new(rng.gen()));
        let placements = spawning.place(&world, bots.len() * copies);

        let mut controller = Self::assemble(config, world, rng, debug);
        for placement in placements {
            let bot = Rc::clone(&bots[placement.slot % bots.len()]);
            controller.population.creatures.push(Creature::new(
                placement.id,
                placement.position,
                controller.physiology.spawn_hp,
                controller.physiology.spawn_fullness,
                Driver::Bot(bot),
            ));
            controller.next_id = controller.next_id.max(placement.id.get() + 1);
        }

        info!(
            creatures = controller.population.creatures.len(),
            width = config.width,
            seed = config.seed,
            "controller built"
        );
        Ok(controller)
    }

    /// Builds a match in which the creature with identifier 0 is driven by a
    /// human operator through the returned [`HumanInput`].
    ///
    /// With `safe` set, moves that would start a fall or otherwise injure the
    /// human creature are discarded and the controller keeps waiting.
    pub fn build_interactive(
        config: &SandboxConfig,
        bots: &[Rc<dyn Bot>],
        copies: usize,
        debug: bool,
        safe: bool,
    ) -> Result<(Self, HumanInput), ConfigError> {
        let mut controller = Self::build(config, bots, copies, debug)?;
        let (input, link) = human::channel(safe);
        if let Some(index) = controller.population.index_of(CreatureId::new(0)) {
            controller.population.creatures[index].driver = Driver::Human(link);
        }
        Ok((controller, input))
    }

    /// Wraps an existing world without spawning anyone.
    ///
    /// Add creatures with [`Controller::spawn`] and
    /// [`Controller::spawn_human`].
    #[must_use]
    pub fn with_world(config: &SandboxConfig, world: World, debug: bool) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::assemble(config, world, rng, debug)
    }

    fn assemble(config: &SandboxConfig, world: World, rng: ChaCha8Rng, debug: bool) -> Self {
        Self {
            world,
            population: Population::default(),
            tick: 0,
            timings: Vec::new(),
            physiology: config.physiology.clone(),
            terrain: Terrain::new(config.terrain.clone()),
            rng,
            move_log_capacity: if debug { config.move_log_capacity } else { 0 },
            next_id: 0,
        }
    }

    /// Adds a bot-driven creature at `position` with spawn vitals.
    pub fn spawn(&mut self, bot: Rc<dyn Bot>, position: Position) -> CreatureId {
        self.insert(position, Driver::Bot(bot))
    }

    /// Adds a human-driven creature at `position` with spawn vitals.
    pub fn spawn_human(&mut self, position: Position, safe: bool) -> (CreatureId, HumanInput) {
        let (input, link) = human::channel(safe);
        (self.insert(position, Driver::Human(link)), input)
    }

    fn insert(&mut self, position: Position, driver: Driver) -> CreatureId {
        let id = CreatureId::new(self.next_id);
        self.next_id += 1;
        self.population.creatures.push(Creature::new(
            id,
            self.world.normalize(position),
            self.physiology.spawn_hp,
            self.physiology.spawn_fullness,
            driver,
        ));
        id
    }

    /// Terrain the creatures live in.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Live creatures in processing order.
    #[must_use]
    pub fn creatures(&self) -> &[Creature] {
        &self.population.creatures
    }

    /// Live creature with the given identifier.
    #[must_use]
    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.population
            .index_of(id)
            .map(|index| &self.population.creatures[index])
    }

    /// Every creature that has died, in order of death.
    #[must_use]
    pub fn dead(&self) -> &[DeadCreature] {
        &self.population.dead
    }

    /// Number of ticks resolved so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Wall-clock duration of every resolved tick.
    #[must_use]
    pub fn timings(&self) -> &[Duration] {
        &self.timings
    }

    /// Gameplay constants in effect.
    #[must_use]
    pub fn physiology(&self) -> &Physiology {
        &self.physiology
    }

    /// Resolves one tick.
    ///
    /// Blocks while waiting for a human operator, if one drives a live
    /// creature.
    pub fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let ledger_start = self.population.dead.len();
        let mut human_move_accepted = false;

        self.population.cursor = 0;
        while self.population.cursor < self.population.creatures.len() {
            let index = self.population.cursor;
            self.population.cursor += 1;
            human_move_accepted |= self.take_turn(index);
        }

        let mut rock_fall = RockFall {
            population: &mut self.population,
            terrain: &self.terrain,
            tick: self.tick,
        };
        self.terrain
            .evolve(&mut self.world, &mut self.rng, &mut rock_fall);

        let deaths = self.population.dead[ledger_start..]
            .iter()
            .map(|entry| Death {
                id: entry.creature.id,
                cause: entry.cause,
                position: entry.creature.position,
            })
            .collect();

        let tick = self.tick;
        self.tick += 1;
        let elapsed = started.elapsed();
        self.timings.push(elapsed);
        trace!(tick, elapsed_us = elapsed.as_micros() as u64, "tick resolved");

        TickReport {
            tick,
            deaths,
            human_move_accepted,
        }
    }

    /// Runs one creature's turn; returns whether a human resolved a move.
    fn take_turn(&mut self, index: usize) -> bool {
        if self.apply_hunger(index) || self.apply_gravity(index) {
            return false;
        }

        let (action, human_move_accepted) = self.decide(index);
        if self.move_log_capacity > 0 {
            let creature = &mut self.population.creatures[index];
            let record = MoveRecord {
                tick: self.tick,
                position: creature.position,
                action,
            };
            creature.record(record, self.move_log_capacity);
        }
        if let Some(action) = action {
            self.execute(index, action);
        }
        human_move_accepted
    }

    /// Returns `true` when the creature's turn is over.
    fn apply_gravity(&mut self, index: usize) -> bool {
        let world = &self.world;
        let creature = &mut self.population.creatures[index];
        let (x, y) = (creature.position.x(), creature.position.y());

        if !world.is_solid(x, y - 1) {
            let braced = world.is_solid(x - 1, y) && world.is_solid(x + 1, y);
            if creature.falling || !braced {
                creature.falling = true;
                creature.fall_dist += 1;
                creature.position = creature.position.below();
                return true;
            }
            return false;
        }

        if !creature.falling {
            return false;
        }
        let fall_dist = creature.fall_dist;
        creature.falling = false;
        creature.fall_dist = 0;
        match self.physiology.fall_damage(fall_dist) {
            Some(damage) => self.hurt(index, damage, DeathCause::Fall),
            None => false,
        }
    }

    /// Returns `true` when the creature starved to death.
    fn apply_hunger(&mut self, index: usize) -> bool {
        let loss = self.physiology.hunger_at(self.tick);
        let creature = &mut self.population.creatures[index];
        if creature.fullness > 0 {
            creature.fullness = creature.fullness.saturating_sub(loss).max(0);
            return false;
        }
        self.hurt(
            index,
            self.physiology.starvation_damage,
            DeathCause::Starvation,
        )
    }

    /// Applies damage; returns `true` when the creature died.
    fn hurt(&mut self, index: usize, amount: i32, cause: DeathCause) -> bool {
        match self.population.wound(index, amount, cause, self.tick) {
            Wound::Survived => false,
            Wound::Died(site) => {
                if let Some(center) = site {
                    self.terrain.fertilize(&mut self.world, &mut self.rng, center);
                }
                true
            }
        }
    }

    fn decide(&mut self, index: usize) -> (Option<Move>, bool) {
        match &self.population.creatures[index].driver {
            Driver::Bot(bot) => {
                let bot = Rc::clone(bot);
                (self.consult(index, bot.as_ref()), false)
            }
            Driver::Human(_) => self.await_human(index),
        }
    }

    fn consult(&mut self, index: usize, bot: &dyn Bot) -> Option<Move> {
        let creatures = &self.population.creatures;
        let me = creatures[index].view();
        let others: Vec<CreatureView> = creatures
            .iter()
            .enumerate()
            .filter(|&(other, _)| other != index)
            .map(|(_, creature)| creature.peer_view())
            .collect();
        let mut scratch = mem::take(&mut self.population.creatures[index].scratch);

        let world = &self.world;
        let tick = self.tick;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            bot.run(Turn {
                me: &me,
                scratch: &mut scratch,
                others: &others,
                world,
                tick,
            })
        }));
        self.population.creatures[index].scratch = scratch;

        let decision = match outcome {
            Ok(decision) => decision,
            Err(payload) => Err(BotError::Panicked(panic_message(payload.as_ref()))),
        };
        let validated = decision.and_then(|action| {
            if let Some(action) = &action {
                action.validate()?;
            }
            Ok(action)
        });

        match validated {
            Ok(action) => action,
            Err(error) => {
                warn!(
                    bot = bot.id(),
                    creature = me.id.get(),
                    tick,
                    %error,
                    "bot move rejected, idling"
                );
                None
            }
        }
    }

    fn await_human(&self, index: usize) -> (Option<Move>, bool) {
        let creature = &self.population.creatures[index];
        let Driver::Human(link) = &creature.driver else {
            return (None, false);
        };

        loop {
            let action = match link.moves.recv() {
                Ok(action) => action,
                Err(_) => {
                    warn!(
                        creature = creature.id.get(),
                        "human input disconnected, idling"
                    );
                    return (None, false);
                }
            };
            let Some(action) = action else {
                return (None, true);
            };
            if let Err(error) = action.validate() {
                warn!(creature = creature.id.get(), %error, "human move rejected, idling");
                return (None, true);
            }
            if link.safe && self.is_self_harm(creature, action) {
                debug!(
                    creature = creature.id.get(),
                    action = ?action,
                    "unsafe human move discarded"
                );
                continue;
            }
            return (Some(action), true);
        }
    }

    /// Reports whether `action` would start a fall or injure `creature`.
    fn is_self_harm(&self, creature: &Creature, action: Move) -> bool {
        let world = &self.world;
        let pos = creature.position;
        let starts_fall = |step: Option<SimulatedStep>| step.is_some_and(|step| step.falling);

        match action {
            Move::Left => starts_fall(world.simulate_left(pos)),
            Move::Right => starts_fall(world.simulate_right(pos)),
            Move::ClimbDown => starts_fall(world.simulate_climb_down(pos)),
            Move::ClimbUp | Move::PickUp(_) | Move::Eat(_) => false,
            Move::Dig(target) => {
                if !world.is_reachable_from(pos, target) {
                    return false;
                }
                match world.cell_at(target).dug() {
                    Some(remains) => {
                        let mut preview = world.clone();
                        preview.set_cell_at(target, remains);
                        preview.will_fall(pos)
                    }
                    None => false,
                }
            }
            Move::Drop(target) => creature.carrying_rock && world.normalize(target) == pos,
            Move::Bite(BiteTarget::Creature(id)) => id == creature.id,
            Move::Bite(BiteTarget::Position(_)) => false,
        }
    }

    fn execute(&mut self, index: usize, action: Move) {
        let pos = self.population.creatures[index].position;
        match action {
            Move::Left | Move::Right | Move::ClimbUp | Move::ClimbDown => {
                let step = match action {
                    Move::Left => self.world.simulate_left(pos),
                    Move::Right => self.world.simulate_right(pos),
                    Move::ClimbUp => self.world.simulate_climb_up(pos),
                    _ => self.world.simulate_climb_down(pos),
                };
                if let Some(step) = step {
                    self.population.creatures[index].position = step.position;
                }
            }
            Move::Dig(target) => {
                if !self.world.is_reachable_from(pos, target) {
                    return;
                }
                if let Some(remains) = self.world.cell_at(target).dug() {
                    self.world.set_cell_at(target, remains);
                }
            }
            Move::PickUp(target) => {
                let creature = &mut self.population.creatures[index];
                if !creature.carrying_rock
                    && self.world.is_reachable_from(pos, target)
                    && self.world.cell_at(target) == Cell::RESTING_ROCK
                {
                    self.world.set_cell_at(target, Cell::Empty);
                    creature.carrying_rock = true;
                }
            }
            Move::Drop(target) => self.drop_rock(index, pos, target),
            Move::Eat(target) => self.eat(index, pos, target),
            Move::Bite(target) => self.bite(index, pos, target),
        }
    }

    fn drop_rock(&mut self, index: usize, pos: Position, target: Position) {
        let target = self.world.normalize(target);
        if !self.population.creatures[index].carrying_rock
            || !self.world.is_reachable_from(pos, target)
            || self.world.is_solid(target.x(), target.y())
        {
            return;
        }

        self.world.set_cell_at(target, Cell::RESTING_ROCK);
        self.population.creatures[index].carrying_rock = false;

        if self.population.is_occupied(target) {
            let on_solid_ground = self.world.is_solid(target.x(), target.y() - 1);
            self.world.set_cell_at(target, Cell::Empty);
            let sites = self.population.crush(
                target,
                self.physiology.rock_drop_damage,
                on_solid_ground,
                self.tick,
            );
            for site in sites {
                self.terrain.fertilize(&mut self.world, &mut self.rng, site);
            }
        }
    }

    fn eat(&mut self, index: usize, pos: Position, target: Position) {
        if !self.world.is_reachable_from(pos, target) {
            return;
        }
        let Some((food, remains)) = self.world.cell_at(target).edible() else {
            return;
        };

        let gain = self.physiology.gain(food);
        let creature = &mut self.population.creatures[index];
        creature.hp = creature.hp.saturating_add(gain.hp).min(self.physiology.max_hp);
        creature.fullness = creature
            .fullness
            .saturating_add(gain.fullness)
            .min(self.physiology.max_fullness);
        self.world.set_cell_at(target, remains);
    }

    fn bite(&mut self, index: usize, pos: Position, target: BiteTarget) {
        let victim = match target {
            BiteTarget::Creature(id) => self.population.index_of(id).filter(|&victim| {
                let victim_pos = self.population.creatures[victim].position;
                self.world.is_reachable_from(pos, victim_pos)
            }),
            BiteTarget::Position(spot) => {
                if !self.world.is_reachable_from(pos, spot) {
                    return;
                }
                let spot = self.world.normalize(spot);
                let candidates: Vec<usize> = self
                    .population
                    .creatures
                    .iter()
                    .enumerate()
                    .filter(|&(other, creature)| other != index && creature.position == spot)
                    .map(|(other, _)| other)
                    .collect();
                candidates.choose(&mut self.rng).copied()
            }
        };

        if let Some(victim) = victim {
            let _ = self.hurt(victim, self.physiology.bite_damage, DeathCause::Bite);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
