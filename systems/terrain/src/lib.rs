#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terrain evolution system: grass growth, soil decay, moss, and falling rock.
//!
//! The system never owns creatures. Whenever a falling rock lands on an
//! occupied cell it defers to a [`CrushHandler`] supplied by the caller, which
//! applies damage and pushes survivors into a fall.

use delve_core::{Cell, Position, ROCK_MAX_STAGE};
use delve_world::World;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Receives the consequences of rocks landing on creatures.
pub trait CrushHandler {
    /// Reports whether any creature occupies `pos`.
    fn is_occupied(&self, pos: Position) -> bool;

    /// Applies `damage` to every creature at `pos`.
    ///
    /// Survivors that are not already falling and not `on_solid_ground` must
    /// be knocked down one cell and start falling.
    fn crush<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
        pos: Position,
        damage: u32,
        on_solid_ground: bool,
    );
}

/// Per-tick transition probabilities and crush damage of the automaton.
///
/// "Sky" rules apply at or above a column's top solid cell, "buried" rules
/// below it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    /// Barren dirt under open sky recovering to plain dirt.
    pub barren_dirt_sky_to_dirt: f64,
    /// Plain dirt under open sky growing grass.
    pub dirt_sky_to_grassy_dirt: f64,
    /// Buried grassy dirt losing its grass.
    pub grassy_dirt_buried_to_dirt: f64,
    /// Buried barren dirt recovering to plain dirt.
    pub barren_dirt_buried_to_dirt: f64,
    /// Buried small tufts withering away.
    pub small_tufts_buried_vanish: f64,
    /// Buried large tufts withering away.
    pub large_tufts_buried_vanish: f64,
    /// Grassy dirt under open sky sprouting a tuft above itself.
    pub grassy_dirt_sky_sprout: f64,
    /// Small tufts under open sky growing large.
    pub small_tufts_sky_grow: f64,
    /// Exposed stone growing moss.
    pub stone_to_mossy: f64,
    /// Exposed chipped stone growing moss.
    pub chipped_stone_to_mossy: f64,
    /// Exposed bedrock growing moss.
    pub bedrock_to_mossy: f64,
    /// Damage of a rock landing without momentum.
    pub rock_crush_base_damage: u32,
    /// Extra damage per momentum stage of a landing rock.
    pub rock_crush_per_stage_damage: u32,
    /// Counted trials of a fertilization burst.
    pub fertilize_rounds: u32,
    /// Maximum radius of a fertilization trial.
    pub fertilize_max_dist: f64,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            barren_dirt_sky_to_dirt: 1.0 / 128.0,
            dirt_sky_to_grassy_dirt: 1.0 / 128.0,
            grassy_dirt_buried_to_dirt: 1.0 / 8.0,
            barren_dirt_buried_to_dirt: 1.0 / 8.0,
            small_tufts_buried_vanish: 1.0 / 8.0,
            large_tufts_buried_vanish: 1.0 / 8.0,
            grassy_dirt_sky_sprout: 1.0 / 1024.0,
            small_tufts_sky_grow: 1.0 / 1024.0,
            stone_to_mossy: 2.0 / 2048.0,
            chipped_stone_to_mossy: 3.0 / 2048.0,
            bedrock_to_mossy: 1.0 / 2048.0,
            rock_crush_base_damage: 5,
            rock_crush_per_stage_damage: 2,
            fertilize_rounds: 1024,
            fertilize_max_dist: 8.0,
        }
    }
}

impl TerrainTuning {
    /// Checks that every odds value lies within `0.0..=1.0` and the
    /// fertilization radius is finite and non-negative.
    pub fn validate(&self) -> Result<(), TuningError> {
        let odds = [
            ("barren_dirt_sky_to_dirt", self.barren_dirt_sky_to_dirt),
            ("dirt_sky_to_grassy_dirt", self.dirt_sky_to_grassy_dirt),
            ("grassy_dirt_buried_to_dirt", self.grassy_dirt_buried_to_dirt),
            ("barren_dirt_buried_to_dirt", self.barren_dirt_buried_to_dirt),
            ("small_tufts_buried_vanish", self.small_tufts_buried_vanish),
            ("large_tufts_buried_vanish", self.large_tufts_buried_vanish),
            ("grassy_dirt_sky_sprout", self.grassy_dirt_sky_sprout),
            ("small_tufts_sky_grow", self.small_tufts_sky_grow),
            ("stone_to_mossy", self.stone_to_mossy),
            ("chipped_stone_to_mossy", self.chipped_stone_to_mossy),
            ("bedrock_to_mossy", self.bedrock_to_mossy),
        ];
        for (name, value) in odds {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::Probability { name, value });
            }
        }

        let radius = self.fertilize_max_dist;
        if !radius.is_finite() || radius < 0.0 {
            return Err(TuningError::Radius { value: radius });
        }
        Ok(())
    }
}

/// Reasons automaton tuning is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TuningError {
    /// An odds value fell outside `0.0..=1.0`.
    #[error("`{name}` must be a probability, got {value}")]
    Probability {
        /// Name of the offending setting.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// The fertilization radius was negative or not finite.
    #[error("`fertilize_max_dist` must be a finite non-negative number, got {value}")]
    Radius {
        /// Offending value.
        value: f64,
    },
}

/// Chance that a fertilization trial landing on air or below the floor is
/// retried instead of counted.
const FERTILIZE_RETRY_ODDS: f64 = 2.0 / 3.0;

/// Pure system that evolves terrain one tick at a time.
#[derive(Clone, Debug, Default)]
pub struct Terrain {
    tuning: TerrainTuning,
}

impl Terrain {
    /// Creates a new terrain system using the supplied tuning.
    #[must_use]
    pub fn new(tuning: TerrainTuning) -> Self {
        Self { tuning }
    }

    /// Tuning the system was created with.
    #[must_use]
    pub fn tuning(&self) -> &TerrainTuning {
        &self.tuning
    }

    /// Damage dealt by a rock landing with the given momentum stage.
    #[must_use]
    pub fn rock_crush_damage(&self, stage: u8) -> u32 {
        self.tuning
            .rock_crush_per_stage_damage
            .saturating_mul(u32::from(stage) + 1)
            .saturating_add(self.tuning.rock_crush_base_damage)
    }

    /// Applies one pass of the automaton over every allocated cell.
    ///
    /// Column ground levels are captured before any cell changes. Cells are
    /// visited column by column from the floor upward, so a rock that falls
    /// this pass is not visited again until the next one.
    pub fn evolve<R, H>(&self, world: &mut World, rng: &mut R, handler: &mut H)
    where
        R: Rng + ?Sized,
        H: CrushHandler,
    {
        let rows = i64::try_from(world.rows()).unwrap_or(i64::MAX);
        let width = i64::from(world.width());
        let roof: Vec<i64> = (0..width).map(|x| world.top_solid_y(x)).collect();

        for (x, &ground) in (0..width).zip(&roof) {
            for y in 0..rows {
                self.evolve_cell(world, rng, handler, x, y, ground);
            }
        }
    }

    fn evolve_cell<R, H>(
        &self,
        world: &mut World,
        rng: &mut R,
        handler: &mut H,
        x: i64,
        y: i64,
        roof: i64,
    ) where
        R: Rng + ?Sized,
        H: CrushHandler,
    {
        let tuning = &self.tuning;
        let buried = y < roof;
        match world.cell(x, y) {
            Cell::Empty => {}
            Cell::SmallGrassTufts => {
                if world.cell(x, y - 1) == Cell::Empty
                    || (buried && roll(rng, tuning.small_tufts_buried_vanish))
                {
                    world.set_cell(x, y, Cell::Empty);
                } else if y > roof && roll(rng, tuning.small_tufts_sky_grow) {
                    world.set_cell(x, y, Cell::LargeGrassTufts);
                }
            }
            Cell::LargeGrassTufts => {
                if world.cell(x, y - 1) == Cell::Empty
                    || (buried && roll(rng, tuning.large_tufts_buried_vanish))
                {
                    world.set_cell(x, y, Cell::Empty);
                }
            }
            Cell::GrassyDirt => {
                if buried {
                    if roll(rng, tuning.grassy_dirt_buried_to_dirt) {
                        world.set_cell(x, y, Cell::Dirt);
                    }
                } else if roll(rng, tuning.grassy_dirt_sky_sprout)
                    && world.cell(x, y + 1) == Cell::Empty
                {
                    world.set_cell(x, y + 1, Cell::SmallGrassTufts);
                }
            }
            Cell::BarrenDirt => {
                let odds = if buried {
                    tuning.barren_dirt_buried_to_dirt
                } else {
                    tuning.barren_dirt_sky_to_dirt
                };
                if roll(rng, odds) {
                    world.set_cell(x, y, Cell::Dirt);
                }
            }
            Cell::Dirt => {
                if !buried && roll(rng, tuning.dirt_sky_to_grassy_dirt) {
                    world.set_cell(x, y, Cell::GrassyDirt);
                }
            }
            Cell::Rock { stage } => self.settle_rock(world, rng, handler, x, y, stage),
            cell @ (Cell::Stone | Cell::ChippedStone | Cell::Bedrock) => {
                let odds = match cell {
                    Cell::Stone => tuning.stone_to_mossy,
                    Cell::ChippedStone => tuning.chipped_stone_to_mossy,
                    _ => tuning.bedrock_to_mossy,
                };
                if world.is_bordering_empty(x, y) && roll(rng, odds) {
                    if let Some(mossy) = cell.mossy() {
                        world.set_cell(x, y, mossy);
                    }
                }
            }
            Cell::MossyStone | Cell::MossyChippedStone | Cell::MossyBedrock => {}
        }
    }

    fn settle_rock<R, H>(
        &self,
        world: &mut World,
        rng: &mut R,
        handler: &mut H,
        x: i64,
        y: i64,
        stage: u8,
    ) where
        R: Rng + ?Sized,
        H: CrushHandler,
    {
        if world.is_solid(x, y - 1) {
            if stage != 0 {
                world.set_cell(x, y, Cell::RESTING_ROCK);
            }
            return;
        }

        let keeps_falling = !world.is_solid(x, y - 2) || world.is_falling_rock(x, y - 2);
        let landed = if keeps_falling {
            Cell::Rock {
                stage: (stage + 1).min(ROCK_MAX_STAGE),
            }
        } else {
            Cell::RESTING_ROCK
        };
        world.set_cell(x, y, Cell::Empty);
        world.set_cell(x, y - 1, landed);

        let target = world.normalize(Position::new(x, y - 1));
        if handler.is_occupied(target) {
            let on_solid_ground = world.is_solid(x, y - 2);
            world.set_cell_at(target, Cell::Empty);
            let damage = self.rock_crush_damage(stage);
            handler.crush(world, rng, target, damage, on_solid_ground);
        }
    }

    /// Runs a burst of accelerated regrowth around `center`.
    ///
    /// Each counted trial picks a cell at a random angle and a radius biased
    /// toward the centre, then applies the sky transition of that cell at the
    /// square root of its per-tick odds. Trials landing on air or below the
    /// floor are usually retried rather than counted.
    pub fn fertilize<R: Rng + ?Sized>(&self, world: &mut World, rng: &mut R, center: Position) {
        let tuning = &self.tuning;
        let mut counted = 0;
        while counted < tuning.fertilize_rounds {
            let radius = rng.gen::<f64>().powi(2) * tuning.fertilize_max_dist;
            let angle = rng.gen::<f64>() * std::f64::consts::TAU;
            let fx = (center.x() as f64 + radius * angle.cos()).round() as i64;
            let fy = (center.y() as f64 + radius * angle.sin()).round() as i64;

            if fy < 0 || world.cell(fx, fy) == Cell::Empty {
                if !roll(rng, FERTILIZE_RETRY_ODDS) {
                    counted += 1;
                }
                continue;
            }
            counted += 1;

            match world.cell(fx, fy) {
                Cell::SmallGrassTufts => {
                    if roll(rng, tuning.small_tufts_sky_grow.sqrt()) {
                        world.set_cell(fx, fy, Cell::LargeGrassTufts);
                    }
                }
                Cell::GrassyDirt => {
                    if world.cell(fx, fy + 1) == Cell::Empty
                        && roll(rng, tuning.grassy_dirt_sky_sprout.sqrt())
                    {
                        world.set_cell(fx, fy + 1, Cell::SmallGrassTufts);
                    }
                }
                Cell::BarrenDirt => {
                    if roll(rng, tuning.barren_dirt_sky_to_dirt.sqrt()) {
                        world.set_cell(fx, fy, Cell::Dirt);
                    }
                }
                Cell::Dirt => {
                    if !world.is_solid(fx, fy + 1) && roll(rng, tuning.dirt_sky_to_grassy_dirt.sqrt())
                    {
                        world.set_cell(fx, fy, Cell::GrassyDirt);
                    }
                }
                cell @ (Cell::Stone | Cell::ChippedStone | Cell::Bedrock) => {
                    let odds = match cell {
                        Cell::Stone => tuning.stone_to_mossy,
                        Cell::ChippedStone => tuning.chipped_stone_to_mossy,
                        _ => tuning.bedrock_to_mossy,
                    };
                    if roll(rng, odds.sqrt()) {
                        if let Some(mossy) = cell.mossy() {
                            world.set_cell(fx, fy, mossy);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

fn roll<R: Rng + ?Sized>(rng: &mut R, odds: f64) -> bool {
    rng.gen::<f64>() < odds
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    struct Nobody;

    impl CrushHandler for Nobody {
        fn is_occupied(&self, _pos: Position) -> bool {
            false
        }

        fn crush<R: Rng + ?Sized>(
            &mut self,
            _world: &mut World,
            _rng: &mut R,
            _pos: Position,
            _damage: u32,
            _on_solid_ground: bool,
        ) {
        }
    }

    fn shaft(height: usize) -> World {
        let mut rows = vec![vec![Cell::Bedrock; 3]];
        rows.extend((1..height).map(|_| vec![Cell::Stone, Cell::Empty, Cell::Stone]));
        World::from_rows(NonZeroU32::new(3).expect("non-zero"), &rows)
    }

    fn still() -> Terrain {
        Terrain::new(TerrainTuning {
            barren_dirt_sky_to_dirt: 0.0,
            dirt_sky_to_grassy_dirt: 0.0,
            grassy_dirt_buried_to_dirt: 0.0,
            barren_dirt_buried_to_dirt: 0.0,
            small_tufts_buried_vanish: 0.0,
            large_tufts_buried_vanish: 0.0,
            grassy_dirt_sky_sprout: 0.0,
            small_tufts_sky_grow: 0.0,
            stone_to_mossy: 0.0,
            chipped_stone_to_mossy: 0.0,
            bedrock_to_mossy: 0.0,
            ..TerrainTuning::default()
        })
    }

    fn rock_at(world: &World) -> Option<(i64, u8)> {
        (0..world.rows() as i64).find_map(|y| match world.cell(1, y) {
            Cell::Rock { stage } => Some((y, stage)),
            _ => None,
        })
    }

    #[test]
    fn crush_damage_scales_with_stage() {
        let terrain = Terrain::default();
        assert_eq!(terrain.rock_crush_damage(0), 7);
        assert_eq!(terrain.rock_crush_damage(1), 9);
        assert_eq!(terrain.rock_crush_damage(8), 23);
    }

    #[test]
    fn huge_crush_damage_saturates() {
        let terrain = Terrain::new(TerrainTuning {
            rock_crush_base_damage: u32::MAX,
            rock_crush_per_stage_damage: u32::MAX / 2,
            ..TerrainTuning::default()
        });
        assert_eq!(terrain.rock_crush_damage(0), u32::MAX);
        assert_eq!(terrain.rock_crush_damage(ROCK_MAX_STAGE), u32::MAX);
    }

    #[test]
    fn validate_rejects_bad_tuning() {
        assert_eq!(TerrainTuning::default().validate(), Ok(()));

        let odds = TerrainTuning {
            bedrock_to_mossy: -0.1,
            ..TerrainTuning::default()
        };
        assert_eq!(
            odds.validate(),
            Err(TuningError::Probability {
                name: "bedrock_to_mossy",
                value: -0.1
            })
        );

        let radius = TerrainTuning {
            fertilize_max_dist: f64::NAN,
            ..TerrainTuning::default()
        };
        assert!(matches!(radius.validate(), Err(TuningError::Radius { .. })));
    }

    #[test]
    fn falling_rock_gains_one_stage_per_tick_and_settles() {
        let terrain = still();
        let mut world = shaft(8);
        world.set_cell(1, 6, Cell::RESTING_ROCK);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut observed = Vec::new();
        for _ in 0..7 {
            terrain.evolve(&mut world, &mut rng, &mut Nobody);
            observed.push(rock_at(&world));
        }

        assert_eq!(
            observed,
            vec![
                Some((5, 1)),
                Some((4, 2)),
                Some((3, 3)),
                Some((2, 4)),
                Some((1, 0)),
                Some((1, 0)),
                Some((1, 0)),
            ]
        );
    }

    #[test]
    fn dislodged_rock_restarts_from_first_stage() {
        let terrain = still();
        let mut world = shaft(6);
        world.set_cell(1, 2, Cell::Dirt);
        world.set_cell(1, 3, Cell::RESTING_ROCK);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        terrain.evolve(&mut world, &mut rng, &mut Nobody);
        assert_eq!(rock_at(&world), Some((3, 0)));

        world.set_cell(1, 2, Cell::Empty);
        terrain.evolve(&mut world, &mut rng, &mut Nobody);
        assert_eq!(rock_at(&world), Some((2, 1)));
    }

    #[test]
    fn momentum_saturates_at_top_stage() {
        let terrain = still();
        let mut world = shaft(30);
        world.set_cell(1, 28, Cell::RESTING_ROCK);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut highest = 0;
        for _ in 0..20 {
            terrain.evolve(&mut world, &mut rng, &mut Nobody);
            if let Some((_, stage)) = rock_at(&world) {
                highest = highest.max(stage);
            }
        }
        assert_eq!(highest, ROCK_MAX_STAGE);
    }

    #[test]
    fn unsupported_tufts_vanish() {
        let terrain = still();
        let mut world = shaft(4);
        world.set_cell(1, 3, Cell::SmallGrassTufts);
        world.set_cell(0, 4, Cell::LargeGrassTufts);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        terrain.evolve(&mut world, &mut rng, &mut Nobody);
        assert_eq!(world.cell(1, 3), Cell::Empty);
        assert_eq!(world.cell(0, 4), Cell::LargeGrassTufts);
    }

    #[test]
    fn certain_odds_apply_sky_and_buried_rules() {
        let terrain = Terrain::new(TerrainTuning {
            barren_dirt_sky_to_dirt: 1.0,
            grassy_dirt_buried_to_dirt: 1.0,
            grassy_dirt_sky_sprout: 1.0,
            ..still().tuning().clone()
        });
        let width = NonZeroU32::new(2).expect("non-zero");
        let mut world = World::from_rows(
            width,
            &[
                vec![Cell::Bedrock, Cell::Bedrock],
                vec![Cell::GrassyDirt, Cell::Dirt],
                vec![Cell::Dirt, Cell::BarrenDirt],
            ],
        );
        world.set_cell(0, 3, Cell::GrassyDirt);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        terrain.evolve(&mut world, &mut rng, &mut Nobody);
        assert_eq!(world.cell(0, 1), Cell::Dirt, "buried grass regresses");
        assert_eq!(world.cell(0, 4), Cell::SmallGrassTufts, "exposed grass sprouts");
        assert_eq!(world.cell(1, 2), Cell::Dirt, "exposed barren dirt recovers");
    }

    #[test]
    fn moss_needs_an_open_neighbour() {
        let terrain = Terrain::new(TerrainTuning {
            stone_to_mossy: 1.0,
            ..still().tuning().clone()
        });
        let width = NonZeroU32::new(3).expect("non-zero");
        let mut world = World::from_rows(width, &[vec![Cell::Stone; 3], vec![Cell::Stone; 3]]);
        world.set_cell(0, 2, Cell::Stone);
        world.set_cell(2, 2, Cell::Stone);
        world.set_cell(1, 2, Cell::Stone);
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        terrain.evolve(&mut world, &mut rng, &mut Nobody);
        assert_eq!(world.cell(1, 0), Cell::Stone);
        assert_eq!(world.cell(1, 2), Cell::MossyStone);
    }

    #[test]
    fn fertilize_never_touches_air_or_the_floor() {
        let terrain = Terrain::default();
        let mut world = shaft(10);
        let before = world.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        terrain.fertilize(&mut world, &mut rng, Position::new(1, 5));
        for y in 0..10 {
            assert_eq!(world.cell(1, y).is_solid(), before.cell(1, y).is_solid());
        }
    }

    #[test]
    fn fertilize_greens_the_surroundings() {
        let terrain = Terrain::default();
        let width = NonZeroU32::new(32).expect("non-zero");
        let mut world = World::from_rows(width, &[vec![Cell::Bedrock; 32], vec![Cell::BarrenDirt; 32]]);
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        terrain.fertilize(&mut world, &mut rng, Position::new(16, 2));
        let recovered = (0..32).filter(|&x| world.cell(x, 1) != Cell::BarrenDirt).count();
        assert!(recovered > 0, "a burst should recover some barren dirt");
    }
}
