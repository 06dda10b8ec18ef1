#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for initial creature placement.
//!
//! Creatures are dropped onto the surface one at a time. While the world is
//! sparsely populated every newcomer keeps a one-column gap from its peers;
//! as the population grows the rule relaxes to distinct columns and finally
//! to any column at all.

use delve_core::{CreatureId, Position};
use delve_world::World;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Minimum wrapped column distance kept between creatures in a sparse world.
const SPARSE_MIN_SPACING: i64 = 2;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// A creature slot resolved to an identifier and a starting position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Identifier assigned to the creature.
    pub id: CreatureId,
    /// Index of the creature in the roster order it was requested in.
    pub slot: usize,
    /// Cell directly above the surface of the chosen column.
    pub position: Position,
}

/// How strictly a new creature must avoid columns already in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Crowding {
    Sparse,
    Moderate,
    Dense,
}

impl Crowding {
    fn for_population(placed: usize, width: u32) -> Self {
        let placed = placed as f64;
        let width = f64::from(width);
        if placed > width * 2.0 / 3.0 {
            Self::Dense
        } else if placed > width / 6.0 {
            Self::Moderate
        } else {
            Self::Sparse
        }
    }
}

/// Pure system that assigns identifiers and spawn positions.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Places `count` creatures on the surface of `world`.
    ///
    /// Identifiers are a random permutation of `0..count`. The result is
    /// sorted by identifier; [`Placement::slot`] refers back to the request
    /// order so callers can pair each placement with its bot.
    pub fn place(&mut self, world: &World, count: usize) -> Vec<Placement> {
        let mut ids: Vec<u32> = (0..count)
            .map(|index| u32::try_from(index).unwrap_or(u32::MAX))
            .collect();
        ids.shuffle(&mut self.rng);

        let mut columns: Vec<i64> = Vec::with_capacity(count);
        let mut placements = Vec::with_capacity(count);
        for (slot, id) in ids.into_iter().enumerate() {
            let x = self.pick_column(world, &columns);
            columns.push(x);
            placements.push(Placement {
                id: CreatureId::new(id),
                slot,
                position: Position::new(x, world.top_solid_y(x) + 1),
            });
        }

        placements.sort_by_key(|placement| placement.id);
        placements
    }

    fn pick_column(&mut self, world: &World, used: &[i64]) -> i64 {
        let width = i64::from(world.width());
        let crowding = Crowding::for_population(used.len(), world.width());
        let candidates: Vec<i64> = (0..width)
            .filter(|&x| match crowding {
                Crowding::Dense => true,
                Crowding::Moderate => !used.contains(&x),
                Crowding::Sparse => used
                    .iter()
                    .all(|&other| world.wrapping_x_offset(other, x).abs() >= SPARSE_MIN_SPACING),
            })
            .collect();

        match candidates.choose(&mut self.rng) {
            Some(&x) => x,
            None => self.rng.gen_range(0..width),
        }
    }
}
