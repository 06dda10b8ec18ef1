//! Procedural terrain generation.

use std::{f64::consts::TAU, num::NonZeroU32};

use delve_core::{BgCell, Cell};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::World;

/// Rows of open air allocated above the nominal ground height.
const HEADROOM_ROWS: i64 = 16;
/// Share of barren surface columns that keep plain dirt instead.
const BARREN_SURFACE_DIRT_ODDS: f64 = 1.0 / 3.0;
/// Share of grass tufts generated in the small size.
const SMALL_TUFTS_ODDS: f64 = 2.0 / 3.0;

/// Tunable parameters of the terrain generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Mean thickness of the stone band above the bedrock floor.
    pub stone_height: u32,
    /// Mean thickness of the dirt band above the stone.
    pub dirt_height: u32,
    /// Amplitude of the rolling stone/dirt boundary.
    pub stone_height_roughness: f64,
    /// Amplitude of the rolling dirt/surface boundary.
    pub dirt_height_roughness: f64,
    /// Probability that a buried dirt cell is a rock instead.
    pub rock_odds: f64,
    /// Probability that a surface column has no grass.
    pub no_grass_odds: f64,
    /// Probability that a grassy column grows a tuft above its surface.
    pub grass_tufts_odds: f64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            stone_height: 40,
            dirt_height: 12,
            stone_height_roughness: 4.0,
            dirt_height_roughness: 3.0,
            rock_odds: 1.0 / 16.0,
            no_grass_odds: 1.0 / 4.0,
            grass_tufts_odds: 1.0 / 2.0,
        }
    }
}

impl WorldSettings {
    /// Checks that every probability lies within `0.0..=1.0` and every
    /// roughness is finite and non-negative.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let odds = [
            ("rock_odds", self.rock_odds),
            ("no_grass_odds", self.no_grass_odds),
            ("grass_tufts_odds", self.grass_tufts_odds),
        ];
        for (name, value) in odds {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::Probability { name, value });
            }
        }

        let roughness = [
            ("stone_height_roughness", self.stone_height_roughness),
            ("dirt_height_roughness", self.dirt_height_roughness),
        ];
        for (name, value) in roughness {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::Roughness { name, value });
            }
        }
        Ok(())
    }
}

/// Reasons generator settings are rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SettingsError {
    /// A probability fell outside `0.0..=1.0`.
    #[error("`{name}` must be a probability, got {value}")]
    Probability {
        /// Name of the offending setting.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A roughness was negative or not finite.
    #[error("`{name}` must be a finite non-negative number, got {value}")]
    Roughness {
        /// Name of the offending setting.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Sum of sine octaves used to roll a boundary across the periodic width.
struct Boundary {
    base: f64,
    phases: Vec<f64>,
    amplitude: f64,
}

impl Boundary {
    fn new<R: Rng + ?Sized>(base: f64, roughness: f64, width: f64, rng: &mut R) -> Self {
        let octaves = octave_count(width);
        let phases = (0..octaves).map(|_| rng.gen::<f64>()).collect();
        let amplitude = if octaves == 0 {
            0.0
        } else {
            roughness / (width / 2.0).log2()
        };
        Self {
            base,
            phases,
            amplitude,
        }
    }

    fn height_at<R: Rng + ?Sized>(&self, x: f64, width: f64, rng: &mut R) -> f64 {
        let jitter = (rng.gen::<f64>() * 2.0 - 1.0) / 4.0;
        let mut height = self.base + jitter;
        let mut frequency = 1.0;
        for phase in &self.phases {
            height += ((x * frequency / width + phase) * TAU).sin() * self.amplitude;
            frequency *= 2.0;
        }
        height
    }
}

/// Number of octaves `1, 2, 4, ...` strictly below half the width.
fn octave_count(width: f64) -> usize {
    let mut count = 0;
    let mut frequency = 1.0;
    while frequency < width / 2.0 {
        count += 1;
        frequency *= 2.0;
    }
    count
}

impl World {
    /// Generates a fresh world of the given width.
    ///
    /// Each column gets a bedrock floor, a stone band, a dirt band seeded with
    /// rocks, and a surface cell that is either grassy or bare. Grassy columns
    /// may sprout a tuft above the surface.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(
        width: NonZeroU32,
        settings: &WorldSettings,
        rng: &mut R,
    ) -> Self {
        let stone_base = 1.0 + f64::from(settings.stone_height);
        let dirt_base = stone_base + f64::from(settings.dirt_height);
        let ground_height = 1 + i64::from(settings.stone_height) + i64::from(settings.dirt_height);

        let mut world = World::empty(width);
        world.ground_height = ground_height;
        let allocated = usize::try_from(ground_height + HEADROOM_ROWS).unwrap_or(0);
        world.cells = vec![Cell::Empty; allocated * world.row_len()];
        world.background = vec![BgCell::Sky; allocated * world.row_len()];

        let span = f64::from(width.get());
        let stone = Boundary::new(stone_base, settings.stone_height_roughness, span, rng);
        let dirt = Boundary::new(dirt_base, settings.dirt_height_roughness, span, rng);

        for x in 0..i64::from(width.get()) {
            world.paint(x, 0, Cell::Bedrock, BgCell::Bedrock);

            let stone_top = (stone.height_at(x as f64, span, rng).round() as i64).max(1);
            for y in 1..stone_top {
                world.paint(x, y, Cell::Stone, BgCell::Stone);
            }

            let dirt_top = (dirt.height_at(x as f64, span, rng).round() as i64).max(stone_top + 1);
            for y in stone_top..dirt_top - 1 {
                let cell = if rng.gen::<f64>() < settings.rock_odds {
                    Cell::RESTING_ROCK
                } else {
                    Cell::Dirt
                };
                world.paint(x, y, cell, BgCell::Dirt);
            }

            let grassy = rng.gen::<f64>() >= settings.no_grass_odds;
            let surface = if grassy {
                Cell::GrassyDirt
            } else if rng.gen::<f64>() < BARREN_SURFACE_DIRT_ODDS {
                Cell::Dirt
            } else {
                Cell::BarrenDirt
            };
            world.paint(x, dirt_top - 1, surface, BgCell::Dirt);

            if grassy && rng.gen::<f64>() < settings.grass_tufts_odds {
                let tufts = if rng.gen::<f64>() < SMALL_TUFTS_ODDS {
                    Cell::SmallGrassTufts
                } else {
                    Cell::LargeGrassTufts
                };
                world.set_cell(x, dirt_top, tufts);
            }
        }

        world
    }

    fn paint(&mut self, x: i64, y: i64, cell: Cell, background: BgCell) {
        self.set_cell(x, y, cell);
        let Some(index) = self.index(x, y) else {
            return;
        };
        if index >= self.background.len() {
            let row_len = self.row_len();
            self.background
                .resize((index / row_len + 1) * row_len, BgCell::Sky);
        }
        self.background[index] = background;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn generate(width: u32, settings: &WorldSettings, seed: u64) -> World {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        World::generate(NonZeroU32::new(width).expect("non-zero"), settings, &mut rng)
    }

    #[test]
    fn octaves_follow_half_width() {
        assert_eq!(octave_count(1.0), 0);
        assert_eq!(octave_count(2.0), 0);
        assert_eq!(octave_count(3.0), 1);
        assert_eq!(octave_count(64.0), 5);
        assert_eq!(octave_count(65.0), 6);
    }

    #[test]
    fn every_column_has_bedrock_stone_and_surface() {
        let world = generate(96, &WorldSettings::default(), 7);
        for x in 0..96 {
            assert_eq!(world.cell(x, 0), Cell::Bedrock);
            assert_eq!(world.bg_cell(x, 0), BgCell::Bedrock);
            assert_eq!(world.cell(x, 1), Cell::Stone);

            let top = world.top_solid_y(x);
            let surface = world.cell(x, top);
            assert!(
                matches!(surface, Cell::GrassyDirt | Cell::BarrenDirt | Cell::Dirt),
                "column {x} surface was {surface:?}"
            );
            let above = world.cell(x, top + 1);
            assert!(above == Cell::Empty || above.is_grass_tufts());
            if above.is_grass_tufts() {
                assert_eq!(surface, Cell::GrassyDirt);
            }
        }
    }

    #[test]
    fn background_covers_every_allocated_row() {
        let world = generate(48, &WorldSettings::default(), 9);
        let backgrounds: Vec<&[BgCell]> = crate::query::background_rows(&world).collect();
        assert_eq!(backgrounds.len(), world.rows());
        assert_eq!(backgrounds.len(), crate::query::rows(&world).count());
        assert!(backgrounds
            .last()
            .is_some_and(|row| row.iter().all(|&bg| bg == BgCell::Sky)));
    }

    #[test]
    fn surface_stays_near_configured_height() {
        let settings = WorldSettings::default();
        let world = generate(128, &settings, 11);
        let ground = world.ground_height();
        let slack = settings.dirt_height_roughness.ceil() as i64 + 2;
        for x in 0..128 {
            let top = world.top_solid_y(x);
            assert!(
                (top - (ground - 1)).abs() <= slack,
                "column {x} top {top} strays from {ground}"
            );
        }
    }

    #[test]
    fn same_seed_generates_same_world() {
        let settings = WorldSettings::default();
        assert_eq!(generate(64, &settings, 3), generate(64, &settings, 3));
        assert_ne!(generate(64, &settings, 3), generate(64, &settings, 4));
    }

    #[test]
    fn rocks_only_appear_in_the_dirt_band() {
        let settings = WorldSettings {
            rock_odds: 1.0,
            ..WorldSettings::default()
        };
        let world = generate(32, &settings, 5);
        for x in 0..32 {
            for y in 0..=settings.stone_height as i64 - 8 {
                assert!(!world.is_rock(x, y), "rock at ({x}, {y}) inside stone");
            }
        }
        assert!((0..32).any(|x| (0..world.ground_height()).any(|y| world.is_rock(x, y))));
    }

    #[test]
    fn validate_rejects_bad_odds() {
        let settings = WorldSettings {
            no_grass_odds: 1.5,
            ..WorldSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::Probability {
                name: "no_grass_odds",
                value: 1.5
            })
        );
        assert_eq!(WorldSettings::default().validate(), Ok(()));
    }
}
