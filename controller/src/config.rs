//! Sandbox configuration and gameplay constants.

use std::{fs, io, path::Path, path::PathBuf};

use delve_core::Food;
use delve_system_terrain::{TerrainTuning, TuningError};
use delve_world::{SettingsError, WorldSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete description of a sandbox run, loadable from TOML.
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Seed of the single random stream driving generation, spawning, and play.
    pub seed: u64,
    /// Number of columns in the generated world.
    pub width: u32,
    /// Terrain generator parameters.
    pub world: WorldSettings,
    /// Terrain evolution odds and rock crush damage.
    pub terrain: TerrainTuning,
    /// Creature vitals, hunger, and damage constants.
    pub physiology: Physiology,
    /// Number of decisions kept per creature when the move log is enabled.
    pub move_log_capacity: usize,
    /// Upper bound on ticks a competition may run, if any.
    pub max_ticks: Option<u64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_d31e,
            width: 256,
            world: WorldSettings::default(),
            terrain: TerrainTuning::default(),
            physiology: Physiology::default(),
            move_log_capacity: 32,
            max_ticks: Some(50_000),
        }
    }
}

impl SandboxConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the values that cannot be expressed through the types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        self.world.validate()?;
        let physiology = &self.physiology;
        if physiology.spawn_hp <= 0 || physiology.spawn_hp > physiology.max_hp {
            return Err(ConfigError::Vitals {
                name: "hp",
                spawn: physiology.spawn_hp,
                max: physiology.max_hp,
            });
        }
        if physiology.spawn_fullness < 0 || physiology.spawn_fullness > physiology.max_fullness {
            return Err(ConfigError::Vitals {
                name: "fullness",
                spawn: physiology.spawn_fullness,
                max: physiology.max_fullness,
            });
        }
        physiology.validate()?;
        self.terrain.validate()?;
        Ok(())
    }
}

/// Nourishment gained from one bite of a food.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodGain {
    /// Hit points restored.
    pub hp: i32,
    /// Fullness restored.
    pub fullness: i32,
}

/// Gameplay constants governing creature bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Physiology {
    /// Hit points of a freshly spawned creature.
    pub spawn_hp: i32,
    /// Cap applied whenever hit points are gained.
    pub max_hp: i32,
    /// Fullness of a freshly spawned creature.
    pub spawn_fullness: i32,
    /// Cap applied whenever fullness is gained.
    pub max_fullness: i32,
    /// Fullness lost per tick before any escalation.
    pub fullness_loss_per_tick: i32,
    /// Ticks between doublings of the hunger rate; zero disables escalation.
    pub hunger_escalation_interval: u64,
    /// Maximum number of hunger doublings.
    pub hunger_escalation_cap: u32,
    /// Damage dealt per tick once fullness is exhausted.
    pub starvation_damage: i32,
    /// Longest fall, in cells, that causes no damage.
    pub fall_max_safe_dist: u32,
    /// Damage of the shortest harmful fall.
    pub fall_base_damage: i32,
    /// Extra damage per cell fallen beyond the shortest harmful fall.
    pub fall_per_unit_damage: i32,
    /// Damage dealt to each creature under a dropped rock.
    pub rock_drop_damage: i32,
    /// Damage dealt by a bite.
    pub bite_damage: i32,
    /// Nourishment of small grass tufts.
    pub small_grass_tufts: FoodGain,
    /// Nourishment of large grass tufts.
    pub large_grass_tufts: FoodGain,
    /// Nourishment of the grass on grassy dirt.
    pub grassy_dirt: FoodGain,
    /// Nourishment of moss.
    pub moss: FoodGain,
}

impl Default for Physiology {
    fn default() -> Self {
        Self {
            spawn_hp: 18,
            max_hp: 20,
            spawn_fullness: 180,
            max_fullness: 200,
            fullness_loss_per_tick: 1,
            hunger_escalation_interval: 1_000,
            hunger_escalation_cap: 4,
            starvation_damage: 1,
            fall_max_safe_dist: 2,
            fall_base_damage: 1,
            fall_per_unit_damage: 2,
            rock_drop_damage: 5,
            bite_damage: 5,
            small_grass_tufts: FoodGain {
                hp: 1,
                fullness: 25,
            },
            large_grass_tufts: FoodGain {
                hp: 1,
                fullness: 25,
            },
            grassy_dirt: FoodGain {
                hp: 1,
                fullness: 25,
            },
            moss: FoodGain {
                hp: 0,
                fullness: 20,
            },
        }
    }
}

impl Physiology {
    /// Largest supported number of hunger doublings.
    pub const MAX_HUNGER_ESCALATION: u32 = 30;

    fn validate(&self) -> Result<(), ConfigError> {
        let amounts = [
            ("fullness_loss_per_tick", self.fullness_loss_per_tick),
            ("starvation_damage", self.starvation_damage),
            ("fall_base_damage", self.fall_base_damage),
            ("fall_per_unit_damage", self.fall_per_unit_damage),
            ("rock_drop_damage", self.rock_drop_damage),
            ("bite_damage", self.bite_damage),
            ("small_grass_tufts.hp", self.small_grass_tufts.hp),
            ("small_grass_tufts.fullness", self.small_grass_tufts.fullness),
            ("large_grass_tufts.hp", self.large_grass_tufts.hp),
            ("large_grass_tufts.fullness", self.large_grass_tufts.fullness),
            ("grassy_dirt.hp", self.grassy_dirt.hp),
            ("grassy_dirt.fullness", self.grassy_dirt.fullness),
            ("moss.hp", self.moss.hp),
            ("moss.fullness", self.moss.fullness),
        ];
        if let Some(&(name, value)) = amounts.iter().find(|(_, value)| *value < 0) {
            return Err(ConfigError::Negative { name, value });
        }
        if self.hunger_escalation_cap > Self::MAX_HUNGER_ESCALATION {
            return Err(ConfigError::HungerEscalation {
                cap: self.hunger_escalation_cap,
            });
        }
        Ok(())
    }

    /// Fullness lost at `tick`, doubling every escalation interval up to the cap.
    #[must_use]
    pub fn hunger_at(&self, tick: u64) -> i32 {
        let doublings = match self.hunger_escalation_interval {
            0 => 0,
            interval => (tick / interval).min(u64::from(self.hunger_escalation_cap)),
        };
        let factor = u32::try_from(doublings)
            .ok()
            .and_then(|doublings| 2_i32.checked_pow(doublings))
            .unwrap_or(i32::MAX);
        self.fullness_loss_per_tick.saturating_mul(factor)
    }

    /// Damage taken when landing after falling `fall_dist` cells.
    #[must_use]
    pub fn fall_damage(&self, fall_dist: u32) -> Option<i32> {
        (fall_dist > self.fall_max_safe_dist).then(|| {
            let excess = i32::try_from(fall_dist - self.fall_max_safe_dist - 1).unwrap_or(i32::MAX);
            excess
                .saturating_mul(self.fall_per_unit_damage)
                .saturating_add(self.fall_base_damage)
        })
    }

    /// Nourishment of the given food.
    #[must_use]
    pub const fn gain(&self, food: Food) -> FoodGain {
        match food {
            Food::SmallGrassTufts => self.small_grass_tufts,
            Food::LargeGrassTufts => self.large_grass_tufts,
            Food::GrassyDirt => self.grassy_dirt,
            Food::Moss => self.moss,
        }
    }
}

/// Reasons a sandbox cannot be configured or built.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration text was not valid TOML for this schema.
    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The world width was zero.
    #[error("world width must be positive")]
    ZeroWidth,
    /// The terrain generator settings were rejected.
    #[error(transparent)]
    World(#[from] SettingsError),
    /// Spawn vitals were non-positive or above their caps.
    #[error("spawn {name} {spawn} must lie within 0..={max}")]
    Vitals {
        /// Which vital was rejected.
        name: &'static str,
        /// Configured spawn value.
        spawn: i32,
        /// Configured cap.
        max: i32,
    },
    /// A damage, nourishment, or hunger amount was negative.
    #[error("{name} must not be negative, got {value}")]
    Negative {
        /// Which constant was rejected.
        name: &'static str,
        /// Configured value.
        value: i32,
    },
    /// Hunger would double more often than the loss can represent.
    #[error("hunger escalation cap {cap} exceeds {max}", max = Physiology::MAX_HUNGER_ESCALATION)]
    HungerEscalation {
        /// Configured cap.
        cap: u32,
    },
    /// The terrain evolution odds were rejected.
    #[error(transparent)]
    Terrain(#[from] TuningError),
    /// A match was requested with zero copies of each bot.
    #[error("at least one copy of each bot is required")]
    ZeroCopies,
    /// A match was requested without any bots.
    #[error("at least one bot is required")]
    NoBots,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SandboxConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, SandboxConfig::default());
    }

    #[test]
    fn nested_tables_override_selected_fields() {
        let config = SandboxConfig::from_toml_str(
            r#"
            seed = 7
            width = 64

            [world]
            stone_height = 40
            dirt_height = 4

            [physiology]
            bite_damage = 9
            moss = { hp = 2, fullness = 30 }
            "#,
        )
        .expect("valid config");

        assert_eq!(config.seed, 7);
        assert_eq!(config.width, 64);
        assert_eq!(config.world.dirt_height, 4);
        assert_eq!(config.world.rock_odds, WorldSettings::default().rock_odds);
        assert_eq!(config.physiology.bite_damage, 9);
        assert_eq!(config.physiology.moss, FoodGain { hp: 2, fullness: 30 });
        assert_eq!(config.physiology.max_hp, 20);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            SandboxConfig::from_toml_str("width = 0"),
            Err(ConfigError::ZeroWidth)
        ));
        assert!(matches!(
            SandboxConfig::from_toml_str("[world]\nrock_odds = 2.0"),
            Err(ConfigError::World(_))
        ));
        assert!(matches!(
            SandboxConfig::from_toml_str("[physiology]\nspawn_hp = 30"),
            Err(ConfigError::Vitals { name: "hp", .. })
        ));
        assert!(matches!(
            SandboxConfig::from_toml_str("width = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SandboxConfig::from_toml_str("[physiology]\nbite_damage = -50"),
            Err(ConfigError::Negative { name: "bite_damage", value: -50 })
        ));
        assert!(matches!(
            SandboxConfig::from_toml_str("[physiology]\nmoss = { hp = -1, fullness = 20 }"),
            Err(ConfigError::Negative { name: "moss.hp", .. })
        ));
        assert!(matches!(
            SandboxConfig::from_toml_str("[physiology]\nfullness_loss_per_tick = -1"),
            Err(ConfigError::Negative { .. })
        ));
        assert!(matches!(
            SandboxConfig::from_toml_str("[physiology]\nhunger_escalation_cap = 31"),
            Err(ConfigError::HungerEscalation { cap: 31 })
        ));
        assert!(matches!(
            SandboxConfig::from_toml_str("[terrain]\nstone_to_mossy = 1.5"),
            Err(ConfigError::Terrain(_))
        ));
    }

    #[test]
    fn steepest_allowed_hunger_stays_positive() {
        let physiology = Physiology {
            hunger_escalation_interval: 1,
            hunger_escalation_cap: Physiology::MAX_HUNGER_ESCALATION,
            ..Physiology::default()
        };
        let config = SandboxConfig {
            physiology: physiology.clone(),
            ..SandboxConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(physiology.hunger_at(30), 1 << 30);
        assert_eq!(physiology.hunger_at(u64::MAX), 1 << 30);

        let runaway = Physiology {
            hunger_escalation_cap: 31,
            fullness_loss_per_tick: 3,
            ..physiology
        };
        assert_eq!(runaway.hunger_at(64), i32::MAX);
    }

    #[test]
    fn hunger_doubles_per_interval_up_to_cap() {
        let physiology = Physiology::default();
        assert_eq!(physiology.hunger_at(0), 1);
        assert_eq!(physiology.hunger_at(999), 1);
        assert_eq!(physiology.hunger_at(1_000), 2);
        assert_eq!(physiology.hunger_at(3_500), 8);
        assert_eq!(physiology.hunger_at(4_000), 16);
        assert_eq!(physiology.hunger_at(u64::MAX), 16);

        let steady = Physiology {
            hunger_escalation_interval: 0,
            ..Physiology::default()
        };
        assert_eq!(steady.hunger_at(1_000_000), 1);
    }

    #[test]
    fn falls_beyond_safe_distance_hurt() {
        let physiology = Physiology::default();
        assert_eq!(physiology.fall_damage(0), None);
        assert_eq!(physiology.fall_damage(2), None);
        assert_eq!(physiology.fall_damage(3), Some(1));
        assert_eq!(physiology.fall_damage(4), Some(3));
        assert_eq!(physiology.fall_damage(10), Some(15));
    }
}
