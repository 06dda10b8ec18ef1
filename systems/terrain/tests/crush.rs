use std::num::NonZeroU32;

use delve_core::{Cell, Position};
use delve_system_terrain::{CrushHandler, Terrain, TerrainTuning};
use delve_world::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, PartialEq)]
struct Crush {
    pos: Position,
    damage: u32,
    on_solid_ground: bool,
}

#[derive(Default)]
struct Bystanders {
    positions: Vec<(Position, bool)>,
    crushes: Vec<Crush>,
}

impl CrushHandler for Bystanders {
    fn is_occupied(&self, pos: Position) -> bool {
        self.positions.iter().any(|(p, _)| *p == pos)
    }

    fn crush<R: Rng + ?Sized>(
        &mut self,
        _world: &mut World,
        _rng: &mut R,
        pos: Position,
        damage: u32,
        on_solid_ground: bool,
    ) {
        self.crushes.push(Crush {
            pos,
            damage,
            on_solid_ground,
        });
        for (p, falling) in &mut self.positions {
            if *p == pos && !on_solid_ground && !*falling {
                *p = p.below();
                *falling = true;
            }
        }
    }
}

fn shaft(height: usize) -> World {
    let mut rows = vec![vec![Cell::Bedrock; 3]];
    rows.extend((1..height).map(|_| vec![Cell::Stone, Cell::Empty, Cell::Stone]));
    World::from_rows(NonZeroU32::new(3).expect("non-zero"), &rows)
}

fn quiet_terrain() -> Terrain {
    Terrain::new(TerrainTuning {
        stone_to_mossy: 0.0,
        bedrock_to_mossy: 0.0,
        ..TerrainTuning::default()
    })
}

#[test]
fn rock_landing_on_grounded_creature_is_consumed() {
    let terrain = quiet_terrain();
    let mut world = shaft(6);
    world.set_cell(1, 3, Cell::RESTING_ROCK);
    let mut bystanders = Bystanders {
        positions: vec![(Position::new(1, 1), false)],
        ..Bystanders::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    terrain.evolve(&mut world, &mut rng, &mut bystanders);
    assert_eq!(world.cell(1, 2), Cell::Rock { stage: 1 });
    assert!(bystanders.crushes.is_empty());

    terrain.evolve(&mut world, &mut rng, &mut bystanders);
    assert_eq!(
        bystanders.crushes,
        vec![Crush {
            pos: Position::new(1, 1),
            damage: terrain.rock_crush_damage(1),
            on_solid_ground: true,
        }]
    );
    assert_eq!(world.cell(1, 1), Cell::Empty, "the rock shatters on impact");
    assert_eq!(world.cell(1, 2), Cell::Empty);
    assert_eq!(bystanders.positions, vec![(Position::new(1, 1), false)]);
}

#[test]
fn rock_landing_on_airborne_creature_knocks_it_down() {
    let terrain = quiet_terrain();
    let mut world = shaft(8);
    world.set_cell(1, 5, Cell::RESTING_ROCK);
    let mut bystanders = Bystanders {
        positions: vec![(Position::new(1, 3), false)],
        ..Bystanders::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(12);

    terrain.evolve(&mut world, &mut rng, &mut bystanders);
    terrain.evolve(&mut world, &mut rng, &mut bystanders);

    assert_eq!(bystanders.crushes.len(), 1);
    assert!(!bystanders.crushes[0].on_solid_ground);
    assert_eq!(bystanders.positions, vec![(Position::new(1, 2), true)]);
}

#[test]
fn crush_positions_are_wrapped() {
    let terrain = quiet_terrain();
    let width = NonZeroU32::new(4).expect("non-zero");
    let mut world = World::from_rows(width, &[vec![Cell::Bedrock; 4]]);
    world.set_cell(-1, 2, Cell::RESTING_ROCK);
    let mut bystanders = Bystanders {
        positions: vec![(Position::new(3, 1), false)],
        ..Bystanders::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(13);

    terrain.evolve(&mut world, &mut rng, &mut bystanders);
    assert_eq!(bystanders.crushes.len(), 1);
    assert_eq!(bystanders.crushes[0].pos, Position::new(3, 1));
}
