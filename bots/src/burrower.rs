use delve_controller::{Bot, Turn};
use delve_core::{climb_down, climb_up, dig, drop_rock, eat, pick_up_rock, BotError, Cell, Move};
use serde_json::Value;

use crate::routines::{is_grass, is_moss};

/// Scratch key holding the height the burrower spawned at.
const SPAWN_Y: &str = "spawn_y";
/// Fullness above which the burrower keeps digging instead of foraging.
const DIGGING_FULLNESS: i32 = 100;

/// Digs a shaft toward bedrock while well fed, then climbs back up to graze.
///
/// Rocks blocking the shaft are picked up and dropped into a side pocket.
/// Stays put at the bottom of its shaft or at the surface when it has
/// nothing useful to do.
#[derive(Clone, Copy, Debug, Default)]
pub struct Burrower;

impl Burrower {
    fn dig_down(turn: &Turn<'_>) -> Option<Move> {
        let world = turn.world;
        let (x, y) = (turn.me.position.x(), turn.me.position.y());
        let beneath = world.cell(x, y - 1);

        if !beneath.is_solid() {
            return Some(climb_down());
        }
        if beneath.is_rock() {
            if !turn.me.carrying_rock {
                return Some(pick_up_rock(x, y - 1));
            }
            for side in [x - 1, x + 1] {
                if !world.is_solid(side, y) {
                    return Some(drop_rock(side, y));
                }
            }
            let side = if world.is_rock(x - 1, y) { x + 1 } else { x - 1 };
            return Some(dig(side, y));
        }
        if matches!(beneath, Cell::Bedrock | Cell::MossyBedrock) {
            return None;
        }
        Some(dig(x, y - 1))
    }

    fn forage(turn: &Turn<'_>, spawn_y: i64) -> Option<Move> {
        let world = turn.world;
        let me = turn.me.position;
        let (x, y) = (me.x(), me.y());

        for (mx, my) in [(x, y - 1), (x - 1, y), (x + 1, y)] {
            if is_moss(world.cell(mx, my)) {
                return Some(eat(mx, my));
            }
        }

        if y < spawn_y - 1 {
            return Some(climb_up());
        }

        [(-1, 1), (1, 1), (-1, 0), (1, 0)]
            .into_iter()
            .map(|(dx, dy)| me.offset(dx, dy))
            .find(|&target| is_grass(world.cell_at(target)) && world.is_reachable_from(me, target))
            .map(|target| eat(target.x(), target.y()))
    }
}

impl Bot for Burrower {
    fn id(&self) -> &str {
        "burrower"
    }

    fn name(&self) -> &str {
        "Burrower"
    }

    fn run(&self, turn: Turn<'_>) -> Result<Option<Move>, BotError> {
        let spawn_y = match turn.scratch.get(SPAWN_Y).and_then(Value::as_i64) {
            Some(spawn_y) => spawn_y,
            None => {
                let spawn_y = turn.me.position.y();
                let _ = turn.scratch.insert(SPAWN_Y.to_owned(), Value::from(spawn_y));
                spawn_y
            }
        };

        if turn.me.fullness > DIGGING_FULLNESS {
            Ok(Self::dig_down(&turn))
        } else {
            Ok(Self::forage(&turn, spawn_y))
        }
    }
}
