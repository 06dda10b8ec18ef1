use delve_controller::{Bot, Turn};
use delve_core::{eat, left, right, BotError, Cell, Move};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Grazes whatever grass it stands in or on, otherwise wanders at random.
///
/// The wandering direction is derived from the tick and creature id, so a
/// replayed match makes the same choices.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sheep;

impl Bot for Sheep {
    fn id(&self) -> &str {
        "sheep"
    }

    fn name(&self) -> &str {
        "Sheep"
    }

    fn run(&self, turn: Turn<'_>) -> Result<Option<Move>, BotError> {
        let world = turn.world;
        let (x, y) = (turn.me.position.x(), turn.me.position.y());

        if world.cell(x, y).is_grass_tufts() {
            return Ok(Some(eat(x, y)));
        }
        if world.cell(x, y - 1) == Cell::GrassyDirt {
            return Ok(Some(eat(x, y - 1)));
        }

        let seed = turn.tick.rotate_left(32) ^ u64::from(turn.me.id.get());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(Some(if rng.gen_bool(0.5) { left() } else { right() }))
    }
}
