use delve_controller::{Bot, Turn};
use delve_core::{dig, right, BotError, Move};

/// Heads right forever, tunnelling a staircase through anything in the way.
///
/// Cannot get past rocks and never eats.
#[derive(Clone, Copy, Debug, Default)]
pub struct Runner;

impl Bot for Runner {
    fn id(&self) -> &str {
        "runner"
    }

    fn name(&self) -> &str {
        "Runner"
    }

    fn run(&self, turn: Turn<'_>) -> Result<Option<Move>, BotError> {
        let world = turn.world;
        let (x, y) = (turn.me.position.x(), turn.me.position.y());

        let level = world.is_solid(x + 1, y - 1) && !world.is_solid(x + 1, y);
        let step_down = world.is_solid(x + 1, y - 2) && !world.is_solid(x + 1, y);
        let step_up = !world.is_solid(x, y + 1) && !world.is_solid(x + 1, y + 1);
        if level || step_down || step_up {
            return Ok(Some(right()));
        }

        let target = if world.is_solid(x, y + 1) {
            (x, y + 1)
        } else if world.is_solid(x + 1, y + 1) {
            (x + 1, y + 1)
        } else {
            (x, y - 1)
        };
        Ok(Some(dig(target.0, target.1)))
    }
}
