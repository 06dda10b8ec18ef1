use delve_controller::{Bot, CreatureView, Turn};
use delve_core::{bite_by_creature, left, right, BotError, Move};

/// Chases the nearest creature and bites it once adjacent.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hunter;

impl Bot for Hunter {
    fn id(&self) -> &str {
        "hunter"
    }

    fn name(&self) -> &str {
        "Simple Hunter"
    }

    fn run(&self, turn: Turn<'_>) -> Result<Option<Move>, BotError> {
        let me = turn.me.position;
        let offset = |other: &CreatureView| {
            let dx = turn.world.wrapping_x_offset(me.x(), other.position.x());
            (dx, other.position.y() - me.y())
        };
        let squared = |(dx, dy): (i64, i64)| dx * dx + dy * dy;

        let Some(target) = turn
            .others
            .iter()
            .min_by_key(|&other| squared(offset(other)))
        else {
            return Ok(None);
        };

        let (dx, dy) = offset(target);
        if squared((dx, dy)) < 4 {
            return Ok(Some(bite_by_creature(target.id)));
        }
        Ok(Some(if dx > 0 { right() } else { left() }))
    }
}
