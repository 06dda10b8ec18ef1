//! Reusable single-move tactics that bots can chain together.
//!
//! Every routine inspects the creature's immediate 3×3 neighbourhood and
//! returns a move only when that move would be accepted by the controller.

use delve_controller::Turn;
use delve_core::{bite_by_creature, eat, Cell, Move, Position};

/// Scan order over the neighbourhood: top row first, left to right.
const NEIGHBOURHOOD: [(i64, i64); 9] = [
    (-1, 1),
    (0, 1),
    (1, 1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Bites the first other creature standing in a reachable neighbouring cell.
#[must_use]
pub fn bite_nearby(turn: &Turn<'_>) -> Option<Move> {
    let me = turn.me.position;
    turn.others
        .iter()
        .find(|other| {
            let offset = turn.world.wrapping_x_offset(me.x(), other.position.x());
            offset.abs() <= 1
                && (other.position.y() - me.y()).abs() <= 1
                && turn.world.is_reachable_from(me, other.position)
        })
        .map(|other| bite_by_creature(other.id))
}

/// Eats the first reachable grass tuft or grassy dirt nearby.
#[must_use]
pub fn eat_grass_nearby(turn: &Turn<'_>) -> Option<Move> {
    eat_nearby(turn, is_grass)
}

/// Eats the first reachable moss nearby.
#[must_use]
pub fn eat_moss_nearby(turn: &Turn<'_>) -> Option<Move> {
    eat_nearby(turn, is_moss)
}

pub(crate) fn is_grass(cell: Cell) -> bool {
    matches!(
        cell,
        Cell::SmallGrassTufts | Cell::LargeGrassTufts | Cell::GrassyDirt
    )
}

pub(crate) fn is_moss(cell: Cell) -> bool {
    matches!(
        cell,
        Cell::MossyStone | Cell::MossyChippedStone | Cell::MossyBedrock
    )
}

fn eat_nearby(turn: &Turn<'_>, wanted: fn(Cell) -> bool) -> Option<Move> {
    let me = turn.me.position;
    NEIGHBOURHOOD.iter().find_map(|&(dx, dy)| {
        let target: Position = me.offset(dx, dy);
        let cell = turn.world.cell_at(target);
        (wanted(cell) && turn.world.is_reachable_from(me, target))
            .then(|| eat(target.x(), target.y()))
    })
}
