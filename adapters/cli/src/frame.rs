//! Plain-text rendering of the sandbox.

use std::fmt::Write as _;

use delve_controller::{Controller, Creature, Death};
use delve_core::{BgCell, Cell};
use delve_world::World;

/// Rows of sky kept above the highest solid cell.
const SKY_MARGIN: i64 = 2;

/// Renders the world top-down with creatures drawn over the terrain.
///
/// The human creature is drawn as `@`; bot-driven creatures use the first
/// letter of their bot's identifier.
pub(crate) fn render(controller: &Controller) -> String {
    let world = controller.world();
    let creatures = controller.creatures();
    let width = i64::from(world.width());
    let summit = (0..width)
        .map(|x| world.top_solid_y(x))
        .chain(creatures.iter().map(|creature| creature.position().y()))
        .max()
        .unwrap_or(0);

    let mut out = format!("-- tick {} --\n", controller.tick_count());
    for y in (0..=summit + SKY_MARGIN).rev() {
        for x in 0..width {
            let marker = creatures
                .iter()
                .find(|creature| creature_at(world, creature, x, y))
                .map(marker);
            out.push(marker.unwrap_or_else(|| glyph(world, x, y)));
        }
        out.push('\n');
    }
    for creature in creatures {
        let _ = writeln!(
            out,
            "{} #{} hp {} fullness {}{}",
            marker(creature),
            creature.id().get(),
            creature.hp(),
            creature.fullness(),
            if creature.is_carrying_rock() { " (rock)" } else { "" }
        );
    }
    out
}

/// One-line description of a death.
pub(crate) fn obituary(tick: u64, death: &Death) -> String {
    format!(
        "tick {tick}: creature {} died of {} at ({}, {})",
        death.id.get(),
        death.cause,
        death.position.x(),
        death.position.y()
    )
}

fn creature_at(world: &World, creature: &Creature, x: i64, y: i64) -> bool {
    let pos = creature.position();
    world.normalize_x(pos.x()) == x && pos.y() == y
}

fn marker(creature: &Creature) -> char {
    if creature.is_human() {
        '@'
    } else {
        creature.bot_id().chars().next().unwrap_or('?')
    }
}

fn glyph(world: &World, x: i64, y: i64) -> char {
    match world.cell(x, y) {
        Cell::Empty => match world.bg_cell(x, y) {
            BgCell::Sky => ' ',
            BgCell::Dirt | BgCell::Stone | BgCell::Bedrock => '.',
        },
        Cell::SmallGrassTufts => ',',
        Cell::LargeGrassTufts => '"',
        Cell::GrassyDirt => '=',
        Cell::BarrenDirt => '-',
        Cell::Dirt => '%',
        Cell::Rock { stage: 0 } => 'o',
        Cell::Rock { .. } => 'O',
        Cell::Stone => '#',
        Cell::MossyStone => '&',
        Cell::ChippedStone => '+',
        Cell::MossyChippedStone => '*',
        Cell::Bedrock => '_',
        Cell::MossyBedrock => '~',
    }
}
