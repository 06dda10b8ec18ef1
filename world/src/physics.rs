//! Adjacency and pure movement queries shared by the controller and bots.

use delve_core::Position;

use crate::World;

/// Outcome of simulating a movement without mutating the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulatedStep {
    /// Position the creature would occupy after the move.
    pub position: Position,
    /// Whether the creature would begin falling from that position.
    pub falling: bool,
}

impl World {
    /// Reports whether a creature at `from` can interact with `to`.
    ///
    /// Identical cells and orthogonal neighbours are always reachable. A
    /// diagonal neighbour is reachable unless both corner cells between the
    /// two positions are solid.
    #[must_use]
    pub fn is_reachable_from(&self, from: Position, to: Position) -> bool {
        let (x1, y1) = (self.normalize_x(from.x()), from.y());
        let (x2, y2) = (self.normalize_x(to.x()), to.y());
        let vertical = (y1 - y2).abs();

        if x1 == x2 {
            return vertical <= 1;
        }
        if !self.is_x_adjacent(x1, x2) {
            return false;
        }
        match vertical {
            0 => true,
            1 => !self.is_solid(x1, y2) || !self.is_solid(x2, y1),
            _ => false,
        }
    }

    /// Reports whether a creature standing at `pos` would start falling.
    #[must_use]
    pub fn will_fall(&self, pos: Position) -> bool {
        let (x, y) = (pos.x(), pos.y());
        !self.is_solid(x, y - 1) && !(self.is_solid(x - 1, y) && self.is_solid(x + 1, y))
    }

    /// Simulates a step to the left from `pos`.
    #[must_use]
    pub fn simulate_left(&self, pos: Position) -> Option<SimulatedStep> {
        self.simulate_horizontal(pos, -1)
    }

    /// Simulates a step to the right from `pos`.
    #[must_use]
    pub fn simulate_right(&self, pos: Position) -> Option<SimulatedStep> {
        self.simulate_horizontal(pos, 1)
    }

    /// Simulates climbing one cell up from `pos`.
    ///
    /// Climbing needs an open cell above braced by solid cells on both sides.
    #[must_use]
    pub fn simulate_climb_up(&self, pos: Position) -> Option<SimulatedStep> {
        let (x, y) = (pos.x(), pos.y());
        let braced = self.is_solid(x - 1, y + 1) && self.is_solid(x + 1, y + 1);
        (!self.is_solid(x, y + 1) && braced).then(|| SimulatedStep {
            position: self.normalize(pos.above()),
            falling: false,
        })
    }

    /// Simulates climbing one cell down from `pos`.
    ///
    /// Climbing needs an open cell below braced by solid cells on both sides.
    #[must_use]
    pub fn simulate_climb_down(&self, pos: Position) -> Option<SimulatedStep> {
        let (x, y) = (pos.x(), pos.y());
        let braced = self.is_solid(x - 1, y - 1) && self.is_solid(x + 1, y - 1);
        (!self.is_solid(x, y - 1) && braced).then(|| {
            let position = self.normalize(pos.below());
            SimulatedStep {
                position,
                falling: self.will_fall(position),
            }
        })
    }

    fn simulate_horizontal(&self, pos: Position, dx: i64) -> Option<SimulatedStep> {
        let (x, y) = (pos.x(), pos.y());
        let next_x = self.normalize_x(x + dx);

        if !self.is_solid(next_x, y) {
            if !self.is_solid(next_x, y - 1) {
                let position = Position::new(next_x, y - 1);
                return Some(SimulatedStep {
                    position,
                    falling: self.will_fall(position),
                });
            }
            return Some(SimulatedStep {
                position: Position::new(next_x, y),
                falling: false,
            });
        }

        if !self.is_solid(x, y + 1) && !self.is_solid(next_x, y + 1) {
            return Some(SimulatedStep {
                position: Position::new(next_x, y + 1),
                falling: false,
            });
        }

        None
    }
}
