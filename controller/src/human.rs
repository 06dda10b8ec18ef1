//! Channel through which a human operator resolves moves.

use std::sync::mpsc::{self, Sender};

use delve_core::Move;
use thiserror::Error;

use crate::creature::HumanLink;

/// Sending half of a human operator's move channel.
///
/// The controller blocks inside [`Controller::tick`](crate::Controller::tick)
/// until a move arrives for the human creature. Send `None` to idle for a
/// tick. Dropping every handle makes the creature idle from then on.
#[derive(Clone, Debug)]
pub struct HumanInput {
    moves: Sender<Option<Move>>,
}

impl HumanInput {
    /// Submits the next move.
    pub fn submit(&self, action: Option<Move>) -> Result<(), HumanDisconnected> {
        self.moves.send(action).map_err(|_| HumanDisconnected)
    }
}

/// The controller that owned the human creature has been dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("the human-controlled creature is no longer listening")]
pub struct HumanDisconnected;

pub(crate) fn channel(safe: bool) -> (HumanInput, HumanLink) {
    let (moves, receiver) = mpsc::channel();
    (
        HumanInput { moves },
        HumanLink {
            moves: receiver,
            safe,
        },
    )
}
