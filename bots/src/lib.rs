#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sample bots written purely against the controller's bot contract.
//!
//! Each bot is deliberately simple and has known weaknesses; they exist to
//! populate matches, to exercise the engine end to end, and as a starting
//! point for writing stronger bots. Shared one-move tactics live in
//! [`routines`].

mod burrower;
mod hunter;
mod runner;
mod sheep;

pub mod routines;

use std::rc::Rc;

use delve_controller::Bot;

pub use burrower::Burrower;
pub use hunter::Hunter;
pub use runner::Runner;
pub use sheep::Sheep;

/// Every sample bot, in a stable order.
#[must_use]
pub fn sample_bots() -> Vec<Rc<dyn Bot>> {
    vec![
        Rc::new(Runner),
        Rc::new(Sheep),
        Rc::new(Hunter),
        Rc::new(Burrower),
    ]
}

/// Looks up a sample bot by its identifier.
#[must_use]
pub fn by_id(id: &str) -> Option<Rc<dyn Bot>> {
    sample_bots().into_iter().find(|bot| bot.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_ids_are_unique_and_resolvable() {
        let roster = sample_bots();
        let ids: Vec<&str> = roster.iter().map(|bot| bot.id()).collect();
        assert_eq!(ids, ["runner", "sheep", "hunter", "burrower"]);
        for id in ids {
            assert_eq!(by_id(id).map(|bot| bot.id().to_owned()), Some(id.to_owned()));
        }
        assert!(by_id("wolf").is_none());
    }

    #[test]
    fn names_are_human_readable() {
        let names: Vec<String> = sample_bots().iter().map(|bot| bot.name().to_owned()).collect();
        assert_eq!(names, ["Runner", "Sheep", "Simple Hunter", "Burrower"]);
    }
}
