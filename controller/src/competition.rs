//! Headless bot-versus-bot matches.

use std::{collections::BTreeSet, rc::Rc};

use serde::Serialize;
use tracing::info;

use crate::{Bot, ConfigError, Controller, SandboxConfig};

/// Result of a finished competition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompetitionOutcome {
    /// Identifier of the winning bot, or `None` when the tick limit was hit
    /// with several bots still alive.
    pub winner: Option<String>,
    /// Ticks resolved before the match ended.
    pub ticks: u64,
}

/// Builds a match from `config` and runs it to completion.
pub fn run_competition(
    config: &SandboxConfig,
    bots: &[Rc<dyn Bot>],
    copies: usize,
    debug: bool,
) -> Result<CompetitionOutcome, ConfigError> {
    let mut controller = Controller::build(config, bots, copies, debug)?;
    Ok(controller.compete(config.max_ticks))
}

impl Controller {
    /// Distinct identifiers of the bots driving live creatures.
    #[must_use]
    pub fn surviving_bots(&self) -> BTreeSet<&str> {
        self.creatures()
            .iter()
            .map(|creature| creature.bot_id())
            .collect()
    }

    /// Ticks until at most one bot has live creatures, or `max_ticks` is hit.
    ///
    /// When the last creatures all die in the same tick, the bot driving
    /// the first creature alive before that tick wins.
    pub fn compete(&mut self, max_ticks: Option<u64>) -> CompetitionOutcome {
        let mut leader = self.leading_bot();
        while self.surviving_bots().len() > 1 {
            if max_ticks.is_some_and(|max| self.tick_count() >= max) {
                info!(ticks = self.tick_count(), "competition hit the tick limit");
                return CompetitionOutcome {
                    winner: None,
                    ticks: self.tick_count(),
                };
            }
            leader = self.leading_bot();
            let _ = self.tick();
        }

        let winner = self.leading_bot().or(leader);
        info!(
            winner = winner.as_deref().unwrap_or("none"),
            ticks = self.tick_count(),
            "competition finished"
        );
        CompetitionOutcome {
            winner,
            ticks: self.tick_count(),
        }
    }

    fn leading_bot(&self) -> Option<String> {
        self.creatures()
            .first()
            .map(|creature| creature.bot_id().to_owned())
    }
}
