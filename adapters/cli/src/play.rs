//! Interactive play: the operator drives creature 0 from stdin.
//!
//! Each input line is one move, either as the JSON wire form
//! (`{"type":"dig","pos":{"x":3,"y":41}}`) or as shorthand words
//! (`dig 3 41`, `bite 5`, `left`). A blank line idles for a tick.

use std::{
    io::{self, BufRead},
    rc::Rc,
    thread,
};

use anyhow::{bail, Context, Result};
use delve_controller::{Bot, Controller, HumanInput, SandboxConfig};
use delve_core::{CreatureId, Move, MoveRequest, RawPosition};
use tracing::{debug, warn};

use crate::frame;

/// Runs an interactive match until the operator's creature dies or stdin closes.
pub(crate) fn run(
    config: &SandboxConfig,
    bots: &[Rc<dyn Bot>],
    copies: usize,
    debug: bool,
    safe: bool,
) -> Result<()> {
    let (mut controller, input) = Controller::build_interactive(config, bots, copies, debug, safe)
        .context("failed to build the match")?;
    let human = CreatureId::new(0);
    if controller.creature(human).is_none() {
        bail!("no creature was spawned for the operator");
    }

    eprintln!("you are @; enter one move per line (left, right, climb_up, climb_down, dig X Y, pick_up X Y, drop X Y, eat X Y, bite ID, bite X Y)");
    let reader = thread::spawn(move || forward(io::stdin().lock(), &input));

    loop {
        print!("{}", frame::render(&controller));
        let report = controller.tick();
        for death in &report.deaths {
            println!("{}", frame::obituary(report.tick, death));
        }
        if controller.creature(human).is_none() {
            println!("your creature died after {} ticks", controller.tick_count());
            break;
        }
        if reader.is_finished() && !report.human_move_accepted {
            break;
        }
    }
    Ok(())
}

/// Forwards every parsed line to the controller until input or the
/// controller goes away. Unparseable lines idle for a tick.
fn forward<R: BufRead>(reader: R, input: &HumanInput) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!(%error, "failed to read operator input");
                break;
            }
        };
        let action = parse_line(&line).unwrap_or_else(|error| {
            warn!(%error, line = line.as_str(), "unreadable move, idling");
            None
        });
        if input.submit(action).is_err() {
            debug!("controller stopped listening");
            break;
        }
    }
}

fn parse_line(line: &str) -> Result<Option<Move>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let request = if line.starts_with('{') {
        serde_json::from_str::<MoveRequest>(line).context("malformed JSON move")?
    } else {
        shorthand(line)?
    };
    Ok(Some(Move::try_from(request)?))
}

fn shorthand(line: &str) -> Result<MoveRequest> {
    let mut words = line.split_whitespace();
    let kind = words.next().unwrap_or_default().to_owned();
    let numbers = words
        .map(|word| {
            word.parse::<f64>()
                .with_context(|| format!("`{word}` is not a number"))
        })
        .collect::<Result<Vec<f64>>>()?;

    let (pos, victim) = match numbers[..] {
        [] => (None, None),
        [victim] => (None, Some(victim)),
        [x, y] => (Some(RawPosition { x, y }), None),
        _ => bail!("expected at most two numbers"),
    };
    Ok(MoveRequest { kind, pos, victim })
}
