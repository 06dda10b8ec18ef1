#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Delve matches headless, as an ASCII
//! replay, or with a human operator typing moves on stdin.

mod frame;
mod play;

use std::{path::PathBuf, rc::Rc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use delve_controller::{run_competition, Bot, Controller, SandboxConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Tick-based digging sandbox for competing bots.
#[derive(Debug, Parser)]
#[command(name = "delve", version, about)]
struct Cli {
    /// Tracing filter used when `RUST_LOG` is unset, e.g. `debug` or `delve_controller=trace`.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a headless match and report the winning bot.
    Compete {
        #[command(flatten)]
        setup: Setup,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run a match and print ASCII frames as it unfolds.
    Watch {
        #[command(flatten)]
        setup: Setup,
        /// Number of ticks to simulate.
        #[arg(long, default_value_t = 200)]
        ticks: u64,
        /// Print a frame every this many ticks.
        #[arg(long, default_value_t = 50)]
        every: u64,
    },
    /// Drive creature 0 yourself; one JSON move per line on stdin.
    Play {
        #[command(flatten)]
        setup: Setup,
        /// Discard moves that would make your creature fall or hurt itself.
        #[arg(long)]
        safe: bool,
    },
}

/// Options shared by every match-running subcommand.
#[derive(Debug, Args)]
struct Setup {
    /// TOML configuration file; defaults apply to anything it omits.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the configured seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Comma-separated sample bots to field.
    #[arg(long, value_delimiter = ',', default_value = "runner,sheep,hunter,burrower")]
    bots: Vec<String>,
    /// Override the configured tick limit of a competition.
    #[arg(long)]
    max_ticks: Option<u64>,
    /// Creatures spawned per bot.
    #[arg(long, default_value_t = 3)]
    copies: usize,
    /// Keep a log of each creature's recent moves.
    #[arg(long)]
    debug: bool,
}

impl Setup {
    fn config(&self) -> Result<SandboxConfig> {
        let mut config = match &self.config {
            Some(path) => SandboxConfig::load(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?,
            None => SandboxConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = Some(max_ticks);
        }
        Ok(config)
    }

    fn roster(&self) -> Result<Vec<Rc<dyn Bot>>> {
        self.bots
            .iter()
            .map(|id| match delve_bots::by_id(id.trim()) {
                Some(bot) => Ok(bot),
                None => bail!("unknown bot `{id}`"),
            })
            .collect()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Compete { setup, json } => compete(&setup, json),
        Command::Watch {
            setup,
            ticks,
            every,
        } => watch(&setup, ticks, every),
        Command::Play { setup, safe } => {
            let config = setup.config()?;
            play::run(&config, &setup.roster()?, setup.copies, setup.debug, safe)
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level `{level}`"))?,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

fn compete(setup: &Setup, json: bool) -> Result<()> {
    let config = setup.config()?;
    let outcome = run_competition(&config, &setup.roster()?, setup.copies, setup.debug)
        .context("failed to build the match")?;

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        match &outcome.winner {
            Some(winner) => println!("{winner} wins after {} ticks", outcome.ticks),
            None => println!("no winner after {} ticks", outcome.ticks),
        }
    }
    Ok(())
}

fn watch(setup: &Setup, ticks: u64, every: u64) -> Result<()> {
    let config = setup.config()?;
    let mut controller = Controller::build(&config, &setup.roster()?, setup.copies, setup.debug)
        .context("failed to build the match")?;
    let every = every.max(1);

    print!("{}", frame::render(&controller));
    for _ in 0..ticks {
        let report = controller.tick();
        for death in &report.deaths {
            println!("{}", frame::obituary(report.tick, death));
        }
        if controller.tick_count() % every == 0 {
            print!("{}", frame::render(&controller));
        }
        if controller.creatures().is_empty() {
            break;
        }
    }

    info!(
        ticks = controller.tick_count(),
        alive = controller.creatures().len(),
        dead = controller.dead().len(),
        "watch finished"
    );
    Ok(())
}
