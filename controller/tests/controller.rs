use std::{
    collections::{hash_map::DefaultHasher, BTreeMap},
    hash::{Hash, Hasher},
    rc::Rc,
};

use delve_controller::{Bot, ConfigError, Controller, SandboxConfig, Turn, HUMAN_BOT_ID};
use delve_core::{dig, left, right, BotError, CreatureId, Move};

/// Walks back and forth, digging whenever it gets stuck.
struct Wanderer;

impl Bot for Wanderer {
    fn id(&self) -> &str {
        "wanderer"
    }

    fn run(&self, turn: Turn<'_>) -> Result<Option<Move>, BotError> {
        let steps = turn
            .scratch
            .get("steps")
            .and_then(|value| value.as_u64())
            .unwrap_or(0);
        let _ = turn.scratch.insert("steps".to_owned(), (steps + 1).into());

        let pos = turn.me.position;
        let action = match steps % 7 {
            0..=2 => right(),
            3 => dig(pos.x() + 1, pos.y()),
            4 | 5 => left(),
            _ => dig(pos.x(), pos.y() - 1),
        };
        Ok(Some(action))
    }
}

struct Idle(&'static str);

impl Bot for Idle {
    fn id(&self) -> &str {
        self.0
    }

    fn run(&self, _turn: Turn<'_>) -> Result<Option<Move>, BotError> {
        Ok(None)
    }
}

fn small_config(seed: u64) -> SandboxConfig {
    SandboxConfig {
        seed,
        width: 48,
        ..SandboxConfig::default()
    }
}

fn fingerprint(controller: &Controller) -> u64 {
    let mut hasher = DefaultHasher::new();
    for creature in controller.creatures() {
        creature.id().hash(&mut hasher);
        creature.position().hash(&mut hasher);
        creature.hp().hash(&mut hasher);
        creature.fullness().hash(&mut hasher);
        creature.is_carrying_rock().hash(&mut hasher);
    }
    for entry in controller.dead() {
        entry.creature.id().hash(&mut hasher);
        entry.died_tick.hash(&mut hasher);
    }
    for row in delve_world::query::rows(controller.world()) {
        row.hash(&mut hasher);
    }
    hasher.finish()
}

fn replay(seed: u64, ticks: usize) -> u64 {
    let bots: Vec<Rc<dyn Bot>> = vec![Rc::new(Wanderer), Rc::new(Idle("idle"))];
    let mut controller = Controller::build(&small_config(seed), &bots, 3, true).expect("valid");
    for _ in 0..ticks {
        let _ = controller.tick();
    }
    fingerprint(&controller)
}

#[test]
fn deterministic_replay_produces_identical_state() {
    assert_eq!(replay(0x4d59_5df4_d0f3_3173, 60), replay(0x4d59_5df4_d0f3_3173, 60));
    assert_ne!(replay(1, 60), replay(2, 60));
}

#[test]
fn build_spawns_every_copy_sorted_by_id() {
    let bots: Vec<Rc<dyn Bot>> = vec![
        Rc::new(Idle("a")),
        Rc::new(Idle("b")),
        Rc::new(Idle("c")),
    ];
    let controller = Controller::build(&small_config(9), &bots, 4, false).expect("valid");

    let ids: Vec<u32> = controller.creatures().iter().map(|c| c.id().get()).collect();
    assert_eq!(ids, (0..12).collect::<Vec<_>>());

    let mut per_bot = BTreeMap::new();
    for creature in controller.creatures() {
        *per_bot.entry(creature.bot_id().to_owned()).or_insert(0) += 1;
        assert_eq!(creature.hp(), 18);
        assert_eq!(creature.fullness(), 180);
        let pos = creature.position();
        assert!(controller.world().is_solid(pos.x(), pos.y() - 1));
        assert!(!controller.world().is_solid(pos.x(), pos.y()));
    }
    assert_eq!(per_bot.values().copied().collect::<Vec<_>>(), vec![4, 4, 4]);
    assert_eq!(controller.tick_count(), 0);
}

#[test]
fn build_rejects_empty_rosters() {
    let bots: Vec<Rc<dyn Bot>> = vec![Rc::new(Idle("a"))];
    assert!(matches!(
        Controller::build(&small_config(1), &[], 2, false),
        Err(ConfigError::NoBots)
    ));
    assert!(matches!(
        Controller::build(&small_config(1), &bots, 0, false),
        Err(ConfigError::ZeroCopies)
    ));
}

#[test]
fn ticks_advance_the_counter_and_timing_history() {
    let bots: Vec<Rc<dyn Bot>> = vec![Rc::new(Idle("a"))];
    let mut controller = Controller::build(&small_config(3), &bots, 2, false).expect("valid");
    for expected in 0..5 {
        let report = controller.tick();
        assert_eq!(report.tick, expected);
    }
    assert_eq!(controller.tick_count(), 5);
    assert_eq!(controller.timings().len(), 5);
}

#[test]
fn interactive_build_binds_creature_zero() {
    let bots: Vec<Rc<dyn Bot>> = vec![Rc::new(Idle("a"))];
    let (mut controller, input) =
        Controller::build_interactive(&small_config(5), &bots, 3, false, false).expect("valid");

    let human = controller
        .creature(CreatureId::new(0))
        .expect("creature zero exists");
    assert!(human.is_human());
    assert_eq!(human.bot_id(), HUMAN_BOT_ID);
    assert_eq!(
        controller.creatures().iter().filter(|c| c.is_human()).count(),
        1
    );

    input.submit(Some(left())).expect("listening");
    let report = controller.tick();
    assert!(report.human_move_accepted);
}

#[test]
fn competition_with_one_bot_ends_immediately() {
    let bots: Vec<Rc<dyn Bot>> = vec![Rc::new(Idle("solo"))];
    let outcome =
        delve_controller::run_competition(&small_config(4), &bots, 3, false).expect("valid");
    assert_eq!(outcome.winner.as_deref(), Some("solo"));
    assert_eq!(outcome.ticks, 0);
}

#[test]
fn competition_respects_the_tick_limit() {
    let bots: Vec<Rc<dyn Bot>> = vec![Rc::new(Idle("a")), Rc::new(Idle("b"))];
    let config = SandboxConfig {
        max_ticks: Some(3),
        ..small_config(4)
    };
    let outcome = delve_controller::run_competition(&config, &bots, 1, false).expect("valid");
    assert_eq!(outcome.winner, None);
    assert_eq!(outcome.ticks, 3);
}
