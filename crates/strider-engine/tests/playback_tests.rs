//! Integration tests for route playback, recorded runs and client validation.
//!
//! These drive [`Simulation`] end to end: plans are queued and played, runs
//! are recorded and replayed from snapshots, and an honest or tampered client
//! is fed through [`Simulation::tick_observed`].

use strider_core::prelude::*;
use strider_engine::prelude::*;

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

const LEVEL_JSON: &str = r#"[
    { "kind": "wall",  "name": "floor", "rect": { "x": -400, "y": -64, "width": 1200, "height": 48 } },
    { "kind": "wall",  "name": "ledge", "rect": { "x": 200,  "y": -16, "width": 120,  "height": 40 } },
    { "kind": "spike", "name": "pit",   "rect": { "x": 100,  "y": -16, "width": 40,   "height": 8 } },
    { "kind": "cloud", "name": "decor", "rect": { "x": 0,    "y": 200, "width": 10,   "height": 10 } }
]"#;

fn level() -> StaticWorld {
    let build = StaticWorld::from_json_str(LEVEL_JSON).unwrap();
    assert_eq!(build.rejected.len(), 1);
    assert_eq!(build.rejected[0].name.as_deref(), Some("decor"));
    build.world
}

fn flat() -> StaticWorld {
    StaticWorld::new(vec![StaticObject::wall(
        Polygon::rect(-1000.0, -64.0, 1000.0, -16.0).unwrap(),
    )])
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

#[test]
fn planned_route_reaches_ledge_without_dying() {
    let mut sim = Simulation::new(level(), ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let target = Point::new(260.0, 40.0);
    let ticks = sim.plan_to(target).unwrap();
    assert!(ticks > 0);

    for _ in 0..ticks {
        let state = sim.tick(&TickInput::idle());
        assert!(!state.is_dead(), "died at tick {}", sim.tick_count());
    }
    assert!(sim.actor().within(target, 16.0));
}

#[test]
fn planned_route_keeps_extended_margin() {
    let config = EngineConfig {
        extend_deadly_hitbox: 6.0,
        ..Default::default()
    };
    let mut sim = Simulation::new(level(), ActorState::grounded(0.0, 0.0), config);
    let ticks = sim.plan_to(Point::new(260.0, 40.0)).unwrap();

    let margin_world = sim.search_world().clone();
    for _ in 0..ticks {
        sim.tick(&TickInput::idle());
        assert!(margin_world.hazard_touching(&sim.actor().hitbox()).is_none());
    }
}

#[test]
fn macro_playback_matches_live_keys() {
    let mut scripted = Simulation::new(flat(), ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let mut live = Simulation::new(flat(), ActorState::grounded(0.0, 0.0), EngineConfig::default());

    scripted.enqueue_macro("WD* D* D* N A");
    let keys = [
        TickInput::pressing(&[Key::Up, Key::Right]).with_run(true),
        TickInput::pressing(&[Key::Right]).with_run(true),
        TickInput::pressing(&[Key::Right]).with_run(true),
        TickInput::idle(),
        TickInput::pressing(&[Key::Left]),
    ];
    for input in &keys {
        scripted.tick(&TickInput::idle());
        live.tick(input);
    }
    assert_eq!(scripted.actor(), live.actor());
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

#[test]
fn replay_of_planned_route_is_exact() {
    let mut sim = Simulation::new(level(), ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let ticks = sim.plan_to(Point::new(260.0, 40.0)).unwrap();

    let mut recorder = Recorder::start(&sim);
    for _ in 0..ticks {
        recorder.tick(&mut sim, &TickInput::idle());
    }
    let recording = recorder.finish();
    let end = *sim.actor();

    let json = serde_json::to_string_pretty(&recording).unwrap();
    let recording: Recording = serde_json::from_str(&json).unwrap();

    let mut fresh = Simulation::new(level(), ActorState::grounded(-300.0, 0.0), EngineConfig::default());
    let report = replay(&mut fresh, &recording).unwrap();
    assert!(report.is_faithful());
    assert_eq!(report.ticks_replayed, ticks as u64);
    assert_eq!(*fresh.actor(), end);
    assert_eq!(fresh.queue_len(), 0);
}

#[test]
fn replay_in_a_different_world_diverges() {
    let mut sim = Simulation::new(flat(), ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let mut recorder = Recorder::start(&sim);
    for _ in 0..30 {
        recorder.tick(&mut sim, &TickInput::pressing(&[Key::Right]).with_run(true));
    }
    let recording = recorder.finish();

    let walled = StaticWorld::new(vec![
        StaticObject::wall(Polygon::rect(-1000.0, -64.0, 1000.0, -16.0).unwrap()),
        StaticObject::wall(Polygon::rect(40.0, -16.0, 80.0, 200.0).unwrap()),
    ]);
    let mut other = Simulation::new(walled, ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let report = replay(&mut other, &recording).unwrap();
    assert!(!report.is_faithful());
    let divergence = report.divergence.unwrap();
    assert!(divergence.report.diffs.iter().any(|d| d.field == Field::X));
    assert!(divergence.tick < 30);
    assert_eq!(report.ticks_replayed, divergence.tick + 1);
}

// ---------------------------------------------------------------------------
// Client validation
// ---------------------------------------------------------------------------

#[test]
fn desync_is_detected_and_resynced_from_client() {
    let mut client = Simulation::new(flat(), ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let mut server = Simulation::new(flat(), ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let input = TickInput::pressing(&[Key::Right]);

    for _ in 0..10 {
        let observed = client.tick(&input);
        assert!(server.tick_observed(&input, &observed).unwrap().matches);
    }

    // The client runs with a faster speed multiplier from here on.
    let mut fast = EngineConfig::default();
    fast.physics.speed_multiplier = 1.5;
    client.queue_settings(fast);
    let observed = client.tick(&input);
    let report = server.tick_observed(&input, &observed).unwrap().clone();
    assert!(!report.matches);
    assert!(report.diffs.iter().any(|d| d.field == Field::X));
    assert!(server.is_out_of_sync());
    assert_eq!(server.actor(), client.actor());
}

#[test]
fn config_overrides_drive_the_next_tick() {
    let mut sim = Simulation::new(flat(), ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let mut config = sim.config().clone();
    let applied = config
        .apply_overrides(&serde_json::json!({ "run_enabled": false, "unknown": 1 }))
        .unwrap();
    assert_eq!(applied, 1);
    sim.queue_settings(config);

    let walk = sim.tick(&TickInput::pressing(&[Key::Right]).with_run(true));
    let mut reference = Simulation::new(flat(), ActorState::grounded(0.0, 0.0), EngineConfig::default());
    let expected = reference.tick(&TickInput::pressing(&[Key::Right]));
    assert_eq!(walk, expected);
}
