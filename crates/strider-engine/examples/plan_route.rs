//! Headless route planning demo -- plan a path across a small level and play it
//! back through the tick loop.
//!
//! Run with:
//!   cargo run --example plan_route -p strider-engine
//!   cargo run --example plan_route -p strider-engine -- 420 88
//!
//! The optional arguments are the target x and y. Set `RUST_LOG=info` to see
//! planner progress.

use strider_core::prelude::*;
use strider_engine::prelude::*;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

const LEVEL: &str = r#"[
    { "kind": "wall",       "name": "floor",    "rect": { "x": -200, "y": -64, "width": 800, "height": 48 } },
    { "kind": "spike",      "name": "pit",      "rect": { "x": 120,  "y": -16, "width": 48,  "height": 10 } },
    { "kind": "wall",       "name": "step",     "rect": { "x": 240,  "y": -16, "width": 80,  "height": 40 } },
    { "kind": "wall",       "name": "shelf",    "rect": { "x": 360,  "y": 56,  "width": 120, "height": 16 } },
    { "kind": "speed_zone", "name": "conveyor", "rect": { "x": 500,  "y": -16, "width": 60,  "height": 4 },
      "direction": "W" }
]"#;

fn parse_target() -> Result<Point, anyhow::Error> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(Point::new(420.0, 88.0)),
        [x, y] => Ok(Point::new(x.parse()?, y.parse()?)),
        _ => Err(anyhow::anyhow!("usage: plan_route [TARGET_X TARGET_Y]")),
    }
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let target = parse_target()?;

    let build = StaticWorld::from_json_str(LEVEL)?;
    for rejected in &build.rejected {
        println!(
            "skipped object #{} ({}): {}",
            rejected.index,
            rejected.name.as_deref().unwrap_or("unnamed"),
            rejected.error
        );
    }

    let config = EngineConfig::from_json_str(
        r#"{ "extend_deadly_hitbox": 2, "search": { "timeout": 10 } }"#,
    )?;
    let mut sim = Simulation::new(build.world, ActorState::grounded(0.0, 0.0), config);

    let ticks = sim.plan_to(target)?;
    let route: Vec<String> = sim
        .queued_steps()
        .map(|s| {
            if s.run {
                format!("{}*", s.mv.token())
            } else {
                s.mv.token().to_owned()
            }
        })
        .collect();
    println!("planned {ticks} ticks to ({}, {})", target.x, target.y);
    println!("route: {}", route.join(" "));

    let mut recorder = Recorder::start(&sim);
    while sim.queue_len() > 0 {
        let state = recorder.tick(&mut sim, &TickInput::idle());
        if state.is_dead() {
            return Err(anyhow::anyhow!("actor died at tick {}", sim.tick_count()));
        }
    }

    let end = *sim.actor();
    println!(
        "arrived at ({:.2}, {:.2}) after {:.3}s of simulated time",
        end.x,
        end.y,
        sim.sim_time()
    );

    let recording = recorder.finish();
    let report = replay(&mut sim, &recording)?;
    println!(
        "replay: {} ticks, {}",
        report.ticks_replayed,
        if report.is_faithful() { "deterministic" } else { "DIVERGED" }
    );
    Ok(())
}
