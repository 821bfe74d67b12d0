//! The fixed-step transition function.
//!
//! [`step`] advances one [`ActorState`] by one tick. It is a pure function of
//! its arguments: gameplay, the planner and the validator all call it and must
//! agree bit for bit. Each tick runs these phases in order:
//!
//! 1. **Speed zones** take or return movement control and add push speed.
//! 2. **Input**: horizontal velocity from the held keys (walk or run), jump or
//!    vertical movement, push decay, push velocity along the facing.
//!    Environment-modifier multipliers apply if the actor overlaps one.
//! 3. **Integration**: position += velocity * tick, displacement rounded to
//!    [`DISPLACEMENT_DECIMALS`] places.
//! 4. **Hazards**: touching a hazard ends the tick immediately.
//! 5. **Collision**: horizontal contacts are resolved first, then the contact
//!    list is rebuilt and vertical contacts are resolved. Oblique contacts are
//!    ignored.
//! 6. **Gravity** (platformer only): an airborne actor loses
//!    [`GRAVITY`] (scaled by the active modifier) of vertical velocity.
//!
//! The horizontal-first order and the rescan between passes define how the
//! actor behaves at corners and must not be reordered.

use crate::actor::{ActorState, Direction};
use crate::geometry::{Bounds, Point};
use crate::hitbox::{minimum_penetration, PenetrationAxis, Shape, ACTOR_HALF_EXTENT};
use crate::moves::{MacroStep, Move};
use crate::settings::{
    GameMode, PhysicsSettings, DISPLACEMENT_DECIMALS, GRAVITY, JUMP_SPEED, PUSH_DECAY, PUSH_SPEED,
    RUN_MULTIPLIER, TICK_S, WALK_SPEED,
};
use crate::world::{EnvModifier, StaticWorld};

/// Extra gap left between the actor and a wall it was pushed out of.
pub const X_SNAP_CLEARANCE: f64 = 1.0;
/// Extra gap left between the actor and a floor or ceiling it was snapped to.
pub const Y_SNAP_CLEARANCE: f64 = 0.0;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Advance `state` by one tick with `mv` held (and `run` if set).
pub fn step(
    state: &ActorState,
    world: &StaticWorld,
    mv: Move,
    run: bool,
    settings: &PhysicsSettings,
) -> ActorState {
    let mut next = *state;
    next.hazard = None;

    apply_speed_zones(&mut next, world);

    let modifier = world.modifier_at(&next.hitbox()).copied();
    apply_input(&mut next, mv, run, settings, modifier.as_ref());
    integrate(&mut next);

    if let Some(kind) = world.hazard_touching(&next.hitbox()) {
        next.hazard = Some(kind);
        return next;
    }

    resolve_collisions(&mut next, world);

    if settings.mode == GameMode::Platformer && next.airborne {
        let scale = world.modifier_at(&next.hitbox()).map_or(1.0, |m| m.gravity);
        next.vy -= GRAVITY * scale;
    }

    next
}

/// Apply `steps` in order, returning every intermediate state (not including
/// `initial`). Stops early after a tick that touched a hazard.
pub fn rollout(
    initial: &ActorState,
    world: &StaticWorld,
    steps: &[MacroStep],
    settings: &PhysicsSettings,
) -> Vec<ActorState> {
    let mut states = Vec::with_capacity(steps.len());
    let mut current = *initial;
    for s in steps {
        current = step(&current, world, s.mv, s.run, settings);
        states.push(current);
        if current.hazard.is_some() {
            break;
        }
    }
    states
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

fn apply_speed_zones(state: &mut ActorState, world: &StaticWorld) {
    let already_pushing = state.can_control && state.push > 0.0;
    match world.speed_zone_at(&state.hitbox()) {
        Some(direction) => {
            state.can_control = false;
            state.facing = direction;
            if !already_pushing {
                state.push += PUSH_SPEED;
            }
        }
        None => state.can_control = true,
    }
}

fn horizontal_speed(run: bool, settings: &PhysicsSettings, modifier: Option<&EnvModifier>) -> f64 {
    let base = if run && settings.run_enabled {
        WALK_SPEED * RUN_MULTIPLIER * modifier.map_or(1.0, |m| m.run_speed)
    } else {
        WALK_SPEED * modifier.map_or(1.0, |m| m.walk_speed)
    };
    base * settings.speed_multiplier
}

fn apply_input(
    state: &mut ActorState,
    mv: Move,
    run: bool,
    settings: &PhysicsSettings,
    modifier: Option<&EnvModifier>,
) {
    state.vx = 0.0;
    if settings.mode == GameMode::Scroller {
        state.vy = 0.0;
    }

    if state.can_control {
        if mv.horizontal() > 0 {
            state.facing = Direction::E;
            state.vx = horizontal_speed(run, settings, modifier);
        }
        if mv.horizontal() < 0 {
            state.facing = Direction::W;
            state.vx = -horizontal_speed(run, settings, modifier);
        }
        if mv.vertical() > 0 {
            press_up(state, settings, modifier);
        }
        if mv.vertical() < 0 {
            state.facing = Direction::S;
            if settings.mode == GameMode::Scroller && state.airborne {
                state.vy = -WALK_SPEED * settings.speed_multiplier;
            }
        }

        state.push = (state.push - PUSH_DECAY).max(0.0);
    }

    if state.push > 0.0 {
        match state.facing {
            Direction::N => state.vy += state.push,
            Direction::S => state.vy -= state.push,
            Direction::E => state.vx += state.push,
            Direction::W => state.vx -= state.push,
        }
    }
}

fn press_up(state: &mut ActorState, settings: &PhysicsSettings, modifier: Option<&EnvModifier>) {
    state.facing = Direction::N;
    match settings.mode {
        GameMode::Platformer => {
            let can_jump = !state.airborne || modifier.is_some_and(|m| m.jump_override);
            if !can_jump {
                return;
            }
            state.vy =
                JUMP_SPEED * modifier.map_or(1.0, |m| m.jump_speed) * settings.jump_multiplier;
        }
        GameMode::Scroller => {
            state.vy = WALK_SPEED * settings.speed_multiplier;
        }
    }
    state.airborne = true;
}

fn round_displacement(velocity: f64) -> f64 {
    let scale = 10f64.powi(DISPLACEMENT_DECIMALS);
    (TICK_S * velocity * scale).round() / scale
}

fn integrate(state: &mut ActorState) {
    state.x += round_displacement(state.vx);
    state.y += round_displacement(state.vy);
}

// ---------------------------------------------------------------------------
// Collision resolution
// ---------------------------------------------------------------------------

struct Contact {
    bounds: Bounds,
    mpv: Point,
}

/// Wall contacts split into (horizontal, vertical). Oblique ones are dropped.
fn contacts(state: &ActorState, world: &StaticWorld) -> (Vec<Contact>, Vec<Contact>) {
    let hitbox = state.hitbox();
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for obj in world.walls_near(&hitbox.bounds()) {
        let Some(mpv) = minimum_penetration(obj.polygon(), &hitbox) else {
            continue;
        };
        let contact = Contact {
            bounds: obj.bounds(),
            mpv,
        };
        match PenetrationAxis::of(mpv) {
            PenetrationAxis::Horizontal => horizontal.push(contact),
            PenetrationAxis::Vertical => vertical.push(contact),
            PenetrationAxis::Oblique => {}
        }
    }

    (horizontal, vertical)
}

fn resolve_collisions(state: &mut ActorState, world: &StaticWorld) {
    let (horizontal, vertical) = contacts(state, world);
    if horizontal.is_empty() && vertical.is_empty() {
        state.airborne = true;
        return;
    }

    for c in &horizontal {
        align_x(state, &c.bounds, c.mpv.x);
    }

    let (_, vertical) = contacts(state, world);
    for c in &vertical {
        align_y(state, &c.bounds, c.mpv.y);
    }
}

fn align_x(state: &mut ActorState, obstacle: &Bounds, mpv_x: f64) {
    state.vx = 0.0;
    state.airborne = true;
    if mpv_x > 0.0 {
        state.x = obstacle.left - ACTOR_HALF_EXTENT - X_SNAP_CLEARANCE;
    } else {
        state.x = obstacle.right + ACTOR_HALF_EXTENT + X_SNAP_CLEARANCE;
    }
}

fn align_y(state: &mut ActorState, obstacle: &Bounds, mpv_y: f64) {
    state.vy = 0.0;
    if mpv_y < 0.0 {
        state.y = obstacle.top + ACTOR_HALF_EXTENT + Y_SNAP_CLEARANCE;
        state.airborne = false;
    } else {
        state.y = obstacle.bottom - ACTOR_HALF_EXTENT - Y_SNAP_CLEARANCE;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::world::{HazardKind, StaticObject};

    fn flat_ground() -> StaticWorld {
        StaticWorld::new(vec![StaticObject::wall(
            Polygon::rect(-1000.0, -64.0, 1000.0, -16.0).unwrap(),
        )])
    }

    #[test]
    fn standing_still_stays_put() {
        let world = flat_ground();
        let s = ActorState::grounded(0.0, 0.0);
        let next = step(&s, &world, Move::N, false, &PhysicsSettings::default());
        assert_eq!((next.x, next.y, next.vx, next.vy), (0.0, 0.0, 0.0, 0.0));
        assert!(!next.airborne);
    }

    #[test]
    fn running_right_covers_four_units_per_tick() {
        let world = flat_ground();
        let s = ActorState::grounded(0.0, 0.0);
        let next = step(&s, &world, Move::D, true, &PhysicsSettings::default());
        assert_eq!(next.x, 4.0);
        assert_eq!(next.vx, 240.0);
        assert_eq!(next.facing, Direction::E);
        assert!(!next.airborne);
    }

    #[test]
    fn walking_left_is_slower_than_running() {
        let world = flat_ground();
        let s = ActorState::grounded(0.0, 0.0);
        let walk = step(&s, &world, Move::A, false, &PhysicsSettings::default());
        let run = step(&s, &world, Move::A, true, &PhysicsSettings::default());
        assert!(walk.x < 0.0 && run.x < walk.x);
        assert_eq!(walk.facing, Direction::W);
    }

    #[test]
    fn run_disabled_ignores_shift() {
        let world = flat_ground();
        let s = ActorState::grounded(0.0, 0.0);
        let settings = PhysicsSettings {
            run_enabled: false,
            ..Default::default()
        };
        let a = step(&s, &world, Move::D, true, &settings);
        let b = step(&s, &world, Move::D, false, &settings);
        assert_eq!(a, b);
    }

    #[test]
    fn jump_leaves_ground_and_gravity_applies() {
        let world = flat_ground();
        let s = ActorState::grounded(0.0, 0.0);
        let next = step(&s, &world, Move::W, false, &PhysicsSettings::default());
        assert!(next.airborne);
        assert!(next.y > 0.0);
        assert_eq!(next.vy, JUMP_SPEED - GRAVITY);
    }

    #[test]
    fn cannot_jump_while_airborne() {
        let world = StaticWorld::default();
        let s = ActorState {
            vy: -30.0,
            ..ActorState::falling(0.0, 100.0)
        };
        let next = step(&s, &world, Move::W, false, &PhysicsSettings::default());
        assert_eq!(next.vy, -30.0 - GRAVITY);
        assert_eq!(next.facing, Direction::N);
    }

    #[test]
    fn jump_override_allows_air_jump() {
        let world = StaticWorld::new(vec![StaticObject::modifier(
            Polygon::rect(-100.0, 0.0, 100.0, 200.0).unwrap(),
            EnvModifier {
                jump_override: true,
                gravity: 0.5,
                ..Default::default()
            },
        )]);
        let s = ActorState::falling(0.0, 100.0);
        let next = step(&s, &world, Move::W, false, &PhysicsSettings::default());
        assert_eq!(next.vy, JUMP_SPEED - GRAVITY * 0.5);
    }

    #[test]
    fn falling_actor_lands_on_surface_top() {
        let world = flat_ground();
        let s = ActorState {
            vy: -120.0,
            ..ActorState::falling(0.0, 1.0)
        };
        // Displacement -2 puts the bottom at -17, one unit into the ground.
        let next = step(&s, &world, Move::N, false, &PhysicsSettings::default());
        assert_eq!(next.y, 0.0);
        assert_eq!(next.vy, 0.0);
        assert!(!next.airborne);
    }

    #[test]
    fn head_bump_snaps_beneath_ceiling() {
        let world = StaticWorld::new(vec![StaticObject::wall(
            Polygon::rect(-100.0, 20.0, 100.0, 60.0).unwrap(),
        )]);
        let s = ActorState {
            vy: 300.0,
            ..ActorState::falling(0.0, 0.0)
        };
        let next = step(&s, &world, Move::N, false, &PhysicsSettings::default());
        assert_eq!(next.y, 20.0 - ACTOR_HALF_EXTENT);
        assert!(next.airborne);
        assert_eq!(next.vy, -GRAVITY);
    }

    #[test]
    fn running_into_wall_snaps_with_clearance() {
        let mut objects = vec![StaticObject::wall(
            Polygon::rect(-1000.0, -64.0, 1000.0, -16.0).unwrap(),
        )];
        objects.push(StaticObject::wall(
            Polygon::rect(18.0, -16.0, 50.0, 200.0).unwrap(),
        ));
        let world = StaticWorld::new(objects);
        let s = ActorState::grounded(0.0, 0.0);
        let next = step(&s, &world, Move::D, true, &PhysicsSettings::default());
        assert_eq!(next.x, 18.0 - ACTOR_HALF_EXTENT - X_SNAP_CLEARANCE);
        assert_eq!(next.vx, 0.0);
    }

    #[test]
    fn horizontal_pass_runs_before_vertical_rescan() {
        // Pillar to the right overlaps horizontally; a floor block overlaps
        // vertically, but only until the pillar pushes the actor left.
        let world = StaticWorld::new(vec![
            StaticObject::wall(Polygon::rect(0.0, 5.0, 40.0, 100.0).unwrap()),
            StaticObject::wall(Polygon::rect(0.5, -100.0, 60.0, 0.0).unwrap()),
        ]);
        let s = ActorState::falling(-14.0, 15.0);
        let next = step(&s, &world, Move::N, false, &PhysicsSettings::default());

        assert_eq!(next.x, -17.0);
        // Vertical-first (or a stale vertical list) would land at y = 16.
        assert_eq!(next.y, 15.0);
        assert!(next.airborne);
        assert_eq!(next.vy, -GRAVITY);
    }

    #[test]
    fn hazard_contact_ends_tick() {
        let world = StaticWorld::new(vec![StaticObject::hazard(
            Polygon::rect(10.0, -16.0, 30.0, 0.0).unwrap(),
            HazardKind::Spike,
        )]);
        let s = ActorState::falling(-10.0, 0.0);
        let next = step(&s, &world, Move::D, true, &PhysicsSettings::default());
        assert!(next.is_dead());
        // No gravity on the fatal tick.
        assert_eq!(next.vy, 0.0);
    }

    #[test]
    fn speed_zone_takes_control_and_pushes() {
        let world = StaticWorld::new(vec![StaticObject::speed_zone(
            Polygon::rect(-50.0, -50.0, 50.0, 50.0).unwrap(),
            Direction::E,
        )]);
        let s = ActorState::falling(0.0, 0.0);
        let next = step(&s, &world, Move::A, false, &PhysicsSettings::default());
        assert!(!next.can_control);
        assert_eq!(next.push, PUSH_SPEED);
        assert_eq!(next.vx, PUSH_SPEED);
        assert_eq!(next.facing, Direction::E);
    }

    #[test]
    fn push_decays_once_control_returns() {
        let world = StaticWorld::default();
        let s = ActorState {
            push: 300.0,
            facing: Direction::E,
            ..ActorState::falling(0.0, 0.0)
        };
        let next = step(&s, &world, Move::N, false, &PhysicsSettings::default());
        assert!(next.can_control);
        assert_eq!(next.push, 300.0 - PUSH_DECAY);
        assert_eq!(next.vx, 300.0 - PUSH_DECAY);
    }

    #[test]
    fn scroller_moves_vertically_without_gravity() {
        let world = StaticWorld::default();
        let settings = PhysicsSettings::scroller();
        let s = ActorState::falling(0.0, 0.0);
        let up = step(&s, &world, Move::W, false, &settings);
        assert_eq!(up.vy, WALK_SPEED);
        let idle = step(&up, &world, Move::N, false, &settings);
        assert_eq!(idle.vy, 0.0);
        assert_eq!(idle.y, up.y);
        let down = step(&idle, &world, Move::SD, false, &settings);
        assert_eq!(down.vy, -WALK_SPEED);
        assert!(down.x > idle.x);
    }

    #[test]
    fn displacement_is_rounded_to_five_places() {
        assert_eq!(round_displacement(100.0), 1.66667);
        assert_eq!(round_displacement(-6.0), -0.1);
    }

    #[test]
    fn rollout_stops_at_hazard() {
        let world = StaticWorld::new(vec![StaticObject::hazard(
            Polygon::rect(40.0, -16.0, 60.0, 16.0).unwrap(),
            HazardKind::Portal,
        )]);
        let steps = vec![
            MacroStep {
                mv: Move::D,
                run: true
            };
            20
        ];
        let states = rollout(&ActorState::falling(0.0, 0.0), &world, &steps, &Default::default());
        assert!(states.len() < 20);
        assert_eq!(states.last().unwrap().hazard, Some(HazardKind::Portal));
    }
}
