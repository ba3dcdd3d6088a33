//! End-to-end scenarios driving a space tick by tick.

mod common;

use approx::assert_relative_eq;
use bevy::math::DVec2;
use satsim::collision::resolve_border;
use satsim::disturbance::Disturbance;
use satsim::space::{Space, TICK_PHASES};
use satsim::types::{DisturbanceKind, NavigationIntent};

fn positions(space: &Space) -> Vec<DVec2> {
    space.bodies().iter().map(|b| b.position()).collect()
}

#[test]
fn test_disturbed_body_collides_and_both_crash() {
    let mut space = common::empty_space(common::config(), 200.0);
    let a = common::spawn_at(&mut space, DVec2::ZERO, 10.0, 1.0);
    let b = common::spawn_at(&mut space, DVec2::new(15.0, 0.0), 10.0, 1.0);
    assert!(space.push_disturbance(
        b,
        Disturbance::new(DisturbanceKind::Malfunction, 5, DVec2::new(-1.0, 0.0)).unwrap()
    ));

    let mut contact_tick = None;
    for _ in 0..5 {
        let report = space.tick(&NavigationIntent::Idle);
        if !report.collisions.is_empty() {
            contact_tick = Some(report.tick);
            break;
        }
    }
    assert!(contact_tick.is_some(), "no collision within 5 ticks");

    let (body_a, body_b) = (space.body(a).unwrap(), space.body(b).unwrap());
    assert!(body_a.is_crashed() && body_b.is_crashed());
    let gap = body_a.center().distance(body_b.center());
    assert!(gap >= 20.0 - 1e-9, "bodies still overlap: {gap}");
    // B was moving into A, so A picks up leftward recoil
    assert!(body_a.collision_velocity().x < 0.0);
}

#[test]
fn test_head_on_collision_conserves_momentum() {
    // Observance only reaches touching distance, so nobody swerves first
    let mut config = common::config();
    config.observance_factor = 2.0;
    let mut space = common::empty_space(config, 300.0);
    let a = common::spawn_at(&mut space, DVec2::new(-30.0, 0.0), 10.0, 1.0);
    let b = common::spawn_at(&mut space, DVec2::new(30.0, 0.0), 10.0, 3.0);
    space.push_disturbance(a, Disturbance::new(DisturbanceKind::Malfunction, 40, DVec2::new(2.0, 0.0)).unwrap());
    space.push_disturbance(b, Disturbance::new(DisturbanceKind::Malfunction, 40, DVec2::new(-2.0, 0.0)).unwrap());

    let mut collided = false;
    for _ in 0..40 {
        if !space.tick(&NavigationIntent::Idle).collisions.is_empty() {
            collided = true;
            break;
        }
    }
    assert!(collided);

    let (body_a, body_b) = (space.body(a).unwrap(), space.body(b).unwrap());
    assert!(body_a.is_crashed() && body_b.is_crashed());
    // The lighter body bounces back, the heavy one stops dead
    let (va, vb) = (body_a.effective_velocity(), body_b.effective_velocity());
    assert!(va.x < 0.0);
    assert!(va.length() > vb.length());
    assert_relative_eq!(vb.x, 0.0, epsilon = 1e-9);
}

#[test]
fn test_border_is_idempotent_after_ticks() {
    let mut space = common::empty_space(common::config(), 100.0);
    // Pinned into a corner and pushed outwards
    let a = common::spawn_at(&mut space, DVec2::new(85.0, 85.0), 10.0, 1.0);
    let b = common::spawn_at(&mut space, DVec2::new(-50.0, 0.0), 10.0, 1.0);
    space.push_disturbance(a, Disturbance::new(DisturbanceKind::Magnetic, 20, DVec2::new(3.0, 3.0)).unwrap());
    space.push_disturbance(b, Disturbance::new(DisturbanceKind::Magnetic, 20, DVec2::new(-3.0, 0.0)).unwrap());

    for _ in 0..30 {
        let report = space.tick(&NavigationIntent::Idle);
        assert!(report.border.converged);
    }
    for body in space.bodies() {
        assert!(space.border().contains(body.position(), body.size()));
    }

    let settled = positions(&space);
    let mut bodies = space.bodies().to_vec();
    let again = resolve_border(&mut bodies, space.border(), 20);
    assert_eq!(again.clamped, 0);
    assert_eq!(again.passes, 1);
    let repeated: Vec<DVec2> = bodies.iter().map(|b| b.position()).collect();
    assert_eq!(settled, repeated);
}

#[test]
fn test_malfunction_without_live_bodies_is_noop() {
    let mut space = common::empty_space(common::config(), 200.0);
    common::spawn_junk(&mut space, DVec2::new(-50.0, 0.0));
    common::spawn_junk(&mut space, DVec2::new(50.0, 0.0));
    let before = positions(&space);

    assert_eq!(space.inject_disturbance(DisturbanceKind::Malfunction), 0);
    space.trigger_disturbance(DisturbanceKind::Malfunction);
    let report = space.tick(&NavigationIntent::Idle);

    assert_eq!(report.disturbances_applied, 1);
    assert!(space.bodies().iter().all(|b| b.disturbances().is_empty()));
    assert_eq!(before, positions(&space));
}

#[test]
fn test_every_tick_runs_all_phases_in_order() {
    let mut space = common::empty_space(common::config(), 200.0);
    common::spawn_at(&mut space, DVec2::ZERO, 10.0, 1.0);
    for _ in 0..3 {
        space.tick(&NavigationIntent::Idle);
        assert_eq!(space.last_phases(), &TICK_PHASES[..]);
    }
    assert_eq!(space.tick_count(), 3);
}

#[test]
fn test_snapshot_is_a_copy() {
    let mut space = common::empty_space(common::config(), 200.0);
    let id = common::spawn_at(&mut space, DVec2::ZERO, 10.0, 1.0);
    let snapshot = space.snapshot();

    space.push_disturbance(id, Disturbance::new(DisturbanceKind::Magnetic, 10, DVec2::new(2.0, 0.0)).unwrap());
    for _ in 0..3 {
        space.tick(&NavigationIntent::Idle);
    }

    let body = snapshot.body(id).unwrap();
    assert_relative_eq!(body.x, -10.0);
    assert_eq!(body.size, 20.0);
    assert!(space.snapshot().body(id).unwrap().x > -10.0);
    assert_eq!(space.snapshot().tick, 3);
}

#[test]
fn test_random_population_stays_legal() {
    let mut config = common::config();
    config.satellite_count = 10;
    config.player_controlled = true;
    let mut space = Space::new(config, common::centered_border(500.0), 1.0).unwrap();
    assert_eq!(space.bodies().len(), 10);

    let left = NavigationIntent::Keys {
        left: true,
        up: false,
        right: false,
        down: false,
    };
    for i in 0..200 {
        if i % 50 == 0 {
            space.trigger_disturbance(DisturbanceKind::ALL[(i / 50) % 4]);
        }
        let report = space.tick(&left);
        assert!(report.isolated.is_empty());
    }

    for body in space.bodies() {
        assert!(body.mass() > 0.0 && body.radius() > 0.0);
        assert!(body.position().is_finite());
        assert!(space.border().contains(body.position(), body.size()));
    }
}
