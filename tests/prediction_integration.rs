//! Integration tests for collision prediction and avoidance.

mod common;

use approx::assert_relative_eq;
use bevy::math::DVec2;
use satsim::avoidance::avoidance_heading;
use satsim::prediction::{predict_collision, predict_from_histories};
use satsim::physics::Trajectory;
use satsim::types::NavigationIntent;

#[test]
fn test_converging_bodies_predict_analytic_time() {
    // 100 apart, closing at 1 unit per tick, contact at 10
    let own = common::line(DVec2::ZERO, DVec2::ZERO, 4);
    let other = common::line(DVec2::new(103.0, 0.0), DVec2::new(-1.0, 0.0), 4);
    assert_eq!(other[3], DVec2::new(100.0, 0.0));

    let prediction = predict_from_histories(&own, &other, 10.0).unwrap().unwrap();
    assert_relative_eq!(prediction.time, 90.0, epsilon = 1e-6);
    assert_relative_eq!(prediction.point.x, 5.0, epsilon = 1e-6);
}

#[test]
fn test_both_moving_head_on() {
    let own = Trajectory::new(&common::line(DVec2::new(-1.0, 0.0), DVec2::new(1.0, 0.0), 2)).unwrap();
    let other = Trajectory::new(&common::line(DVec2::new(101.0, 0.0), DVec2::new(-1.0, 0.0), 2)).unwrap();
    // 100 apart, closing at 2 per tick
    let prediction = predict_collision(&own, &other, 20.0).unwrap();
    assert_relative_eq!(prediction.time, 40.0, epsilon = 1e-6);
    assert_relative_eq!(prediction.point.x, 50.0, epsilon = 1e-6);
}

#[test]
fn test_crossing_paths_predict_earliest_contact() {
    // Perpendicular paths meeting at the origin after 50 ticks
    let own = Trajectory::new(&common::line(DVec2::new(-51.0, 0.0), DVec2::X, 2)).unwrap();
    let other = Trajectory::new(&common::line(DVec2::new(0.0, -51.0), DVec2::Y, 2)).unwrap();
    let prediction = predict_collision(&own, &other, 10.0).unwrap();
    // |(t-50)·(1,-1)| = 10 ⇒ t = 50 - 10/√2
    assert_relative_eq!(prediction.time, 50.0 - 10.0 / 2.0_f64.sqrt(), epsilon = 1e-6);
}

#[test]
fn test_avoidance_steers_perpendicular_in_space() {
    let mut config = common::config();
    config.observance_factor = 20.0;
    let mut space = common::empty_space(config, 400.0);

    let observer = common::spawn_at(&mut space, DVec2::new(-100.0, 0.0), 10.0, 1.0);
    let threat = common::spawn_at(&mut space, DVec2::new(50.0, 0.0), 10.0, 1.0);
    assert!(space.set_player(Some(threat)));

    let west = NavigationIntent::Heading(180.0);
    let mut steered = false;
    for _ in 0..10 {
        let report = space.tick(&west);
        steered |= report.avoiding > 0;
    }
    assert!(steered, "observer never reacted to the approaching threat");

    let body = space.body(observer).unwrap();
    assert!(body.navigation_velocity().y.abs() > 0.0);
    assert!(body.navigation_velocity().x.abs() < 1e-9);
    assert!(body.center().y < 0.0, "observer should sidestep up the screen");
}
