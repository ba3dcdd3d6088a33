//! Evasive steering from predicted collisions.

use bevy::math::DVec2;

use crate::physics::vector::Vector2Ext;
use crate::prediction::CollisionPrediction;

/// Compass heading that steers an observer away from a predicted threat.
///
/// The observer sidesteps perpendicular to the threat's motion (or to its own
/// motion if the threat is stationary), on whichever side opens the gap. With
/// neither body moving it simply heads straight away from the threat.
pub fn avoidance_heading(
    observer_center: DVec2,
    observer_velocity: DVec2,
    prediction: &CollisionPrediction,
) -> f64 {
    let threat_center = prediction.trajectory.latest();
    let threat_velocity = prediction.trajectory.current_velocity();

    let reference = if threat_velocity.is_degenerate() {
        observer_velocity
    } else {
        threat_velocity
    };
    let tangent = reference.tangent().unit_normal();
    if tangent == DVec2::ZERO {
        return (observer_center - threat_center).heading_degrees();
    }

    let current = observer_center.distance(threat_center);
    let stepped = (observer_center + tangent).distance(threat_center);
    if stepped > current {
        tangent.heading_degrees()
    } else {
        (-tangent).heading_degrees()
    }
}
