//! Predictive collision detection between observed trajectories.
//!
//! For two fitted trajectories the squared separation is itself a
//! polynomial in time, so the first contact is the smallest non-negative
//! real root of `|Δp(t)|² − d_min²`. Predictions are advisory: they drive the
//! avoidance heuristic, while actual contact is handled by
//! [`crate::collision`].

use bevy::math::DVec2;

use crate::physics::polynomial::Polynomial;
use crate::physics::trajectory::{Trajectory, TrajectoryError};

/// A predicted future contact with an observed body.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionPrediction {
    /// Midpoint of both predicted centers at the time of contact.
    pub point: DVec2,
    /// Ticks until contact (`>= 0`).
    pub time: f64,
    /// Trajectory of the observed body the prediction was computed against.
    pub trajectory: Trajectory,
}

/// Polynomial `|a(t) − b(t)|² − d_min²` for two trajectories.
pub fn separation_polynomial(own: &Trajectory, other: &Trajectory, d_min: f64) -> Polynomial {
    let (ax, ay) = own.position_polynomials();
    let (bx, by) = other.position_polynomials();
    let dx = &ax - &bx;
    let dy = &ay - &by;
    &(&(&dx * &dx) + &(&dy * &dy)) - &Polynomial::constant(d_min * d_min)
}

/// Predict when two trajectories first come within `d_min` of each other.
///
/// Returns `None` when the separation never drops to `d_min` in the future.
/// A pair that is already within `d_min` reports a contact time of zero.
pub fn predict_collision(
    own: &Trajectory,
    other: &Trajectory,
    d_min: f64,
) -> Option<CollisionPrediction> {
    let separation = separation_polynomial(own, other, d_min);
    if separation.is_zero() {
        // Identical motion at exactly d_min: touching forever
        return Some(prediction_at(own, other, 0.0));
    }

    let time = if separation.eval(0.0) <= 0.0 {
        0.0
    } else {
        separation.min_root_in(0.0, separation.root_bound())?
    };
    Some(prediction_at(own, other, time))
}

/// Predict from two raw position histories, fitting both to their common
/// newest samples so the trajectories share an order.
pub fn predict_from_histories(
    own_history: &[DVec2],
    other_history: &[DVec2],
    d_min: f64,
) -> Result<Option<CollisionPrediction>, TrajectoryError> {
    let count = own_history.len().min(other_history.len());
    let own = Trajectory::from_latest(own_history, count)?;
    let other = Trajectory::from_latest(other_history, count)?;
    Ok(predict_collision(&own, &other, d_min))
}

fn prediction_at(own: &Trajectory, other: &Trajectory, time: f64) -> CollisionPrediction {
    let point = (own.position_at(time) + other.position_at(time)) * 0.5;
    CollisionPrediction {
        point,
        time,
        trajectory: other.clone(),
    }
}
