//! Shaped velocity curves.
//!
//! A [`Velocity`] is a direction plus a magnitude that follows
//! `magnitude(t) = v1·t² + v2·t`, a parabola that rises from zero, peaks at
//! `t_vertex` and falls back to zero at `2·t_vertex`. Navigation thrust,
//! collision recoil and disturbance pushes all use this ease-in/ease-out
//! curve, each with its own independent clock.

use bevy::math::DVec2;

use super::vector::Vector2Ext;

/// Magnitudes at or below this are treated as a stopped curve.
const STOP_EPSILON: f64 = 1e-9;

/// Error when a curve cannot be shaped from the requested parameters.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum VelocityError {
    #[error("cannot shape velocity with v_max={v_max} and t_vertex={t_vertex} (both must be positive and finite)")]
    InvalidShape { v_max: f64, t_vertex: f64 },
}

/// Which side of the curve's peak to look for a clock value on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveBranch {
    /// Accelerating half, `0..=t_vertex`.
    Rising,
    /// Decelerating half, `t_vertex..=2·t_vertex`.
    Falling,
}

/// A velocity channel with its own clock.
///
/// An unshaped velocity (`v1 == v2 == 0`) just holds a constant vector and
/// its clock never runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Velocity {
    /// Unit direction of travel (zero when no direction is known).
    direction: DVec2,
    /// Current speed along `direction`.
    magnitude: f64,
    /// Curve clock in ticks.
    t: f64,
    v1: f64,
    v2: f64,
    /// Whether `update` advances the clock.
    running: bool,
}

impl Velocity {
    /// A constant, unshaped velocity.
    pub fn from_vector(vector: DVec2) -> Self {
        let mut velocity = Self::default();
        velocity.set_vector(vector);
        velocity
    }

    /// A shaped velocity along `direction` with its clock at zero.
    pub fn shaped(direction: DVec2, v_max: f64, t_vertex: f64) -> Result<Self, VelocityError> {
        let mut velocity = Self {
            direction: direction.unit_normal(),
            ..Self::default()
        };
        velocity.solve_shape(v_max, t_vertex)?;
        velocity.t = 0.0;
        velocity.magnitude = 0.0;
        velocity.running = !velocity.direction.is_degenerate();
        Ok(velocity)
    }

    /// Solve for the curve coefficients `(v1, v2)`.
    ///
    /// The curve must satisfy
    /// `v1·T² + v2·T = v_max` and `v1·(2T)² + v2·(2T) = 0` with `T = t_vertex`,
    /// solved here with Cramer's rule.
    pub fn shape_coefficients(v_max: f64, t_vertex: f64) -> Result<(f64, f64), VelocityError> {
        if !(v_max > 0.0 && v_max.is_finite() && t_vertex > 0.0 && t_vertex.is_finite()) {
            return Err(VelocityError::InvalidShape { v_max, t_vertex });
        }

        let (a11, a12, b1) = (t_vertex * t_vertex, t_vertex, v_max);
        let (a21, a22, b2) = (4.0 * t_vertex * t_vertex, 2.0 * t_vertex, 0.0);
        let det = a11 * a22 - a12 * a21;

        let v1 = (b1 * a22 - a12 * b2) / det;
        let v2 = (a11 * b2 - b1 * a21) / det;
        Ok((v1, v2))
    }

    /// Reshape the curve to peak at `v_max` after `t_vertex` ticks.
    ///
    /// Direction, magnitude and clock are left alone; callers follow up with
    /// [`Velocity::calculate_t`] to place the clock on the new curve.
    pub fn solve_shape(&mut self, v_max: f64, t_vertex: f64) -> Result<(), VelocityError> {
        let (v1, v2) = Self::shape_coefficients(v_max, t_vertex)?;
        self.v1 = v1;
        self.v2 = v2;
        Ok(())
    }

    /// Curve magnitude at clock value `t` (not clamped at zero).
    pub fn magnitude_at(&self, t: f64) -> f64 {
        self.v1 * t * t + self.v2 * t
    }

    /// Clock value at which the curve peaks, if the velocity is shaped.
    pub fn t_vertex(&self) -> Option<f64> {
        (self.v1 < 0.0).then(|| -self.v2 / (2.0 * self.v1))
    }

    /// Peak magnitude of the curve, if the velocity is shaped.
    pub fn peak_magnitude(&self) -> Option<f64> {
        self.t_vertex().map(|t| self.magnitude_at(t))
    }

    /// Clock value on `branch` at which the curve equals the current magnitude.
    ///
    /// Degenerate inputs fall back instead of failing: a velocity without a
    /// direction (or with zero magnitude) yields `0.0`, and a magnitude above
    /// the curve's peak yields the peak time.
    pub fn calculate_t(&self, branch: CurveBranch) -> f64 {
        let Some(t_vertex) = self.t_vertex() else {
            return 0.0;
        };
        if self.direction.is_degenerate() || self.magnitude <= 0.0 {
            return match branch {
                CurveBranch::Rising => 0.0,
                CurveBranch::Falling => 2.0 * t_vertex,
            };
        }

        // v1·t² + v2·t − m = 0, v1 < 0
        let discriminant = self.v2 * self.v2 + 4.0 * self.v1 * self.magnitude;
        if discriminant <= 0.0 {
            return t_vertex;
        }
        let root = discriminant.sqrt();
        let early = (-self.v2 + root) / (2.0 * self.v1);
        let late = (-self.v2 - root) / (2.0 * self.v1);
        match branch {
            CurveBranch::Rising => early.min(late).max(0.0),
            CurveBranch::Falling => early.max(late),
        }
    }

    /// Place the clock and restart the curve.
    pub fn set_t(&mut self, t: f64) {
        self.t = t;
        self.running = self.t_vertex().is_some() && !self.direction.is_degenerate();
    }

    /// Advance the clock by one tick and re-derive the vector.
    ///
    /// The direction is kept and the magnitude re-evaluated on the curve.
    /// Once the magnitude reaches zero the velocity is cleared and the clock
    /// halts.
    pub fn update(&mut self) {
        if !self.running {
            return;
        }
        if self.direction.is_degenerate() {
            self.clear();
            return;
        }

        self.t += 1.0;
        let magnitude = self.magnitude_at(self.t);
        if magnitude <= STOP_EPSILON {
            self.clear();
        } else {
            self.magnitude = magnitude;
        }
    }

    /// Reset to exactly zero and halt the clock.
    ///
    /// The curve shape is kept so a later reshape can reuse it.
    pub fn clear(&mut self) {
        self.magnitude = 0.0;
        self.direction = DVec2::ZERO;
        self.t = 0.0;
        self.running = false;
    }

    /// Replace the current vector; the clock is left untouched.
    pub fn set_vector(&mut self, vector: DVec2) {
        if vector.is_degenerate() {
            self.magnitude = 0.0;
            self.direction = DVec2::ZERO;
        } else {
            self.magnitude = vector.length();
            self.direction = vector / self.magnitude;
        }
    }

    /// Point the velocity along a new direction, keeping its magnitude.
    pub fn set_direction(&mut self, direction: DVec2) {
        self.direction = direction.unit_normal();
    }

    /// Scale magnitude and curve by `ratio` (used when the arena is resized).
    pub fn rescale(&mut self, ratio: f64) {
        self.magnitude *= ratio;
        self.v1 *= ratio;
        self.v2 *= ratio;
    }

    pub fn vector(&self) -> DVec2 {
        self.direction * self.magnitude
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn direction(&self) -> DVec2 {
        self.direction
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == 0.0
    }
}
