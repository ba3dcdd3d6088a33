//! Finite-difference trajectory estimates from a short position history.
//!
//! Positions are assumed to be sampled once per tick. With `n` samples the
//! estimator recovers up to the `(n-1)`-th finite difference and extrapolates
//! with the Newton forward-difference polynomial, which is exact for motion
//! that is itself polynomial of that degree.

use bevy::math::DVec2;

use super::polynomial::Polynomial;
use crate::types::HISTORY_LEN;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryError {
    #[error("trajectory needs at least 2 positions, got {0}")]
    TooFewPoints(usize),

    #[error("trajectory supports at most {max} positions, got {0}", max = HISTORY_LEN)]
    TooManyPoints(usize),
}

/// Motion model fitted to 2..=4 positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    /// Samples used for the fit, oldest first.
    points: Vec<DVec2>,
    /// Oldest sample.
    pub support: DVec2,
    /// First forward difference.
    pub velocity: DVec2,
    /// Second forward difference (zero with fewer than 3 samples).
    pub acceleration: DVec2,
    /// Third forward difference (zero with fewer than 4 samples).
    pub jerk: DVec2,
}

impl Trajectory {
    /// Fit a trajectory to positions ordered oldest first.
    pub fn new(points: &[DVec2]) -> Result<Self, TrajectoryError> {
        match points.len() {
            n if n < 2 => return Err(TrajectoryError::TooFewPoints(n)),
            n if n > HISTORY_LEN => return Err(TrajectoryError::TooManyPoints(n)),
            _ => {}
        }

        let velocity = points[1] - points[0];
        let acceleration = points
            .get(2)
            .map(|p2| *p2 - points[1] - velocity)
            .unwrap_or(DVec2::ZERO);
        let jerk = points
            .get(3)
            .map(|p3| (*p3 - points[2]) - (points[2] - points[1]) - acceleration)
            .unwrap_or(DVec2::ZERO);

        Ok(Self {
            points: points.to_vec(),
            support: points[0],
            velocity,
            acceleration,
            jerk,
        })
    }

    /// Fit to the newest `count` samples of a longer history.
    pub fn from_latest(history: &[DVec2], count: usize) -> Result<Self, TrajectoryError> {
        let start = history.len().saturating_sub(count);
        Self::new(&history[start..])
    }

    /// Number of samples in the fit (2..=4).
    pub fn order(&self) -> usize {
        self.points.len()
    }

    /// Polynomial degree of the position model (`order - 1`).
    pub fn degree(&self) -> usize {
        self.order() - 1
    }

    /// Newest sample; `t = 0` of the position polynomials.
    pub fn latest(&self) -> DVec2 {
        self.points[self.points.len() - 1]
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Position polynomials `(x(t), y(t))`, with `t` in ticks after the newest sample.
    pub fn position_polynomials(&self) -> (Polynomial, Polynomial) {
        // Newton basis in s (ticks since the oldest sample):
        // 1, s, s(s-1)/2, s(s-1)(s-2)/6
        let s = Polynomial::identity();
        let mut basis = vec![Polynomial::constant(1.0), s.clone()];
        if self.order() > 2 {
            basis.push((&s * &Polynomial::new(vec![-1.0, 1.0])).scaled(0.5));
        }
        if self.order() > 3 {
            basis.push(
                (&(&s * &Polynomial::new(vec![-1.0, 1.0])) * &Polynomial::new(vec![-2.0, 1.0]))
                    .scaled(1.0 / 6.0),
            );
        }

        let diffs = [self.support, self.velocity, self.acceleration, self.jerk];
        let mut x = Polynomial::zero();
        let mut y = Polynomial::zero();
        for (term, diff) in basis.iter().zip(diffs) {
            x = &x + &term.scaled(diff.x);
            y = &y + &term.scaled(diff.y);
        }

        let now = self.degree() as f64;
        (x.shifted(now), y.shifted(now))
    }

    /// Extrapolated position `t` ticks after the newest sample.
    pub fn position_at(&self, t: f64) -> DVec2 {
        let (x, y) = self.position_polynomials();
        DVec2::new(x.eval(t), y.eval(t))
    }

    /// Instantaneous velocity estimate at the newest sample.
    pub fn current_velocity(&self) -> DVec2 {
        let (x, y) = self.position_polynomials();
        DVec2::new(x.derivative().eval(0.0), y.derivative().eval(0.0))
    }
}
