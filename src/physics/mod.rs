//! Motion primitives for the satellite arena.
//!
//! Everything here is pure math on `DVec2`: vector helpers, shaped velocity
//! curves, finite-difference trajectories and the polynomial root finder the
//! collision predictor is built on.

pub mod polynomial;
pub mod trajectory;
pub mod vector;
pub mod velocity;

#[cfg(test)]
mod proptest_physics;

pub use polynomial::Polynomial;
pub use trajectory::{Trajectory, TrajectoryError};
pub use vector::Vector2Ext;
pub use velocity::{CurveBranch, Velocity, VelocityError};
