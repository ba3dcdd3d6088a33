//! Satsim - Satellite Arena Simulation
//!
//! A library crate for a 2D tick-driven simulation of satellites in a
//! bounded arena: shaped velocity curves, random disturbances, predictive
//! collision avoidance, elastic collisions and border containment.

pub mod avoidance;
pub mod collision;
pub mod disturbance;
pub mod physics;
pub mod prediction;
pub mod satellite;
pub mod snapshot;
pub mod space;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use space::{Space, SpaceConfig, SpacePlugin};
