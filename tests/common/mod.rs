//! Common test utilities for integration tests.

#![allow(dead_code)]

use bevy::math::DVec2;
use satsim::space::{Space, SpaceConfig};
use satsim::types::{Border, SatelliteKind};

/// Deterministic config that places no bodies on its own.
pub fn config() -> SpaceConfig {
    SpaceConfig {
        satellite_count: 0,
        player_controlled: false,
        seed: Some(2024),
        ..Default::default()
    }
}

/// Square arena centered on the origin, no padding.
pub fn centered_border(half: f64) -> Border {
    Border::new(DVec2::splat(-half), 2.0 * half, 2.0 * half, 0.0)
}

/// Empty space over a centered arena.
pub fn empty_space(config: SpaceConfig, half: f64) -> Space {
    Space::empty(config, centered_border(half), 1.0).expect("test border is valid")
}

/// Spawn a body of the given radius and mass with its center at `center`.
pub fn spawn_at(space: &mut Space, center: DVec2, radius: f64, mass: f64) -> u64 {
    space
        .spawn_custom(
            SatelliteKind::SatelliteA,
            center - DVec2::splat(radius),
            2.0 * radius,
            mass,
        )
        .expect("test body is valid")
}

/// Spawn an inert body (starts crashed).
pub fn spawn_junk(space: &mut Space, center: DVec2) -> u64 {
    let size = SatelliteKind::SpaceJunk.profile().diameter;
    space
        .spawn(SatelliteKind::SpaceJunk, center - DVec2::splat(size * 0.5))
        .expect("junk is valid")
}

/// Straight-line samples, oldest first.
pub fn line(start: DVec2, step: DVec2, samples: usize) -> Vec<DVec2> {
    (0..samples).map(|i| start + step * i as f64).collect()
}
