//! Test utilities for the satellite simulation.
//!
//! Provides fixtures for building bodies and spaces, and assertions for
//! checking conservation laws and geometric invariants.

use bevy::math::DVec2;

use crate::satellite::{Satellite, SatelliteId};
use crate::space::{Space, SpaceConfig};
use crate::types::{Border, SatelliteKind};

/// Fixtures for creating test bodies and spaces.
pub mod fixtures {
    use super::*;

    /// Observance factor used by fixture bodies.
    pub const OBSERVANCE_FACTOR: f64 = 4.0;

    /// A working body of the given size and mass, top-left at `(x, y)`.
    pub fn body(id: SatelliteId, x: f64, y: f64, size: f64, mass: f64) -> Satellite {
        Satellite::custom(
            id,
            SatelliteKind::SatelliteA,
            DVec2::new(x, y),
            size,
            mass,
            OBSERVANCE_FACTOR,
        )
        .expect("fixture bodies are valid")
    }

    /// Deterministic config with no random placement.
    pub fn config() -> SpaceConfig {
        SpaceConfig {
            satellite_count: 0,
            player_controlled: false,
            seed: Some(1234),
            ..Default::default()
        }
    }

    /// An 800x600 arena with 10px padding.
    pub fn border() -> Border {
        Border::from_display(800.0, 600.0, 10.0)
    }

    /// An empty deterministic space.
    pub fn empty_space() -> Space {
        Space::empty(config(), border(), 1.0).expect("fixture border is valid")
    }
}

/// Assertions for verifying physical invariants.
pub mod assertions {
    use super::*;

    /// Total momentum vector of a set of bodies.
    pub fn total_momentum(bodies: &[(f64, DVec2)]) -> DVec2 {
        bodies.iter().map(|(m, v)| *v * *m).sum()
    }

    /// Assert that two momentum vectors have the same magnitude.
    ///
    /// # Panics
    /// Panics if the relative drift exceeds tolerance.
    pub fn assert_momentum_conserved(before: DVec2, after: DVec2, tolerance: f64) {
        let (b, a) = (before.length(), after.length());
        let drift = if b > 1e-10 { ((a - b) / b).abs() } else { (a - b).abs() };
        assert!(
            drift <= tolerance,
            "Momentum not conserved: before={b:.6e}, after={a:.6e}, drift={drift:.6e}, tolerance={tolerance:.6e}"
        );
    }

    /// Assert that no two bodies overlap by more than `slack`.
    pub fn assert_no_overlaps(bodies: &[Satellite], slack: f64) {
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                let gap = a.center().distance(b.center()) - a.radius() - b.radius();
                assert!(
                    gap >= -slack,
                    "Bodies {} and {} overlap by {:.6}",
                    a.id(),
                    b.id(),
                    -gap
                );
            }
        }
    }

    /// Assert that every body lies fully inside the border.
    pub fn assert_inside(bodies: &[Satellite], border: &Border) {
        for body in bodies {
            assert!(
                border.contains(body.position(), body.size()),
                "Body {} at {:?} (size {}) is outside the border",
                body.id(),
                body.position(),
                body.size()
            );
        }
    }
}

/// Utilities for creating headless Bevy apps for testing.
pub mod bevy_test {
    use bevy::prelude::*;

    /// Create a minimal Bevy app for testing without rendering.
    ///
    /// This app uses MinimalPlugins for a lightweight test environment.
    pub fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::resolve_border;

    #[test]
    fn test_fixture_body_geometry() {
        let body = fixtures::body(3, 0.0, 0.0, 20.0, 2.0);
        assert_eq!(body.id(), 3);
        assert_eq!(body.center(), DVec2::new(10.0, 10.0));
        assert_eq!(body.mass(), 2.0);
    }

    #[test]
    fn test_total_momentum_sums() {
        let p = assertions::total_momentum(&[(1.0, DVec2::X), (2.0, DVec2::new(-1.0, 1.0))]);
        assert_eq!(p, DVec2::new(-1.0, 2.0));
    }

    #[test]
    fn test_empty_space_fixture_is_settled() {
        let mut space = fixtures::empty_space();
        space
            .spawn(SatelliteKind::SatelliteC, DVec2::new(50.0, 50.0))
            .unwrap();
        let mut bodies = space.bodies().to_vec();
        resolve_border(&mut bodies, &fixtures::border(), 20);
        assertions::assert_inside(&bodies, &fixtures::border());
        assertions::assert_no_overlaps(&bodies, 1e-9);
    }
}
