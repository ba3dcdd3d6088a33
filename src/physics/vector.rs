//! 2D vector helpers on top of `DVec2`.
//!
//! Coordinates follow screen conventions (y grows downwards) while headings
//! are compass-style: 0° points east, 90° points north (towards `-y`) and
//! angles grow counter-clockwise on screen.

use bevy::math::DVec2;

use crate::types::{DEG_TO_RAD, RAD_TO_DEG};

/// Squared length below which a vector is treated as degenerate.
pub const DEGENERATE_LENGTH_SQ: f64 = 1e-18;

/// Extra vector operations used by the motion and collision code.
pub trait Vector2Ext {
    /// The vector rotated by +90°.
    fn tangent(self) -> DVec2;

    /// Unit vector in the same direction.
    ///
    /// The zero vector (or anything shorter than [`DEGENERATE_LENGTH_SQ`])
    /// maps to the zero vector instead of dividing by zero.
    fn unit_normal(self) -> DVec2;

    /// Whether the vector is too short to carry a direction.
    fn is_degenerate(self) -> bool;

    /// Compass heading of this vector in degrees, in `[0, 360)`.
    fn heading_degrees(self) -> f64;

    /// Unit vector pointing along a compass heading.
    fn from_heading_degrees(degrees: f64) -> DVec2;
}

impl Vector2Ext for DVec2 {
    #[inline]
    fn tangent(self) -> DVec2 {
        DVec2::new(-self.y, self.x)
    }

    #[inline]
    fn unit_normal(self) -> DVec2 {
        if self.is_degenerate() {
            DVec2::ZERO
        } else {
            self / self.length()
        }
    }

    #[inline]
    fn is_degenerate(self) -> bool {
        let len_sq = self.length_squared();
        len_sq.is_nan() || len_sq <= DEGENERATE_LENGTH_SQ
    }

    fn heading_degrees(self) -> f64 {
        ((-self.y).atan2(self.x) * RAD_TO_DEG).rem_euclid(360.0)
    }

    fn from_heading_degrees(degrees: f64) -> DVec2 {
        let rad = degrees * DEG_TO_RAD;
        DVec2::new(rad.cos(), -rad.sin())
    }
}
