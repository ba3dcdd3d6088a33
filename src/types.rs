//! Core simulation types and constants for the satellite arena.

use std::ops::RangeInclusive;

use bevy::math::DVec2;
use bevy::prelude::*;

/// Ticks from rest to peak magnitude for shaped navigation and recoil curves.
pub const DEFAULT_T_VERTEX: f64 = 20.0;

/// Number of past center positions kept per body (and per observed neighbor).
pub const HISTORY_LEN: usize = 4;

/// Smallest observance factor for which every overlap is observed.
pub const MIN_OBSERVANCE_FACTOR: f64 = 2.0;

/// Hard cap on clamp-then-reseparate passes in border resolution.
pub const BORDER_ITERATION_CAP: usize = 20;

/// Scale applied to mass ratios by the magnetic disturbance.
pub const MAGNETIC_FACTOR: f64 = 0.3;

/// Degrees to radians conversion factor
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians to degrees conversion factor
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// Body variants. They differ only in data, see [`SatelliteKind::profile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SatelliteKind {
    SatelliteA,
    SatelliteB,
    SatelliteC,
    SatelliteD,
    /// Dead hardware; starts crashed and behaves as an inert obstacle.
    SpaceJunk,
}

/// Static per-kind defaults.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KindProfile {
    /// Mass in arbitrary units (always positive).
    pub mass: f64,
    /// Diameter in pixels at scale factor 1.0.
    pub diameter: f64,
    /// Whether bodies of this kind enter the simulation already crashed.
    pub starts_crashed: bool,
}

impl SatelliteKind {
    /// Every kind, in placement-lottery order.
    pub const ALL: [SatelliteKind; 5] = [
        SatelliteKind::SatelliteA,
        SatelliteKind::SatelliteB,
        SatelliteKind::SatelliteC,
        SatelliteKind::SatelliteD,
        SatelliteKind::SpaceJunk,
    ];

    /// Kinds that start operational.
    pub const WORKING: [SatelliteKind; 4] = [
        SatelliteKind::SatelliteA,
        SatelliteKind::SatelliteB,
        SatelliteKind::SatelliteC,
        SatelliteKind::SatelliteD,
    ];

    /// Look up mass, size and initial state for this kind.
    pub fn profile(self) -> KindProfile {
        match self {
            SatelliteKind::SatelliteA => KindProfile {
                mass: 1.0,
                diameter: 40.0,
                starts_crashed: false,
            },
            SatelliteKind::SatelliteB => KindProfile {
                mass: 2.0,
                diameter: 50.0,
                starts_crashed: false,
            },
            SatelliteKind::SatelliteC => KindProfile {
                mass: 3.0,
                diameter: 60.0,
                starts_crashed: false,
            },
            SatelliteKind::SatelliteD => KindProfile {
                mass: 4.0,
                diameter: 70.0,
                starts_crashed: false,
            },
            SatelliteKind::SpaceJunk => KindProfile {
                mass: 0.5,
                diameter: 30.0,
                starts_crashed: true,
            },
        }
    }

    /// Display name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            SatelliteKind::SatelliteA => "Satellite A",
            SatelliteKind::SatelliteB => "Satellite B",
            SatelliteKind::SatelliteC => "Satellite C",
            SatelliteKind::SatelliteD => "Satellite D",
            SatelliteKind::SpaceJunk => "Space junk",
        }
    }
}

/// Disturbance families the presentation layer (or the generator) can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisturbanceKind {
    Malfunction,
    SolarRadiation,
    Gravitational,
    Magnetic,
}

impl DisturbanceKind {
    pub const ALL: [DisturbanceKind; 4] = [
        DisturbanceKind::Malfunction,
        DisturbanceKind::SolarRadiation,
        DisturbanceKind::Gravitational,
        DisturbanceKind::Magnetic,
    ];
}

/// Axis-aligned arena rectangle with an inward padding.
///
/// Positions handled here are body top-left corners; a body of diameter
/// `size` is legal when its whole bounding square lies inside the padded
/// rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Border {
    pub origin: DVec2,
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Border {
    pub fn new(origin: DVec2, width: f64, height: f64, padding: f64) -> Self {
        Self {
            origin,
            width,
            height,
            padding,
        }
    }

    /// Border covering a display of the given size, anchored at the origin.
    pub fn from_display(width: f64, height: f64, padding: f64) -> Self {
        Self::new(DVec2::ZERO, width, height, padding)
    }

    /// A border is usable when its padded interior has positive area.
    pub fn is_valid(&self) -> bool {
        self.origin.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.padding >= 0.0
            && self.width > 2.0 * self.padding
            && self.height > 2.0 * self.padding
    }

    pub fn left(&self) -> f64 {
        self.origin.x + self.padding
    }

    pub fn top(&self) -> f64 {
        self.origin.y + self.padding
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.width - self.padding
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.height - self.padding
    }

    /// Legal range for the top-left corner of a body of the given size.
    pub fn x_range(&self, size: f64) -> RangeInclusive<f64> {
        self.left()..=(self.right() - size).max(self.left())
    }

    /// Legal range for the top-left corner of a body of the given size.
    pub fn y_range(&self, size: f64) -> RangeInclusive<f64> {
        self.top()..=(self.bottom() - size).max(self.top())
    }

    /// Check whether a body at `pos` with diameter `size` is fully inside.
    pub fn contains(&self, pos: DVec2, size: f64) -> bool {
        self.x_range(size).contains(&pos.x) && self.y_range(size).contains(&pos.y)
    }

    /// Move a body position onto the nearest legal edge.
    pub fn clamp(&self, pos: DVec2, size: f64) -> DVec2 {
        let xs = self.x_range(size);
        let ys = self.y_range(size);
        DVec2::new(
            pos.x.clamp(*xs.start(), *xs.end()),
            pos.y.clamp(*ys.start(), *ys.end()),
        )
    }
}

/// Navigation input for the player-controlled body.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub enum NavigationIntent {
    /// No new target; the navigation curve keeps decaying.
    #[default]
    Idle,
    /// Raw arrow-key state.
    Keys {
        left: bool,
        up: bool,
        right: bool,
        down: bool,
    },
    /// Explicit compass heading in degrees.
    Heading(f64),
}

impl NavigationIntent {
    /// Fold the intent into a compass heading, if it asks for one.
    ///
    /// Opposing keys cancel each other out.
    pub fn heading(&self) -> Option<f64> {
        match *self {
            NavigationIntent::Idle => None,
            NavigationIntent::Heading(deg) => deg.is_finite().then_some(deg),
            NavigationIntent::Keys {
                left,
                up,
                right,
                down,
            } => {
                let x = f64::from(u8::from(right)) - f64::from(u8::from(left));
                let y = f64::from(u8::from(up)) - f64::from(u8::from(down));
                if x == 0.0 && y == 0.0 {
                    None
                } else {
                    Some((y.atan2(x) * RAD_TO_DEG).rem_euclid(360.0))
                }
            }
        }
    }
}

/// Tick counter and pause state for the fixed-step driver.
#[derive(Resource, Clone, Debug, Default)]
pub struct SimulationClock {
    /// Ticks advanced so far.
    pub tick: u64,
    /// Whether simulation is paused
    pub paused: bool,
}
