//! Random disturbances acting on satellites.
//!
//! A disturbance is a short shaped push: a raw impulse sampled once per
//! instance, scaled per body according to its kind, and eased in and out over
//! a random number of ticks. Triggers arrive through a [`DisturbanceQueue`]
//! and are applied at the start of a tick.

pub mod generator;

use std::ops::RangeInclusive;

use bevy::log::{debug, info, warn};
use bevy::math::DVec2;
use crossbeam::channel::Sender;
use rand::Rng;

use crate::physics::vector::Vector2Ext;
use crate::physics::velocity::{Velocity, VelocityError};
use crate::satellite::Satellite;
use crate::types::{DisturbanceKind, MAGNETIC_FACTOR};

pub use generator::{AutoDisturbanceGenerator, GeneratorConfig};

/// An active disturbance on one body.
#[derive(Clone, Debug, PartialEq)]
pub struct Disturbance {
    kind: DisturbanceKind,
    duration: u32,
    remaining: u32,
    velocity: Velocity,
}

impl Disturbance {
    /// Shape a push that peaks at `|impulse|` halfway through `duration`.
    ///
    /// A zero impulse yields a disturbance that only counts down.
    pub fn new(kind: DisturbanceKind, duration: u32, impulse: DVec2) -> Result<Self, VelocityError> {
        let duration = duration.max(1);
        let velocity = if impulse.is_degenerate() {
            Velocity::default()
        } else {
            Velocity::shaped(impulse, impulse.length(), f64::from(duration) / 2.0)?
        };
        Ok(Self {
            kind,
            duration,
            remaining: duration,
            velocity,
        })
    }

    /// Step the push by one tick and return its velocity for that tick.
    pub fn advance(&mut self) -> DVec2 {
        if self.remaining == 0 {
            return DVec2::ZERO;
        }
        self.remaining -= 1;
        self.velocity.update();
        self.velocity.vector()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    pub fn kind(&self) -> DisturbanceKind {
        self.kind
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) fn rescale(&mut self, ratio: f64) {
        self.velocity.rescale(ratio);
    }
}

/// Sampling parameters shared by every disturbance kind.
#[derive(Clone, Debug, PartialEq)]
pub struct DisturbanceSettings {
    /// Duration bounds in ticks.
    pub duration: RangeInclusive<u32>,
    /// Bound on each raw impulse component.
    pub max_impulse: f64,
    /// Multiplier on mass ratios for magnetic pushes.
    pub magnetic_factor: f64,
}

impl Default for DisturbanceSettings {
    fn default() -> Self {
        Self {
            duration: 20..=60,
            max_impulse: 1.5,
            magnetic_factor: MAGNETIC_FACTOR,
        }
    }
}

impl DisturbanceSettings {
    fn sample_duration(&self, rng: &mut impl Rng) -> u32 {
        let (a, b) = (*self.duration.start(), *self.duration.end());
        let (lo, hi) = (a.min(b).max(1), a.max(b).max(1));
        rng.gen_range(lo..=hi)
    }

    fn sample_impulse(&self, rng: &mut impl Rng) -> DVec2 {
        let bound = self.max_impulse.abs();
        if bound == 0.0 || !bound.is_finite() {
            return DVec2::ZERO;
        }
        DVec2::new(rng.gen_range(-bound..=bound), rng.gen_range(-bound..=bound))
    }
}

/// Producer handle onto a space's disturbance queue.
///
/// Cheap to clone and safe to use from any thread; triggers are applied at
/// the next tick boundary.
#[derive(Clone, Debug)]
pub struct DisturbanceQueue {
    sender: Sender<DisturbanceKind>,
}

impl DisturbanceQueue {
    pub(crate) fn new(sender: Sender<DisturbanceKind>) -> Self {
        Self { sender }
    }

    /// Enqueue a trigger. Returns `false` once the owning space is gone.
    pub fn send(&self, kind: DisturbanceKind) -> bool {
        self.sender.send(kind).is_ok()
    }
}

/// Apply one disturbance instance to the bodies and return how many it hit.
///
/// `scale` is the global layout scale factor; it multiplies the raw impulse
/// of every kind.
pub fn apply_disturbance(
    kind: DisturbanceKind,
    bodies: &mut [Satellite],
    rng: &mut impl Rng,
    settings: &DisturbanceSettings,
    scale: f64,
) -> usize {
    if bodies.is_empty() {
        return 0;
    }
    let duration = settings.sample_duration(rng);
    let raw = settings.sample_impulse(rng) * scale;

    let affected = match kind {
        DisturbanceKind::Malfunction => {
            let eligible: Vec<usize> = bodies
                .iter()
                .enumerate()
                .filter(|(_, b)| !b.is_crashed())
                .map(|(i, _)| i)
                .collect();
            if eligible.is_empty() {
                debug!("Malfunction skipped: every body is crashed");
                return 0;
            }
            let target = &mut bodies[eligible[rng.gen_range(0..eligible.len())]];
            if push(target, kind, duration, raw) {
                target.extend_malfunction(duration);
                1
            } else {
                0
            }
        }
        DisturbanceKind::SolarRadiation => {
            let max_surface = bodies.iter().map(Satellite::surface).fold(0.0, f64::max);
            // Degenerate pushes get a fresh impulse and the inverse ratio
            let (impulse, inverted) = if raw.is_degenerate() {
                (settings.sample_impulse(rng) * scale, true)
            } else {
                (raw, false)
            };
            let mut count = 0;
            for body in bodies.iter_mut() {
                let ratio = if inverted {
                    body.surface() / max_surface
                } else {
                    max_surface / body.surface()
                };
                count += usize::from(push(body, kind, duration, impulse * ratio));
            }
            count
        }
        DisturbanceKind::Gravitational => {
            let max_mass = bodies.iter().map(Satellite::mass).fold(0.0, f64::max);
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let mut count = 0;
            for body in bodies.iter_mut() {
                let impulse = DVec2::new(raw.x, raw.y * body.mass() / max_mass * sign);
                count += usize::from(push(body, kind, duration, impulse));
            }
            count
        }
        DisturbanceKind::Magnetic => {
            let max_mass = bodies.iter().map(Satellite::mass).fold(0.0, f64::max);
            let mut count = 0;
            for body in bodies.iter_mut() {
                let ratio = body.mass() / max_mass * settings.magnetic_factor;
                count += usize::from(push(body, kind, duration, raw * ratio));
            }
            count
        }
    };

    info!("{kind:?} disturbance hit {affected} bodies for {duration} ticks");
    affected
}

fn push(body: &mut Satellite, kind: DisturbanceKind, duration: u32, impulse: DVec2) -> bool {
    match Disturbance::new(kind, duration, impulse) {
        Ok(disturbance) => {
            body.add_disturbance(disturbance);
            true
        }
        Err(e) => {
            warn!("Skipping {kind:?} disturbance on body {}: {e}", body.id());
            false
        }
    }
}
