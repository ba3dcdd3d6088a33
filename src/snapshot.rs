//! Read-only render data handed to the presentation layer.

use bevy::math::DVec2;

use crate::satellite::{Satellite, SatelliteId};
use crate::types::SatelliteKind;

/// One body as the renderer sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySnapshot {
    pub id: SatelliteId,
    /// Top-left corner.
    pub x: f64,
    pub y: f64,
    /// Diameter.
    pub size: f64,
    pub kind: SatelliteKind,
    pub is_crashed: bool,
    pub malfunction_ticks: u32,
}

/// Line from a body's center along its effective velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityArrow {
    pub id: SatelliteId,
    pub from: DVec2,
    pub to: DVec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservanceCircle {
    pub id: SatelliteId,
    pub center: DVec2,
    pub radius: f64,
}

/// Copy of the simulation state for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpaceSnapshot {
    /// Tick the snapshot was taken after.
    pub tick: u64,
    pub bodies: Vec<BodySnapshot>,
    pub velocity_arrows: Vec<VelocityArrow>,
    pub observance_circles: Vec<ObservanceCircle>,
}

impl SpaceSnapshot {
    /// Capture `bodies`; arrows are the effective velocity scaled by `arrow_scale`.
    pub fn capture(tick: u64, bodies: &[Satellite], arrow_scale: f64) -> Self {
        let mut snapshot = Self {
            tick,
            bodies: Vec::with_capacity(bodies.len()),
            velocity_arrows: Vec::new(),
            observance_circles: Vec::with_capacity(bodies.len()),
        };

        for body in bodies {
            let center = body.center();
            snapshot.bodies.push(BodySnapshot {
                id: body.id(),
                x: body.position().x,
                y: body.position().y,
                size: body.size(),
                kind: body.kind(),
                is_crashed: body.is_crashed(),
                malfunction_ticks: body.malfunction_ticks(),
            });

            let velocity = body.effective_velocity();
            if velocity != DVec2::ZERO {
                snapshot.velocity_arrows.push(VelocityArrow {
                    id: body.id(),
                    from: center,
                    to: center + velocity * arrow_scale,
                });
            }

            snapshot.observance_circles.push(ObservanceCircle {
                id: body.id(),
                center,
                radius: body.observance_radius(),
            });
        }
        snapshot
    }

    pub fn body(&self, id: SatelliteId) -> Option<&BodySnapshot> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn crashed_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_crashed).count()
    }
}
