//! Actual (not predicted) collision handling.
//!
//! Two passes run at the end of every tick:
//! - body against body: overlapping observed pairs are pushed apart, exchange
//!   momentum elastically and are both marked crashed;
//! - body against border: bodies outside the padded arena are clamped back
//!   in, and overlaps the clamp creates are repaired by nudging the inner
//!   body of each pair, for a bounded number of passes.

use std::collections::{BTreeSet, HashMap};

use bevy::log::{debug, warn};
use bevy::math::DVec2;

use crate::physics::vector::Vector2Ext;
use crate::satellite::{Satellite, SatelliteId};
use crate::types::Border;

/// Relative momentum drift tolerated before logging a diagnostic.
const MOMENTUM_TOLERANCE: f64 = 1e-6;

/// Overlap slack so that bodies separated to exactly touching count as clear.
const OVERLAP_SLACK: f64 = 1e-9;

/// A resolved contact between two bodies.
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    pub first: SatelliteId,
    pub second: SatelliteId,
    /// Touching point after separation.
    pub point: DVec2,
    /// Penetration depth before separation.
    pub depth: f64,
    /// Whether velocities were exchanged (only for approaching pairs).
    pub exchanged: bool,
}

/// Outcome of one border resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BorderResolution {
    /// Passes executed, including the final clean one.
    pub passes: usize,
    /// Whether a clean pass was reached before the cap.
    pub converged: bool,
    /// Number of clamps performed.
    pub clamped: usize,
}

/// Post-impact velocities for a 2D elastic collision.
///
/// `normal` points from body 1 to body 2. Normal components follow the 1D
/// elastic formula; tangential components pass through unchanged.
pub fn elastic_collision(m1: f64, v1: DVec2, m2: f64, v2: DVec2, normal: DVec2) -> (DVec2, DVec2) {
    let n = normal.unit_normal();
    if n == DVec2::ZERO {
        return (v1, v2);
    }
    let t = n.tangent();

    let (v1n, v1t) = (v1.dot(n), v1.dot(t));
    let (v2n, v2t) = (v2.dot(n), v2.dot(t));
    let total = m1 + m2;

    let v1n_after = (v1n * (m1 - m2) + 2.0 * m2 * v2n) / total;
    let v2n_after = (v2n * (m2 - m1) + 2.0 * m1 * v1n) / total;

    (n * v1n_after + t * v1t, n * v2n_after + t * v2t)
}

/// Total momentum magnitude of a pair.
pub fn momentum(m1: f64, v1: DVec2, m2: f64, v2: DVec2) -> f64 {
    (v1 * m1 + v2 * m2).length()
}

/// Resolve every overlapping observed pair.
///
/// Pairs are taken from each body's observance map, so two bodies only
/// collide once at least one of them tracks the other.
pub fn resolve_body_collisions(bodies: &mut [Satellite], t_vertex: f64) -> Vec<Contact> {
    let index: HashMap<SatelliteId, usize> = bodies
        .iter()
        .enumerate()
        .map(|(i, b)| (b.id(), i))
        .collect();

    let mut pairs = BTreeSet::new();
    for (i, body) in bodies.iter().enumerate() {
        for id in body.observed_ids() {
            if let Some(&j) = index.get(&id) {
                if i != j {
                    pairs.insert((i.min(j), i.max(j)));
                }
            }
        }
    }

    let mut contacts = Vec::new();
    for (i, j) in pairs {
        let (a, b) = pair_mut(bodies, i, j);
        if let Some(contact) = collide(a, b, t_vertex) {
            debug!(
                "Collision between {} and {} (depth {:.3})",
                contact.first, contact.second, contact.depth
            );
            contacts.push(contact);
        }
    }
    contacts
}

fn collide(a: &mut Satellite, b: &mut Satellite, t_vertex: f64) -> Option<Contact> {
    let axis = b.center() - a.center();
    let distance = axis.length();
    let radius_sum = a.radius() + b.radius();
    if distance > radius_sum {
        return None;
    }

    // Concentric bodies get an arbitrary but fixed axis
    let normal = if axis.is_degenerate() {
        DVec2::X
    } else {
        axis / distance
    };
    let depth = radius_sum - distance;
    a.translate(-normal * depth * 0.5);
    b.translate(normal * depth * 0.5);

    let (va, vb) = (a.effective_velocity(), b.effective_velocity());
    let approaching = (vb - va).dot(normal) < 0.0;
    if approaching {
        let (va_after, vb_after) = elastic_collision(a.mass(), va, b.mass(), vb, normal);

        let before = momentum(a.mass(), va, b.mass(), vb);
        let after = momentum(a.mass(), va_after, b.mass(), vb_after);
        if (before - after).abs() > MOMENTUM_TOLERANCE * before.max(1.0) {
            warn!(
                "Momentum drift in collision {}-{}: {before:.9} -> {after:.9}",
                a.id(),
                b.id()
            );
        }

        for (body, v_after) in [(&mut *a, va_after), (&mut *b, vb_after)] {
            let delta = v_after - body.disturbance_velocity();
            if let Err(e) = body.set_collision_velocity(delta, t_vertex) {
                warn!("Could not shape recoil for body {}: {e}", body.id());
            }
        }
    }

    a.crash();
    b.crash();

    Some(Contact {
        first: a.id(),
        second: b.id(),
        point: a.center() + normal * a.radius(),
        depth,
        exchanged: approaching,
    })
}

/// Clamp bodies into the border and repair overlaps the clamps create.
///
/// Only pairs involving a body the border has moved are repaired, so a
/// configuration that is already legal is left exactly as it is.
pub fn resolve_border(bodies: &mut [Satellite], border: &Border, cap: usize) -> BorderResolution {
    let mut result = BorderResolution::default();
    // Accumulated push direction of every body the border has moved
    let mut pushed: Vec<Option<DVec2>> = vec![None; bodies.len()];

    for _ in 0..cap {
        result.passes += 1;
        let mut dirty = false;

        for (body, push) in bodies.iter_mut().zip(pushed.iter_mut()) {
            if border.contains(body.position(), body.size()) {
                continue;
            }
            let clamped = border.clamp(body.position(), body.size());
            let shift = clamped - body.position();
            body.set_position(clamped);
            body.clear_velocities();
            *push = Some(push.unwrap_or(DVec2::ZERO) + shift);
            result.clamped += 1;
            dirty = true;
        }

        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let direction = match (pushed[i], pushed[j]) {
                    (None, None) => continue,
                    (a, b) => (a.unwrap_or(DVec2::ZERO) + b.unwrap_or(DVec2::ZERO)).unit_normal(),
                };
                let (a, b) = pair_mut(bodies, i, j);
                let depth = a.radius() + b.radius() - a.center().distance(b.center());
                if depth <= OVERLAP_SLACK {
                    continue;
                }
                dirty = true;

                let (pa, pb) = (a.center().dot(direction), b.center().dot(direction));
                let yielder = if pa > pb {
                    i
                } else if pb > pa {
                    j
                } else {
                    continue;
                };
                bodies[yielder].translate(direction * depth);
                bodies[yielder].clear_velocities();
                pushed[yielder] = Some(pushed[yielder].unwrap_or(DVec2::ZERO) + direction * depth);
            }
        }

        if !dirty {
            result.converged = true;
            break;
        }
    }

    if !result.converged {
        warn!(
            "Border resolution hit the {cap}-pass cap with overlaps remaining ({} clamps)",
            result.clamped
        );
    } else if result.clamped > 0 {
        debug!(
            "Border resolved in {} passes ({} clamps)",
            result.passes, result.clamped
        );
    }
    result
}

/// Two distinct mutable elements, `i < j`.
fn pair_mut(bodies: &mut [Satellite], i: usize, j: usize) -> (&mut Satellite, &mut Satellite) {
    let (head, tail) = bodies.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}
