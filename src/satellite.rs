//! Satellite bodies.
//!
//! A satellite moves by the sum of three independently clocked velocity
//! channels (navigation, disturbance, collision recoil). It remembers its own
//! recent centers and the recent centers of every neighbor inside its
//! observance radius, which is what trajectory prediction works from.

use std::collections::{HashMap, VecDeque};

use bevy::math::DVec2;

use crate::disturbance::Disturbance;
use crate::physics::vector::Vector2Ext;
use crate::physics::velocity::{CurveBranch, Velocity, VelocityError};
use crate::prediction::CollisionPrediction;
use crate::types::{HISTORY_LEN, MIN_OBSERVANCE_FACTOR, SatelliteKind};

/// Unique, monotonically increasing body identifier.
pub type SatelliteId = u64;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum SatelliteError {
    #[error("invalid body (mass {mass}, size {size}); both must be positive and finite")]
    InvalidBody { mass: f64, size: f64 },
}

/// A body in the arena.
#[derive(Clone, Debug)]
pub struct Satellite {
    id: SatelliteId,
    kind: SatelliteKind,
    /// Top-left corner of the bounding square.
    position: DVec2,
    /// Diameter.
    size: f64,
    mass: f64,
    crashed: bool,
    observance_radius: f64,
    pub(crate) navigation: Velocity,
    pub(crate) disturbance: Velocity,
    pub(crate) collision: Velocity,
    /// Own centers, oldest first.
    history: VecDeque<DVec2>,
    /// Centers of currently observed neighbors, oldest first.
    observed: HashMap<SatelliteId, VecDeque<DVec2>>,
    /// Predicted contacts, ascending by time.
    predictions: Vec<(SatelliteId, CollisionPrediction)>,
    disturbances: Vec<Disturbance>,
    /// Longest remaining malfunction, counted down per tick.
    malfunction_ticks: u32,
}

impl Satellite {
    /// Create a body with its kind's default mass and a diameter scaled by `scale`.
    pub fn new(
        id: SatelliteId,
        kind: SatelliteKind,
        position: DVec2,
        scale: f64,
        observance_factor: f64,
    ) -> Result<Self, SatelliteError> {
        let profile = kind.profile();
        Self::custom(
            id,
            kind,
            position,
            profile.diameter * scale,
            profile.mass,
            observance_factor,
        )
    }

    /// Create a body with explicit size and mass.
    pub fn custom(
        id: SatelliteId,
        kind: SatelliteKind,
        position: DVec2,
        size: f64,
        mass: f64,
        observance_factor: f64,
    ) -> Result<Self, SatelliteError> {
        if !(mass > 0.0 && mass.is_finite() && size > 0.0 && size.is_finite()) {
            return Err(SatelliteError::InvalidBody { mass, size });
        }

        let mut satellite = Self {
            id,
            kind,
            position,
            size,
            mass,
            crashed: kind.profile().starts_crashed,
            observance_radius: size * 0.5 * observance_factor.max(MIN_OBSERVANCE_FACTOR),
            navigation: Velocity::default(),
            disturbance: Velocity::default(),
            collision: Velocity::default(),
            history: VecDeque::with_capacity(HISTORY_LEN),
            observed: HashMap::new(),
            predictions: Vec::new(),
            disturbances: Vec::new(),
            malfunction_ticks: 0,
        };
        satellite.record_center();
        Ok(satellite)
    }

    pub fn id(&self) -> SatelliteId {
        self.id
    }

    pub fn kind(&self) -> SatelliteKind {
        self.kind
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.size * 0.5
    }

    /// Cross-section used by the solar radiation model.
    pub fn surface(&self) -> f64 {
        std::f64::consts::PI * self.radius() * self.radius()
    }

    pub fn center(&self) -> DVec2 {
        self.position + DVec2::splat(self.radius())
    }

    pub fn observance_radius(&self) -> f64 {
        self.observance_radius
    }

    /// Inflated radius used to keep bodies apart at placement time.
    pub fn danger_radius(&self, shift: f64) -> f64 {
        self.radius() + shift
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    pub fn malfunction_ticks(&self) -> u32 {
        self.malfunction_ticks
    }

    /// Mark the body crashed. Sticky; navigation is cleared for good.
    pub fn crash(&mut self) {
        self.crashed = true;
        self.navigation.clear();
    }

    pub(crate) fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    pub(crate) fn translate(&mut self, offset: DVec2) {
        self.position += offset;
    }

    /// Sum of all three velocity channels; the displacement applied per tick.
    pub fn effective_velocity(&self) -> DVec2 {
        self.navigation.vector() + self.disturbance.vector() + self.collision.vector()
    }

    pub fn navigation_velocity(&self) -> DVec2 {
        self.navigation.vector()
    }

    pub fn disturbance_velocity(&self) -> DVec2 {
        self.disturbance.vector()
    }

    pub fn collision_velocity(&self) -> DVec2 {
        self.collision.vector()
    }

    /// Zero every channel and drop active disturbances.
    pub fn clear_velocities(&mut self) {
        self.navigation.clear();
        self.disturbance.clear();
        self.collision.clear();
        self.disturbances.clear();
    }

    /// Steer towards a compass heading, easing up to `v_max`.
    ///
    /// The navigation curve is reshaped and its clock placed on the rising
    /// branch at the current speed, so the body accelerates smoothly from
    /// whatever it is doing now. Crashed bodies ignore navigation.
    pub fn navigate_to_in_degree(
        &mut self,
        heading: f64,
        v_max: f64,
        t_vertex: f64,
    ) -> Result<(), VelocityError> {
        if self.crashed {
            return Ok(());
        }
        self.navigation.solve_shape(v_max, t_vertex)?;
        self.navigation
            .set_direction(DVec2::from_heading_degrees(heading));
        let t = self.navigation.calculate_t(CurveBranch::Rising);
        self.navigation.set_t(t);
        Ok(())
    }

    /// Store a recoil velocity that decays to zero over `t_vertex` ticks.
    pub fn set_collision_velocity(&mut self, delta: DVec2, t_vertex: f64) -> Result<(), VelocityError> {
        if delta.is_degenerate() {
            self.collision.clear();
            return Ok(());
        }
        self.collision.set_vector(delta);
        self.collision.solve_shape(delta.length(), t_vertex)?;
        let t = self.collision.calculate_t(CurveBranch::Falling);
        self.collision.set_t(t);
        Ok(())
    }

    pub fn add_disturbance(&mut self, disturbance: Disturbance) {
        self.disturbances.push(disturbance);
    }

    pub fn disturbances(&self) -> &[Disturbance] {
        &self.disturbances
    }

    /// Remember a malfunction lasting `ticks`, keeping the longer of the two.
    pub(crate) fn extend_malfunction(&mut self, ticks: u32) {
        self.malfunction_ticks = self.malfunction_ticks.max(ticks);
    }

    /// Advance all velocity channels by one tick.
    ///
    /// The disturbance channel is rebuilt from scratch as the sum of every
    /// still-active disturbance; expired disturbances are dropped.
    pub fn compose_velocities(&mut self) {
        let mut sum = DVec2::ZERO;
        for disturbance in &mut self.disturbances {
            sum += disturbance.advance();
        }
        self.disturbances.retain(|d| !d.is_expired());
        self.disturbance.clear();
        self.disturbance.set_vector(sum);

        self.navigation.update();
        self.collision.update();
        self.malfunction_ticks = self.malfunction_ticks.saturating_sub(1);
    }

    /// Move by the effective velocity and record the new center.
    ///
    /// A non-finite result is rolled back, all channels are cleared and
    /// `false` is returned so the caller can report it.
    pub fn integrate(&mut self) -> bool {
        let previous = self.position;
        self.position += self.effective_velocity();
        if !self.position.is_finite() {
            self.position = previous;
            self.clear_velocities();
            return false;
        }
        self.record_center();
        true
    }

    fn record_center(&mut self) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(self.center());
    }

    /// Own centers, oldest first.
    pub fn history(&self) -> Vec<DVec2> {
        self.history.iter().copied().collect()
    }

    /// Update neighbor tracking from the current centers of all bodies.
    ///
    /// Neighbors inside the observance radius get their center appended;
    /// neighbors that left it are forgotten along with their predictions.
    pub fn refresh_observance(&mut self, centers: &[(SatelliteId, DVec2)]) {
        let own_center = self.center();
        for &(id, center) in centers {
            if id == self.id {
                continue;
            }
            if own_center.distance(center) <= self.observance_radius {
                let track = self
                    .observed
                    .entry(id)
                    .or_insert_with(|| VecDeque::with_capacity(HISTORY_LEN));
                if track.len() == HISTORY_LEN {
                    track.pop_front();
                }
                track.push_back(center);
            } else {
                self.forget(id);
            }
        }
    }

    fn forget(&mut self, id: SatelliteId) {
        self.observed.remove(&id);
        self.predictions.retain(|(other, _)| *other != id);
    }

    pub fn is_observing(&self, id: SatelliteId) -> bool {
        self.observed.contains_key(&id)
    }

    /// Ids of all currently observed neighbors, in ascending order.
    pub fn observed_ids(&self) -> Vec<SatelliteId> {
        let mut ids: Vec<SatelliteId> = self.observed.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Recorded centers of an observed neighbor, oldest first.
    pub fn observed_history(&self, id: SatelliteId) -> Option<Vec<DVec2>> {
        self.observed
            .get(&id)
            .map(|track| track.iter().copied().collect())
    }

    /// Replace the predicted contacts, keeping them sorted by time.
    pub fn set_predictions(&mut self, mut predictions: Vec<(SatelliteId, CollisionPrediction)>) {
        predictions.sort_by(|a, b| a.1.time.total_cmp(&b.1.time));
        self.predictions = predictions;
    }

    pub fn predictions(&self) -> &[(SatelliteId, CollisionPrediction)] {
        &self.predictions
    }

    /// Earliest predicted contact, if any.
    pub fn nearest_prediction(&self) -> Option<&(SatelliteId, CollisionPrediction)> {
        self.predictions.first()
    }

    /// Re-express the body in a resized arena.
    ///
    /// `map` takes old arena points to new ones, `ratio` scales lengths.
    pub(crate) fn relayout(&mut self, map: impl Fn(DVec2) -> DVec2, ratio: f64) {
        let old_center = self.center();
        self.size *= ratio;
        self.observance_radius *= ratio;
        // Keep the center on the mapped point so bodies do not drift
        self.position = map(old_center) - DVec2::splat(self.radius());

        for p in self.history.iter_mut() {
            *p = map(*p);
        }
        for track in self.observed.values_mut() {
            for p in track.iter_mut() {
                *p = map(*p);
            }
        }
        // Stale after a relayout; rebuilt next tick
        self.predictions.clear();

        self.navigation.rescale(ratio);
        self.disturbance.rescale(ratio);
        self.collision.rescale(ratio);
        for disturbance in &mut self.disturbances {
            disturbance.rescale(ratio);
        }
    }
}
