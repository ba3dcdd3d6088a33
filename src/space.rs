//! The simulation driver.
//!
//! [`Space`] owns every body and advances them one tick at a time through a
//! fixed sequence of phases (see [`TICK_PHASES`]). Outside callers only ever
//! enqueue disturbance triggers or read snapshots, so no state is mutated
//! mid-tick. [`SpacePlugin`] drives a `Space` from Bevy's `FixedUpdate`.

use std::collections::HashMap;

use bevy::math::DVec2;
use bevy::prelude::*;
use crossbeam::channel::{Receiver, Sender};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::avoidance::avoidance_heading;
use crate::collision::{BorderResolution, Contact, resolve_body_collisions, resolve_border};
use crate::disturbance::{Disturbance, DisturbanceQueue, DisturbanceSettings, apply_disturbance};
use crate::prediction::predict_from_histories;
use crate::satellite::{Satellite, SatelliteError, SatelliteId};
use crate::snapshot::SpaceSnapshot;
use crate::types::{
    BORDER_ITERATION_CAP, Border, DEFAULT_T_VERTEX, DisturbanceKind, MIN_OBSERVANCE_FACTOR,
    NavigationIntent, SatelliteKind, SimulationClock,
};

/// Tunables for a space. Every field has a sensible default.
#[derive(Resource, Clone, Debug)]
pub struct SpaceConfig {
    /// Bodies placed at start-up.
    pub satellite_count: usize,
    /// Whether the first placed body follows [`NavigationIntent`].
    pub player_controlled: bool,
    /// Peak navigation speed at scale factor 1.0, in pixels per tick.
    pub max_nav_velocity: f64,
    /// Ticks for navigation to reach peak speed.
    pub nav_t_vertex: f64,
    /// Ticks for collision recoil to decay (it starts at its peak).
    pub collision_t_vertex: f64,
    pub disturbance: DisturbanceSettings,
    /// Observance radius as a multiple of the body radius.
    pub observance_factor: f64,
    /// Extra radius kept clear around each body at placement.
    pub danger_shift: f64,
    pub border_iteration_cap: usize,
    /// Random draws allowed per placed body before giving up.
    pub placement_attempts: usize,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Length multiplier for snapshot velocity arrows.
    pub arrow_scale: f64,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            satellite_count: 8,
            player_controlled: true,
            max_nav_velocity: 3.0,
            nav_t_vertex: DEFAULT_T_VERTEX,
            collision_t_vertex: DEFAULT_T_VERTEX,
            disturbance: DisturbanceSettings::default(),
            observance_factor: 4.0,
            danger_shift: 15.0,
            border_iteration_cap: BORDER_ITERATION_CAP,
            placement_attempts: 1000,
            seed: None,
            arrow_scale: 10.0,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SpaceError {
    #[error("placed {placed} of {requested} satellites before running out of {attempts} attempts")]
    PlacementExhausted {
        placed: usize,
        requested: usize,
        attempts: usize,
    },

    #[error(transparent)]
    InvalidBody(#[from] SatelliteError),

    #[error("border {0:?} with scale factor {1} has no usable interior")]
    InvalidBorder(Border, f64),

    #[error("observance factor {0} is below {min}, overlaps would go unseen", min = MIN_OBSERVANCE_FACTOR)]
    InvalidObservance(f64),
}

/// One step of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickPhase {
    ApplyDisturbances,
    ComposeVelocities,
    IntegratePositions,
    RefreshObservance,
    PredictCollisions,
    Avoid,
    ResolveActualCollisions,
    ResolveBorder,
}

/// The order every tick runs in. Avoidance needs this tick's predictions,
/// collisions need integrated positions and the border always goes last.
pub const TICK_PHASES: [TickPhase; 8] = [
    TickPhase::ApplyDisturbances,
    TickPhase::ComposeVelocities,
    TickPhase::IntegratePositions,
    TickPhase::RefreshObservance,
    TickPhase::PredictCollisions,
    TickPhase::Avoid,
    TickPhase::ResolveActualCollisions,
    TickPhase::ResolveBorder,
];

/// Diagnostics from one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Queued triggers applied at the start of the tick.
    pub disturbances_applied: usize,
    /// Predicted contacts across all bodies.
    pub predictions: usize,
    /// Bodies that steered to avoid a prediction.
    pub avoiding: usize,
    pub collisions: Vec<Contact>,
    pub border: BorderResolution,
    /// Bodies whose motion went non-finite and was rolled back.
    pub isolated: Vec<SatelliteId>,
}

/// All bodies plus the machinery that moves them.
#[derive(Resource)]
pub struct Space {
    config: SpaceConfig,
    border: Border,
    scale_factor: f64,
    bodies: Vec<Satellite>,
    player: Option<SatelliteId>,
    rng: ChaCha8Rng,
    queue_tx: Sender<DisturbanceKind>,
    queue_rx: Receiver<DisturbanceKind>,
    next_id: SatelliteId,
    tick: u64,
    last_phases: Vec<TickPhase>,
}

impl Space {
    /// Create a space and place `config.satellite_count` bodies in it.
    pub fn new(config: SpaceConfig, border: Border, scale_factor: f64) -> Result<Self, SpaceError> {
        let count = config.satellite_count;
        let mut space = Self::empty(config, border, scale_factor)?;
        space.populate(count)?;
        Ok(space)
    }

    /// Create a space with no bodies.
    pub fn empty(config: SpaceConfig, border: Border, scale_factor: f64) -> Result<Self, SpaceError> {
        if !border.is_valid() || !(scale_factor > 0.0 && scale_factor.is_finite()) {
            return Err(SpaceError::InvalidBorder(border, scale_factor));
        }
        let factor = config.observance_factor;
        if !(factor >= MIN_OBSERVANCE_FACTOR && factor.is_finite()) {
            return Err(SpaceError::InvalidObservance(factor));
        }
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let (queue_tx, queue_rx) = crossbeam::channel::unbounded();

        Ok(Self {
            config,
            border,
            scale_factor,
            bodies: Vec::new(),
            player: None,
            rng,
            queue_tx,
            queue_rx,
            next_id: 0,
            tick: 0,
            last_phases: Vec::with_capacity(TICK_PHASES.len()),
        })
    }

    /// Place `count` random bodies by rejection sampling.
    ///
    /// A candidate is accepted when it lies inside the border and its danger
    /// zone clears every placed body's danger zone. Bodies placed before the
    /// attempts run out are kept.
    pub fn populate(&mut self, count: usize) -> Result<usize, SpaceError> {
        let attempts = self.config.placement_attempts.max(1).saturating_mul(count);
        let mut placed = 0;
        let mut tries = 0;

        while placed < count {
            if tries == attempts {
                warn!("Placement gave up after {tries} attempts ({placed}/{count} placed)");
                return Err(SpaceError::PlacementExhausted {
                    placed,
                    requested: count,
                    attempts,
                });
            }
            tries += 1;

            let wants_player = self.config.player_controlled && self.player.is_none();
            // The player always flies a working satellite
            let kinds: &[SatelliteKind] = if wants_player {
                &SatelliteKind::WORKING
            } else {
                &SatelliteKind::ALL
            };
            let kind = kinds[self.rng.gen_range(0..kinds.len())];

            let size = kind.profile().diameter * self.scale_factor;
            if self.border.left() + size > self.border.right()
                || self.border.top() + size > self.border.bottom()
            {
                continue;
            }
            let position = DVec2::new(
                self.rng.gen_range(self.border.x_range(size)),
                self.rng.gen_range(self.border.y_range(size)),
            );
            if !self.is_clear(position, size) {
                continue;
            }

            let id = self.spawn(kind, position)?;
            if wants_player {
                self.player = Some(id);
            }
            placed += 1;
        }

        info!(
            "Placed {placed} satellites in {tries} attempts (player: {:?})",
            self.player
        );
        Ok(placed)
    }

    fn is_clear(&self, position: DVec2, size: f64) -> bool {
        let shift = self.config.danger_shift * self.scale_factor;
        let center = position + DVec2::splat(size * 0.5);
        let danger = size * 0.5 + shift;
        self.bodies
            .iter()
            .all(|b| b.center().distance(center) > b.danger_radius(shift) + danger)
    }

    /// Add a body of the given kind at a top-left position.
    pub fn spawn(&mut self, kind: SatelliteKind, position: DVec2) -> Result<SatelliteId, SpaceError> {
        let body = Satellite::new(
            self.next_id,
            kind,
            position,
            self.scale_factor,
            self.config.observance_factor,
        )?;
        Ok(self.insert(body))
    }

    /// Add a body with explicit size and mass.
    pub fn spawn_custom(
        &mut self,
        kind: SatelliteKind,
        position: DVec2,
        size: f64,
        mass: f64,
    ) -> Result<SatelliteId, SpaceError> {
        let body = Satellite::custom(
            self.next_id,
            kind,
            position,
            size,
            mass,
            self.config.observance_factor,
        )?;
        Ok(self.insert(body))
    }

    fn insert(&mut self, body: Satellite) -> SatelliteId {
        let id = body.id();
        self.next_id += 1;
        self.bodies.push(body);
        id
    }

    /// Hand navigation to another body (or to nobody).
    ///
    /// Returns `false` if the id is unknown.
    pub fn set_player(&mut self, id: Option<SatelliteId>) -> bool {
        if let Some(id) = id {
            if self.body(id).is_none() {
                return false;
            }
        }
        self.player = id;
        true
    }

    /// Queue a disturbance for the next tick boundary.
    pub fn trigger_disturbance(&self, kind: DisturbanceKind) {
        // The receiver lives as long as self, so this cannot fail
        let _ = self.queue_tx.send(kind);
    }

    /// A producer handle for other threads.
    pub fn disturbance_queue(&self) -> DisturbanceQueue {
        DisturbanceQueue::new(self.queue_tx.clone())
    }

    /// Apply a disturbance right away, bypassing the queue. Returns the
    /// number of bodies hit.
    pub fn inject_disturbance(&mut self, kind: DisturbanceKind) -> usize {
        apply_disturbance(
            kind,
            &mut self.bodies,
            &mut self.rng,
            &self.config.disturbance,
            self.scale_factor,
        )
    }

    /// Attach a ready-made disturbance to one body. Returns `false` if the id
    /// is unknown.
    pub fn push_disturbance(&mut self, id: SatelliteId, disturbance: Disturbance) -> bool {
        match self.bodies.iter_mut().find(|b| b.id() == id) {
            Some(body) => {
                body.add_disturbance(disturbance);
                true
            }
            None => false,
        }
    }

    /// Advance the simulation by one tick.
    ///
    /// Never fails; anomalies are logged and reported in the [`TickReport`].
    pub fn tick(&mut self, intent: &NavigationIntent) -> TickReport {
        self.tick += 1;
        self.last_phases.clear();
        let mut report = TickReport {
            tick: self.tick,
            ..default()
        };

        for phase in TICK_PHASES {
            self.last_phases.push(phase);
            match phase {
                TickPhase::ApplyDisturbances => {
                    report.disturbances_applied = self.drain_disturbances();
                }
                TickPhase::ComposeVelocities => self.compose_velocities(intent),
                TickPhase::IntegratePositions => report.isolated = self.integrate_positions(),
                TickPhase::RefreshObservance => self.refresh_observance(),
                TickPhase::PredictCollisions => report.predictions = self.predict_collisions(),
                TickPhase::Avoid => report.avoiding = self.avoid(),
                TickPhase::ResolveActualCollisions => {
                    report.collisions =
                        resolve_body_collisions(&mut self.bodies, self.config.collision_t_vertex);
                }
                TickPhase::ResolveBorder => {
                    report.border = resolve_border(
                        &mut self.bodies,
                        &self.border,
                        self.config.border_iteration_cap,
                    );
                }
            }
        }
        report
    }

    fn drain_disturbances(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(kind) = self.queue_rx.try_recv() {
            self.inject_disturbance(kind);
            applied += 1;
        }
        applied
    }

    fn compose_velocities(&mut self, intent: &NavigationIntent) {
        if let (Some(heading), Some(player)) = (intent.heading(), self.player) {
            let v_max = self.config.max_nav_velocity * self.scale_factor;
            let t_vertex = self.config.nav_t_vertex;
            if let Some(body) = self.bodies.iter_mut().find(|b| b.id() == player) {
                if let Err(e) = body.navigate_to_in_degree(heading, v_max, t_vertex) {
                    warn!("Player navigation rejected: {e}");
                }
            }
        }
        for body in &mut self.bodies {
            body.compose_velocities();
        }
    }

    fn integrate_positions(&mut self) -> Vec<SatelliteId> {
        let mut isolated = Vec::new();
        for body in &mut self.bodies {
            if !body.integrate() {
                warn!("Body {} produced a non-finite position; motion reset", body.id());
                isolated.push(body.id());
            }
        }
        isolated
    }

    fn refresh_observance(&mut self) {
        let centers: Vec<(SatelliteId, DVec2)> =
            self.bodies.iter().map(|b| (b.id(), b.center())).collect();
        for body in &mut self.bodies {
            body.refresh_observance(&centers);
        }
    }

    fn predict_collisions(&mut self) -> usize {
        let radii: HashMap<SatelliteId, f64> =
            self.bodies.iter().map(|b| (b.id(), b.radius())).collect();
        let mut total = 0;

        for body in &mut self.bodies {
            let own = body.history();
            let mut predictions = Vec::new();
            for id in body.observed_ids() {
                let (Some(other), Some(other_radius)) = (body.observed_history(id), radii.get(&id))
                else {
                    continue;
                };
                // Fresh neighbors have too little history to fit yet
                if let Ok(Some(prediction)) =
                    predict_from_histories(&own, &other, body.radius() + other_radius)
                {
                    predictions.push((id, prediction));
                }
            }
            total += predictions.len();
            body.set_predictions(predictions);
        }

        if total > 0 {
            debug!("Tick {}: {total} predicted contacts", self.tick);
        }
        total
    }

    fn avoid(&mut self) -> usize {
        let v_max = self.config.max_nav_velocity * self.scale_factor;
        let t_vertex = self.config.nav_t_vertex;
        let mut steering = 0;

        for body in &mut self.bodies {
            if body.is_crashed() || Some(body.id()) == self.player {
                continue;
            }
            let Some((_, prediction)) = body.nearest_prediction() else {
                continue;
            };
            let heading = avoidance_heading(body.center(), body.effective_velocity(), prediction);
            match body.navigate_to_in_degree(heading, v_max, t_vertex) {
                Ok(()) => steering += 1,
                Err(e) => warn!("Avoidance for body {} rejected: {e}", body.id()),
            }
        }
        steering
    }

    /// Render data for the current state.
    pub fn snapshot(&self) -> SpaceSnapshot {
        SpaceSnapshot::capture(self.tick, &self.bodies, self.config.arrow_scale)
    }

    /// Move to a new border and scale factor, keeping the relative layout.
    ///
    /// Positions are mapped proportionally from the old border onto the new
    /// one; sizes, radii and speeds scale with the scale factor ratio.
    pub fn resize(&mut self, border: Border, scale_factor: f64) -> Result<(), SpaceError> {
        if !border.is_valid() || !(scale_factor > 0.0 && scale_factor.is_finite()) {
            warn!("Ignoring resize to {border:?} at scale {scale_factor}");
            return Err(SpaceError::InvalidBorder(border, scale_factor));
        }

        let old = self.border;
        let stretch = DVec2::new(border.width / old.width, border.height / old.height);
        let map = |p: DVec2| border.origin + (p - old.origin) * stretch;
        let ratio = scale_factor / self.scale_factor;

        for body in &mut self.bodies {
            body.relayout(map, ratio);
        }
        self.border = border;
        self.scale_factor = scale_factor;

        // Aspect changes can leave bodies poking out
        resolve_border(&mut self.bodies, &self.border, self.config.border_iteration_cap);
        info!(
            "Resized space to {}x{} (scale {scale_factor})",
            border.width, border.height
        );
        Ok(())
    }

    pub fn bodies(&self) -> &[Satellite] {
        &self.bodies
    }

    pub fn body(&self, id: SatelliteId) -> Option<&Satellite> {
        self.bodies.iter().find(|b| b.id() == id)
    }

    pub fn player(&self) -> Option<SatelliteId> {
        self.player
    }

    pub fn border(&self) -> &Border {
        &self.border
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Ticks advanced so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Phases executed by the most recent tick, in order.
    pub fn last_phases(&self) -> &[TickPhase] {
        &self.last_phases
    }
}

/// Message asking for a disturbance at the next tick.
#[derive(Message, Clone, Copy, Debug)]
pub struct TriggerDisturbance(pub DisturbanceKind);

/// Latest snapshot, refreshed after every tick.
#[derive(Resource, Default)]
pub struct SpaceView {
    pub snapshot: SpaceSnapshot,
}

/// Runs a [`Space`] on Bevy's fixed timestep.
///
/// Reads [`SpaceConfig`] if one was inserted before the plugin, otherwise the
/// default.
pub struct SpacePlugin {
    pub border: Border,
    pub scale_factor: f64,
}

impl Default for SpacePlugin {
    fn default() -> Self {
        Self {
            border: Border::from_display(1280.0, 720.0, 20.0),
            scale_factor: 1.0,
        }
    }
}

impl Plugin for SpacePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpaceConfig>()
            .init_resource::<NavigationIntent>()
            .init_resource::<SimulationClock>()
            .init_resource::<SpaceView>()
            .init_resource::<Messages<TriggerDisturbance>>()
            .add_systems(
                FixedUpdate,
                (forward_disturbance_triggers, advance_space, publish_snapshot).chain(),
            );

        let config = app.world().resource::<SpaceConfig>().clone();
        let count = config.satellite_count;
        match Space::empty(config, self.border, self.scale_factor) {
            Ok(mut space) => {
                // A partial layout is still playable
                if let Err(e) = space.populate(count) {
                    warn!("{e}");
                }
                app.insert_resource(space);
            }
            Err(e) => error!("Space disabled: {e}"),
        }
    }
}

fn forward_disturbance_triggers(
    mut triggers: MessageReader<TriggerDisturbance>,
    space: Option<Res<Space>>,
) {
    let Some(space) = space else {
        return;
    };
    for trigger in triggers.read() {
        space.trigger_disturbance(trigger.0);
    }
}

fn advance_space(
    space: Option<ResMut<Space>>,
    intent: Res<NavigationIntent>,
    mut clock: ResMut<SimulationClock>,
) {
    let Some(mut space) = space else {
        return;
    };
    if clock.paused {
        return;
    }
    let report = space.tick(&intent);
    clock.tick = report.tick;
}

fn publish_snapshot(space: Option<Res<Space>>, mut view: ResMut<SpaceView>) {
    if let Some(space) = space {
        view.snapshot = space.snapshot();
    }
}
