//! Satsim - headless driver
//!
//! Runs the satellite arena without a window, with automatic disturbances
//! and a periodic status line in the log.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use satsim::disturbance::{AutoDisturbanceGenerator, GeneratorConfig};
use satsim::space::{Space, SpacePlugin, SpaceView};
use satsim::types::SimulationClock;

/// Ticks between two status lines.
const STATUS_INTERVAL: u64 = 300;

fn main() {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(SpacePlugin::default())
        .add_systems(Startup, start_generator)
        .add_systems(FixedPostUpdate, log_status)
        .run();
}

fn start_generator(mut commands: Commands, space: Option<Res<Space>>) {
    let Some(space) = space else {
        warn!("No space to disturb");
        return;
    };
    let mut generator =
        AutoDisturbanceGenerator::new(space.disturbance_queue(), GeneratorConfig::default());
    generator.start();
    commands.insert_resource(generator);
}

fn log_status(clock: Res<SimulationClock>, view: Res<SpaceView>) {
    if !clock.is_changed() || clock.tick == 0 || clock.tick % STATUS_INTERVAL != 0 {
        return;
    }
    let snapshot = &view.snapshot;
    info!(
        "Tick {}: {} bodies, {} crashed",
        clock.tick,
        snapshot.bodies.len(),
        snapshot.crashed_count()
    );
}
