//! Background thread that fires random disturbances.
//!
//! The generator never touches bodies. It sleeps for a random interval, then
//! enqueues a random [`DisturbanceKind`] onto a [`DisturbanceQueue`]; the
//! space applies it at its next tick boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bevy::log::{info, warn};
use bevy::prelude::Resource;
use rand::Rng;

use super::DisturbanceQueue;
use crate::types::DisturbanceKind;

/// Sleep bounds between two generated disturbances.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(3),
            max_interval: Duration::from_secs(10),
        }
    }
}

impl GeneratorConfig {
    fn sample(&self, rng: &mut impl Rng) -> Duration {
        let lo = self.min_interval.min(self.max_interval);
        let hi = self.min_interval.max(self.max_interval);
        if lo == hi {
            return lo;
        }
        rng.gen_range(lo..=hi)
    }
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Start/stop handle for the disturbance thread.
///
/// Each start spawns a fresh thread with its own stop flag, so a thread that
/// is still finishing its last sleep after `stop` can never be revived.
#[derive(Resource)]
pub struct AutoDisturbanceGenerator {
    queue: DisturbanceQueue,
    config: GeneratorConfig,
    worker: Option<Worker>,
}

impl AutoDisturbanceGenerator {
    pub fn new(queue: DisturbanceQueue, config: GeneratorConfig) -> Self {
        Self {
            queue,
            config,
            worker: None,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the thread. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.worker.is_some() {
            return false;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let queue = self.queue.clone();
        let config = self.config.clone();

        let spawned = thread::Builder::new()
            .name("disturbance-generator".into())
            .spawn(move || run(queue, config, flag));

        match spawned {
            Ok(handle) => {
                info!(
                    "Auto disturbances started ({:?}..={:?})",
                    self.config.min_interval, self.config.max_interval
                );
                self.worker = Some(Worker { stop, handle });
                true
            }
            Err(e) => {
                warn!("Failed to spawn disturbance generator: {e}");
                false
            }
        }
    }

    /// Ask the thread to exit after its current sleep. Returns `false` if it
    /// was not running.
    ///
    /// Does not wait for the thread; it checks the flag before every send.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };
        worker.stop.store(true, Ordering::Release);
        if worker.handle.is_finished() && worker.handle.join().is_err() {
            warn!("Disturbance generator thread panicked");
        }
        info!("Auto disturbances stopped");
        true
    }
}

impl Drop for AutoDisturbanceGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(queue: DisturbanceQueue, config: GeneratorConfig, stop: Arc<AtomicBool>) {
    let mut rng = rand::thread_rng();
    loop {
        thread::sleep(config.sample(&mut rng));
        if stop.load(Ordering::Acquire) {
            break;
        }
        let kind = DisturbanceKind::ALL[rng.gen_range(0..DisturbanceKind::ALL.len())];
        if !queue.send(kind) {
            // Space is gone
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> GeneratorConfig {
        GeneratorConfig {
            min_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let (tx, _rx) = crossbeam::channel::unbounded();
        let mut generator = AutoDisturbanceGenerator::new(DisturbanceQueue::new(tx), quick());

        assert!(!generator.stop());
        assert!(generator.start());
        assert!(!generator.start());
        assert!(generator.is_running());
        assert!(generator.stop());
        assert!(!generator.stop());
        assert!(!generator.is_running());
    }

    #[test]
    fn test_running_generator_produces_triggers() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let mut generator = AutoDisturbanceGenerator::new(DisturbanceQueue::new(tx), quick());
        generator.start();

        let kind = rx.recv_timeout(Duration::from_secs(2));
        generator.stop();
        assert!(kind.is_ok());
    }

    #[test]
    fn test_stop_reaps_a_finished_worker() {
        let (tx, rx) = crossbeam::channel::unbounded();
        drop(rx);
        let mut generator = AutoDisturbanceGenerator::new(DisturbanceQueue::new(tx), quick());
        assert_eq!(generator.config().max_interval, Duration::from_millis(10));

        assert!(generator.start());
        // The worker exits on its first failed send
        thread::sleep(Duration::from_millis(200));
        assert!(generator.stop());
        assert!(!generator.is_running());
    }

    #[test]
    fn test_sample_respects_bounds() {
        let config = GeneratorConfig {
            min_interval: Duration::from_millis(40),
            max_interval: Duration::from_millis(20),
        };
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let d = config.sample(&mut rng);
            assert!(d >= Duration::from_millis(20) && d <= Duration::from_millis(40));
        }
    }
}
