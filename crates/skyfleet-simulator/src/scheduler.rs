//! Timer loop driving the simulation engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use skyfleet_persistence::{DeliveryRepository, DroneRepository, OrderRepository};

use crate::engine::SimulationEngine;

/// Runs the engine's tick on a fixed interval in a background task.
///
/// At most one timer runs at a time. Stopping signals the loop rather
/// than aborting it, so a tick in flight always finishes before the
/// timer winds down.
pub struct TickScheduler<R> {
    engine: Arc<Mutex<SimulationEngine<R>>>,
    timer: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl<R> TickScheduler<R>
where
    R: DroneRepository + OrderRepository + DeliveryRepository + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(engine: SimulationEngine<R>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            timer: None,
        }
    }

    /// Shared handle to the engine for inspection and mutation between
    /// ticks.
    #[must_use]
    pub fn engine(&self) -> Arc<Mutex<SimulationEngine<R>>> {
        Arc::clone(&self.engine)
    }

    /// Start ticking at the given interval. Restarting replaces the
    /// running timer.
    pub fn start(&mut self, interval: Duration) {
        self.stop();

        let engine = Arc::clone(&self.engine);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        engine.lock().await.tick().await;
                    }
                }
            }
        });
        self.timer = Some((stop_tx, handle));
        info!(interval_ms = interval.as_millis() as u64, "simulation timer started");
    }

    /// Stop the timer. No-op when it is not running.
    pub fn stop(&mut self) {
        if let Some((stop_tx, _handle)) = self.timer.take() {
            let _ = stop_tx.send(true);
            info!("simulation timer stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    /// Advance the simulation by exactly one tick, outside the timer.
    pub async fn step_once(&self) {
        self.engine.lock().await.tick().await;
    }
}

impl<R> Drop for TickScheduler<R> {
    fn drop(&mut self) {
        if let Some((stop_tx, _)) = self.timer.take() {
            let _ = stop_tx.send(true);
        }
    }
}
