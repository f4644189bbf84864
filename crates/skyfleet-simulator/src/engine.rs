//! Discrete-tick simulation engine.
//!
//! Owns the authoritative in-memory fleet state and advances every drone
//! through its flight cycle once per tick. Each state change is mirrored
//! to the repository on a best-effort basis: a failed write is logged and
//! the simulation keeps going from in-memory state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use skyfleet_domain::{
    distance, Coordinate, Delivery, DeliveryStatus, Drone, DroneState, OrderStatus,
};
use skyfleet_persistence::{
    DeliveryRepository, DroneRepository, DroneUpdate, OrderRepository,
};

use crate::stats::FleetStats;

/// Distance a drone covers in one tick.
pub const STEP_DISTANCE: f64 = 20.0;

/// A waypoint counts as reached within this distance of it.
pub const REACH_EPSILON: f64 = 1.0;

/// Ticks a drone holds at the delivery destination before heading home.
pub const DELIVERING_DWELL_TICKS: u32 = 2;

/// Tick-driven fleet simulator over any repository backend.
pub struct SimulationEngine<R> {
    repo: Arc<R>,
    drones: HashMap<Uuid, Drone>,
    deliveries: HashMap<Uuid, Delivery>,
    /// Next unvisited waypoint index per drone, keyed by drone id.
    route_cursors: HashMap<Uuid, usize>,
    /// Ticks spent at the destination per drone, keyed by drone id.
    dwell_counters: HashMap<Uuid, u32>,
}

impl<R> SimulationEngine<R>
where
    R: DroneRepository + OrderRepository + DeliveryRepository,
{
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            drones: HashMap::new(),
            deliveries: HashMap::new(),
            route_cursors: HashMap::new(),
            dwell_counters: HashMap::new(),
        }
    }

    /// Bring a drone under simulation control.
    pub fn register_drone(&mut self, drone: Drone) {
        debug!(drone = %drone.id, name = %drone.name, "drone registered");
        self.drones.insert(drone.id, drone);
    }

    /// Drop a drone and every delivery assigned to it.
    pub fn remove_drone(&mut self, id: Uuid) {
        if self.drones.remove(&id).is_some() {
            self.deliveries.retain(|_, d| d.drone_id != id);
            self.route_cursors.remove(&id);
            self.dwell_counters.remove(&id);
            info!(drone = %id, "drone removed from simulation");
        }
    }

    /// Hand a scheduled delivery to its drone. The drone starts flying it
    /// on subsequent ticks.
    pub fn register_delivery(&mut self, delivery: Delivery) {
        if let Some(drone) = self.drones.get_mut(&delivery.drone_id) {
            drone.assign_delivery(delivery.id);
        } else {
            warn!(
                delivery = %delivery.id,
                drone = %delivery.drone_id,
                "delivery registered for a drone the engine does not track"
            );
        }
        // route[0] is the start point the drone is already standing on;
        // the first flying tick heads straight for the first destination.
        self.route_cursors.insert(delivery.drone_id, 1);
        debug!(delivery = %delivery.id, drone = %delivery.drone_id, "delivery registered");
        self.deliveries.insert(delivery.id, delivery);
    }

    /// Drop every delivery still in the scheduled state and release its
    /// drone, so the next allocation round starts from a clean slate.
    /// Deliveries already in flight are untouched.
    pub fn clear_scheduled_deliveries(&mut self) {
        let stale: Vec<Uuid> = self
            .deliveries
            .values()
            .filter(|d| d.status == DeliveryStatus::Scheduled)
            .map(|d| d.id)
            .collect();

        for id in &stale {
            if let Some(delivery) = self.deliveries.remove(id) {
                if let Some(drone) = self.drones.get_mut(&delivery.drone_id) {
                    if drone.current_delivery == Some(delivery.id) {
                        drone.clear_delivery();
                    }
                }
                self.route_cursors.remove(&delivery.drone_id);
            }
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "scheduled deliveries cleared");
        }
    }

    #[must_use]
    pub fn drone(&self, id: Uuid) -> Option<&Drone> {
        self.drones.get(&id)
    }

    pub fn drones(&self) -> impl Iterator<Item = &Drone> {
        self.drones.values()
    }

    #[must_use]
    pub fn delivery(&self, id: Uuid) -> Option<&Delivery> {
        self.deliveries.get(&id)
    }

    pub fn deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.values()
    }

    /// Fleet-wide statistics over the current engine state.
    #[must_use]
    pub fn stats(&self) -> FleetStats {
        FleetStats::compute(self.drones.values(), self.deliveries.values())
    }

    /// Advance every drone by one tick.
    pub async fn tick(&mut self) {
        let ids: Vec<Uuid> = self.drones.keys().copied().collect();
        for id in ids {
            self.advance_drone(id).await;
        }
    }

    async fn advance_drone(&mut self, drone_id: Uuid) {
        let Some(drone) = self.drones.get_mut(&drone_id) else {
            return;
        };

        let Some(delivery_id) = drone.current_delivery else {
            // No work: settle to idle and recharge once back at base.
            let mut dirty = false;
            if drone.current_state != DroneState::Idle {
                drone.set_state(DroneState::Idle);
                dirty = true;
            }
            if drone.needs_recharge() && drone.is_at_base() {
                drone.recharge();
                debug!(drone = %drone_id, "drone recharged at base");
                dirty = true;
            }
            if dirty {
                Self::persist_drone(&self.repo, drone).await;
            }
            return;
        };

        if !self.deliveries.contains_key(&delivery_id) {
            warn!(
                drone = %drone_id,
                delivery = %delivery_id,
                "assigned delivery is unknown to the engine, holding position"
            );
            return;
        }

        match drone.current_state {
            DroneState::Idle => {
                drone.set_state(DroneState::Loading);
                debug!(drone = %drone_id, delivery = %delivery_id, "loading");
                Self::persist_drone(&self.repo, drone).await;
            }
            DroneState::Loading => {
                drone.set_state(DroneState::Flying);
                if let Some(delivery) = self.deliveries.get_mut(&delivery_id) {
                    delivery.start();
                    let started_at = delivery.started_at.unwrap_or_else(Utc::now);
                    info!(drone = %drone_id, delivery = %delivery_id, "departed");
                    if let Err(err) = self
                        .repo
                        .set_delivery_started(delivery_id, started_at)
                        .await
                    {
                        warn!(delivery = %delivery_id, %err, "failed to persist delivery start");
                    }
                    if let Err(err) = self
                        .repo
                        .update_delivery_status(delivery_id, DeliveryStatus::InProgress, None)
                        .await
                    {
                        warn!(delivery = %delivery_id, %err, "failed to persist delivery status");
                    }
                }
                Self::persist_drone(&self.repo, drone).await;
            }
            DroneState::Flying => {
                let Some(delivery) = self.deliveries.get_mut(&delivery_id) else {
                    return;
                };
                if delivery.route.len() < 2 {
                    warn!(delivery = %delivery_id, "degenerate route, returning to base");
                    drone.set_state(DroneState::Returning);
                    Self::persist_drone(&self.repo, drone).await;
                    return;
                }

                let cursor = self.route_cursors.entry(drone_id).or_insert(1);
                if *cursor >= delivery.route.len() {
                    drone.set_state(DroneState::Returning);
                    Self::persist_drone(&self.repo, drone).await;
                    return;
                }

                let target = delivery.route[*cursor];
                let remaining = distance(drone.current_location, target);
                if remaining <= REACH_EPSILON {
                    drone.set_location(target);
                    let reached = *cursor;
                    *cursor += 1;

                    let last = delivery.route.len() - 1;
                    if reached == last {
                        // Route exhausted without a stop, head home.
                        drone.set_state(DroneState::Returning);
                    } else if reached == last - 1 && reached > 0 {
                        // Final stop before the return leg: the destination.
                        drone.set_state(DroneState::Delivering);
                        self.dwell_counters.insert(drone_id, 0);
                        info!(drone = %drone_id, delivery = %delivery_id, "arrived at destination");

                        for order in &mut delivery.orders {
                            order.deliver();
                        }
                        let order_ids: Vec<Uuid> =
                            delivery.orders.iter().map(|o| o.id).collect();
                        for order_id in order_ids {
                            if let Err(err) = self
                                .repo
                                .update_order_status(order_id, OrderStatus::Delivered)
                                .await
                            {
                                warn!(order = %order_id, %err, "failed to persist order status");
                            }
                        }
                    }
                } else {
                    let step = STEP_DISTANCE.min(remaining);
                    let here = drone.current_location;
                    let ratio = step / remaining;
                    drone.set_location(Coordinate::new(
                        here.x + (target.x - here.x) * ratio,
                        here.y + (target.y - here.y) * ratio,
                    ));
                }
                Self::persist_drone(&self.repo, drone).await;
            }
            DroneState::Delivering => {
                let ticks = self.dwell_counters.entry(drone_id).or_insert(0);
                *ticks += 1;
                if *ticks >= DELIVERING_DWELL_TICKS {
                    self.dwell_counters.remove(&drone_id);
                    drone.set_state(DroneState::Returning);
                    debug!(drone = %drone_id, delivery = %delivery_id, "returning to base");
                    Self::persist_drone(&self.repo, drone).await;
                } else {
                    debug!(drone = %drone_id, delivery = %delivery_id, "unloading");
                }
            }
            DroneState::Returning => {
                if drone.current_location == drone.base_location {
                    self.complete_delivery(drone_id, delivery_id).await;
                } else {
                    let base = drone.base_location;
                    let remaining = distance(drone.current_location, base);
                    if remaining <= REACH_EPSILON {
                        drone.set_location(base);
                    } else {
                        let step = STEP_DISTANCE.min(remaining);
                        let here = drone.current_location;
                        let ratio = step / remaining;
                        drone.set_location(Coordinate::new(
                            here.x + (base.x - here.x) * ratio,
                            here.y + (base.y - here.y) * ratio,
                        ));
                    }
                    Self::persist_drone(&self.repo, drone).await;
                }
            }
        }
    }

    async fn complete_delivery(&mut self, drone_id: Uuid, delivery_id: Uuid) {
        let Some(drone) = self.drones.get_mut(&drone_id) else {
            return;
        };
        let Some(delivery) = self.deliveries.get_mut(&delivery_id) else {
            return;
        };

        // The planned route is flown out and back.
        let flown = delivery.total_distance * 2.0;
        drone.complete_delivery(flown);
        drone.set_state(DroneState::Idle);
        delivery.complete();
        self.route_cursors.remove(&drone_id);

        info!(
            drone = %drone_id,
            delivery = %delivery_id,
            distance = flown,
            battery = drone.battery_level,
            "delivery completed"
        );

        let completed_at = delivery.completed_at.unwrap_or_else(Utc::now);
        Self::persist_drone(&self.repo, drone).await;
        if let Err(err) = self
            .repo
            .update_delivery_status(delivery_id, DeliveryStatus::Completed, Some(completed_at))
            .await
        {
            warn!(delivery = %delivery_id, %err, "failed to persist delivery completion");
        }
    }

    async fn persist_drone(repo: &Arc<R>, drone: &Drone) {
        if let Err(err) = repo.update_drone(drone.id, DroneUpdate::from_drone(drone)).await {
            warn!(drone = %drone.id, %err, "failed to persist drone state");
        }
    }
}
