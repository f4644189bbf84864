//! Allocation engine: matches pending orders to available drones.
//!
//! Allocation runs in three passes:
//!
//! 1. **Single-order pass**: each pending order (priority first, oldest
//!    first) goes to the best capable drone that has not been used in this
//!    run. Capability is checked against the base, customer, drop-off, base
//!    leg sum, then against the planner's actual route.
//! 2. **Grouping pass**: orders left over are merged into existing
//!    allocations where the combined weight and the recomputed round-trip
//!    distance stay feasible, preferring the smallest resulting route.
//! 3. **Consolidation pass**: if a drone somehow ended up with several
//!    allocation entries, its orders are greedily re-packed into batches
//!    that respect both constraints.
//!
//! The single-order pass checks range against the one-way route distance
//! while the grouping and consolidation passes double it. The asymmetry is
//! intentional, kept for behavioral fidelity with the deployed engine.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use skyfleet_domain::geo::{distance, route_distance, Coordinate, Obstacle};
use skyfleet_domain::{Drone, Order, OrderStatus};

use crate::route::plan_route;

/// One drone's assignment: a non-empty order batch plus its planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub drone_id: Uuid,
    pub orders: Vec<Order>,
    pub route: Vec<Coordinate>,
    pub total_weight: f64,
    pub total_distance: f64,
}

/// Matches pending orders to available drones around a fixed base.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    base_location: Coordinate,
    obstacles: Vec<Obstacle>,
}

impl AllocationEngine {
    pub fn new(base_location: Coordinate, obstacles: Vec<Obstacle>) -> Self {
        Self {
            base_location,
            obstacles,
        }
    }

    /// Produce allocations for the current pending orders and fleet.
    ///
    /// Empty inputs and infeasible orders are not errors: the result simply
    /// omits what could not be assigned.
    pub fn allocate(&self, orders: &[Order], drones: &[Drone]) -> Vec<Allocation> {
        let available: Vec<&Drone> = drones
            .iter()
            .filter(|d| {
                let available = d.is_available();
                if !available {
                    debug!(
                        drone = %d.name,
                        state = ?d.current_state,
                        battery = d.battery_level,
                        "drone not available"
                    );
                }
                available
            })
            .collect();

        if available.is_empty() {
            info!(total = drones.len(), "no available drones");
            return vec![];
        }

        let mut pending: Vec<&Order> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .collect();
        pending.sort_by(|a, b| {
            b.priority
                .value()
                .cmp(&a.priority.value())
                .then(a.created_at.cmp(&b.created_at))
        });

        info!(
            drones = available.len(),
            orders = pending.len(),
            "running allocation"
        );

        let mut allocations: Vec<Allocation> = Vec::new();
        let mut used_drones: HashSet<Uuid> = HashSet::new();
        let mut deferred: Vec<&Order> = Vec::new();

        // Single-order pass: one order per fresh drone.
        for &order in &pending {
            let fresh: Vec<&Drone> = available
                .iter()
                .copied()
                .filter(|d| !used_drones.contains(&d.id))
                .collect();

            if fresh.is_empty() {
                deferred.push(order);
                continue;
            }

            match self.find_best_drone_for_order(order, &fresh) {
                Some(allocation) => {
                    debug!(order = %order.id, drone = %allocation.drone_id, "order assigned");
                    used_drones.insert(allocation.drone_id);
                    allocations.push(allocation);
                }
                None => {
                    debug!(order = %order.id, "no fresh drone capable, deferring to grouping");
                    deferred.push(order);
                }
            }
        }

        // Grouping pass: merge deferred orders into existing allocations.
        if !deferred.is_empty() && !allocations.is_empty() {
            let drones_by_id: HashMap<Uuid, &Drone> =
                available.iter().map(|d| (d.id, *d)).collect();

            for &order in &deferred {
                let mut best: Option<(usize, Allocation)> = None;

                for (i, existing) in allocations.iter().enumerate() {
                    let Some(drone) = drones_by_id.get(&existing.drone_id) else {
                        continue;
                    };
                    let new_weight = existing.total_weight + order.weight;
                    if !drone.can_carry(new_weight) {
                        continue;
                    }

                    let destinations: Vec<Coordinate> = existing
                        .orders
                        .iter()
                        .map(|o| o.customer_location)
                        .chain(std::iter::once(order.customer_location))
                        .collect();
                    let new_route =
                        plan_route(self.base_location, &destinations, &self.obstacles);
                    let new_distance = route_distance(&new_route);

                    if drone.can_reach(new_distance * 2.0)
                        && best
                            .as_ref()
                            .is_none_or(|(_, b)| new_distance < b.total_distance)
                    {
                        let mut merged_orders = existing.orders.clone();
                        merged_orders.push(order.clone());
                        best = Some((
                            i,
                            Allocation {
                                drone_id: existing.drone_id,
                                orders: merged_orders,
                                route: new_route,
                                total_weight: new_weight,
                                total_distance: new_distance,
                            },
                        ));
                    }
                }

                match best {
                    Some((i, merged)) => {
                        debug!(order = %order.id, drone = %merged.drone_id, "order grouped");
                        allocations[i] = merged;
                    }
                    None => {
                        debug!(order = %order.id, "order could not be grouped, left unassigned");
                    }
                }
            }
        }

        let final_allocations = self.consolidate(allocations, drones);
        info!(allocations = final_allocations.len(), "allocation complete");
        final_allocations
    }

    /// Best capable fresh drone for a single order, or `None` when no drone
    /// can take it.
    fn find_best_drone_for_order(&self, order: &Order, drones: &[&Drone]) -> Option<Allocation> {
        let customer = order.customer_location;
        let dropoff = order.delivery_location();

        // Feasibility proxy: base -> customer -> drop-off -> base.
        let total_routing_distance = distance(self.base_location, customer)
            + distance(customer, dropoff)
            + distance(dropoff, self.base_location);

        let capable: Vec<&Drone> = drones
            .iter()
            .copied()
            .filter(|d| d.can_carry(order.weight) && d.can_reach(total_routing_distance))
            .collect();

        if capable.is_empty() {
            debug!(
                order = %order.id,
                weight = order.weight,
                routing_distance = total_routing_distance,
                "no capable drone"
            );
            return None;
        }

        // Prefer higher battery, then fewer historical deliveries; the
        // first candidate wins full ties.
        let best = capable.iter().copied().reduce(|best, current| {
            if current.battery_level > best.battery_level {
                current
            } else if current.battery_level == best.battery_level
                && current.total_deliveries < best.total_deliveries
            {
                current
            } else {
                best
            }
        })?;

        let destinations = if dropoff == customer {
            vec![customer]
        } else {
            vec![customer, dropoff]
        };
        let route = plan_route(self.base_location, &destinations, &self.obstacles);
        let route_dist = route_distance(&route);

        if !best.can_reach(route_dist) {
            debug!(
                order = %order.id,
                drone = %best.name,
                route_distance = route_dist,
                "selected drone cannot reach planned route"
            );
            return None;
        }

        Some(Allocation {
            drone_id: best.id,
            orders: vec![order.clone()],
            route,
            total_weight: order.weight,
            total_distance: route_dist,
        })
    }

    /// Re-pack allocations when a drone ended up with more than one entry.
    /// A no-op whenever every allocation already maps to a distinct drone.
    fn consolidate(&self, allocations: Vec<Allocation>, drones: &[Drone]) -> Vec<Allocation> {
        if allocations.is_empty() {
            return allocations;
        }

        let unique_drones: HashSet<Uuid> = allocations.iter().map(|a| a.drone_id).collect();
        if allocations.len() == unique_drones.len() {
            return allocations;
        }

        let drones_by_id: HashMap<Uuid, &Drone> = drones.iter().map(|d| (d.id, d)).collect();

        // Group allocations per drone, preserving first-seen drone order.
        let mut drone_order: Vec<Uuid> = Vec::new();
        let mut per_drone: HashMap<Uuid, Vec<Allocation>> = HashMap::new();
        for allocation in allocations {
            if !per_drone.contains_key(&allocation.drone_id) {
                drone_order.push(allocation.drone_id);
            }
            per_drone.entry(allocation.drone_id).or_default().push(allocation);
        }

        let mut consolidated: Vec<Allocation> = Vec::new();

        for drone_id in drone_order {
            let mut entries = per_drone.remove(&drone_id).unwrap_or_default();
            if entries.len() == 1 {
                consolidated.extend(entries);
                continue;
            }
            let Some(drone) = drones_by_id.get(&drone_id) else {
                consolidated.append(&mut entries);
                continue;
            };

            // Greedily pack the drone's orders into feasible batches,
            // splitting whenever weight or round-trip range would break.
            let orders: Vec<Order> = entries.into_iter().flat_map(|a| a.orders).collect();
            let mut batch: Vec<Order> = Vec::new();
            let mut batch_weight = 0.0;

            for order in orders {
                let new_weight = batch_weight + order.weight;

                if !drone.can_carry(new_weight) {
                    if !batch.is_empty() {
                        consolidated.push(self.build_allocation(drone_id, std::mem::take(&mut batch)));
                        batch_weight = 0.0;
                    }
                    // The order alone may still fit within range.
                    let solo = self.build_allocation(drone_id, vec![order]);
                    if drone.can_reach(solo.total_distance * 2.0) {
                        consolidated.push(solo);
                    }
                    continue;
                }

                let mut candidate = batch.clone();
                candidate.push(order.clone());
                let test = self.build_allocation(drone_id, candidate);

                if drone.can_reach(test.total_distance * 2.0) {
                    batch.push(order);
                    batch_weight = new_weight;
                } else {
                    if !batch.is_empty() {
                        consolidated.push(self.build_allocation(drone_id, std::mem::take(&mut batch)));
                    }
                    batch_weight = order.weight;
                    batch = vec![order];
                }
            }

            if !batch.is_empty() {
                consolidated.push(self.build_allocation(drone_id, batch));
            }
        }

        consolidated
    }

    fn build_allocation(&self, drone_id: Uuid, orders: Vec<Order>) -> Allocation {
        let destinations: Vec<Coordinate> =
            orders.iter().map(|o| o.customer_location).collect();
        let route = plan_route(self.base_location, &destinations, &self.obstacles);
        let total_distance = route_distance(&route);
        let total_weight = orders.iter().map(|o| o.weight).sum();
        Allocation {
            drone_id,
            orders,
            route,
            total_weight,
            total_distance,
        }
    }
}
