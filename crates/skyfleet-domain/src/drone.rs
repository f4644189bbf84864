//! Drone entity: one vehicle with capacity, range, battery, and lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, Result};
use crate::geo::Coordinate;

/// Battery level at or below which a drone is held back from new work.
pub const LOW_BATTERY_THRESHOLD: f64 = 20.0;

/// Flight cycle states. A drone cycles IDLE → LOADING → FLYING →
/// DELIVERING → RETURNING → IDLE once per delivery, indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneState {
    Idle,
    Loading,
    Flying,
    Delivering,
    Returning,
}

/// One autonomous delivery vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: Uuid,
    pub name: String,
    /// Maximum payload weight. Immutable after creation.
    pub max_weight: f64,
    /// Maximum route distance. Immutable after creation.
    pub max_distance: f64,
    /// Battery charge in [0, 100].
    pub battery_level: f64,
    pub current_state: DroneState,
    pub current_location: Coordinate,
    /// Home base; fixed at creation. Routes start and end here.
    pub base_location: Coordinate,
    /// The at-most-one active delivery this drone is executing.
    pub current_delivery: Option<Uuid>,
    pub total_deliveries: u64,
    pub total_distance: f64,
    pub created_at: DateTime<Utc>,
}

impl Drone {
    /// Create an idle drone at its base with a full battery.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        max_weight: f64,
        max_distance: f64,
        base_location: Coordinate,
    ) -> Result<Self> {
        let name = name.into();
        if max_weight <= 0.0 || max_distance <= 0.0 {
            return Err(DomainError::InvalidCapacity {
                name,
                max_weight,
                max_distance,
            });
        }
        if !base_location.is_finite() {
            return Err(DomainError::InvalidCoordinates {
                x: base_location.x,
                y: base_location.y,
            });
        }

        Ok(Self {
            id,
            name,
            max_weight,
            max_distance,
            battery_level: 100.0,
            current_state: DroneState::Idle,
            current_location: base_location,
            base_location,
            current_delivery: None,
            total_deliveries: 0,
            total_distance: 0.0,
            created_at: Utc::now(),
        })
    }

    pub fn set_state(&mut self, state: DroneState) {
        self.current_state = state;
    }

    pub fn set_location(&mut self, location: Coordinate) {
        self.current_location = location;
    }

    /// Drain battery by one unit per distance unit flown, floored at zero.
    pub fn consume_battery(&mut self, distance: f64) {
        self.battery_level = (self.battery_level - distance).max(0.0);
    }

    /// Reset battery to full. Idempotent.
    pub fn recharge(&mut self) {
        self.battery_level = 100.0;
    }

    #[must_use]
    pub fn can_carry(&self, weight: f64) -> bool {
        weight <= self.max_weight
    }

    #[must_use]
    pub fn can_reach(&self, distance: f64) -> bool {
        distance <= self.max_distance
    }

    /// Available for new work: no active delivery, idle, and battery
    /// above the low-battery threshold.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.current_delivery.is_none()
            && self.current_state == DroneState::Idle
            && self.battery_level > LOW_BATTERY_THRESHOLD
    }

    #[must_use]
    pub fn needs_recharge(&self) -> bool {
        self.battery_level < LOW_BATTERY_THRESHOLD
    }

    #[must_use]
    pub fn is_at_base(&self) -> bool {
        self.current_location == self.base_location
    }

    pub fn assign_delivery(&mut self, delivery_id: Uuid) {
        self.current_delivery = Some(delivery_id);
    }

    pub fn clear_delivery(&mut self) {
        self.current_delivery = None;
    }

    /// Book a finished delivery: bump the counters, drain battery by the
    /// flown distance, and release the delivery reference.
    pub fn complete_delivery(&mut self, distance: f64) {
        self.total_deliveries += 1;
        self.total_distance += distance;
        self.consume_battery(distance);
        self.current_delivery = None;
    }

    /// Distance flown per completed delivery; lower is better. Zero until
    /// the first delivery completes.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        if self.total_deliveries > 0 {
            self.total_distance / self.total_deliveries as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drone() -> Drone {
        Drone::new(
            Uuid::new_v4(),
            "Drone Alpha",
            10.0,
            50.0,
            Coordinate::new(0.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_create_valid_drone() {
        let drone = drone();
        assert_eq!(drone.name, "Drone Alpha");
        assert_eq!(drone.current_state, DroneState::Idle);
        assert_eq!(drone.battery_level, 100.0);
        assert_eq!(drone.current_location, drone.base_location);
    }

    #[test]
    fn test_rejects_non_positive_capacity() {
        let base = Coordinate::new(0.0, 0.0);
        assert!(Drone::new(Uuid::new_v4(), "bad", 0.0, 50.0, base).is_err());
        assert!(Drone::new(Uuid::new_v4(), "bad", 10.0, -1.0, base).is_err());
    }

    #[test]
    fn test_can_carry_boundary() {
        let drone = drone();
        assert!(drone.can_carry(5.0));
        assert!(drone.can_carry(10.0));
        assert!(!drone.can_carry(11.0));
    }

    #[test]
    fn test_can_reach_boundary() {
        let drone = drone();
        assert!(drone.can_reach(50.0));
        assert!(!drone.can_reach(51.0));
    }

    #[test]
    fn test_consume_battery_floors_at_zero() {
        let mut drone = drone();
        drone.consume_battery(10.0);
        assert_eq!(drone.battery_level, 90.0);
        drone.consume_battery(500.0);
        assert_eq!(drone.battery_level, 0.0);
    }

    #[test]
    fn test_recharge_idempotent() {
        let mut drone = drone();
        drone.recharge();
        assert_eq!(drone.battery_level, 100.0);
        drone.consume_battery(50.0);
        drone.recharge();
        assert_eq!(drone.battery_level, 100.0);
    }

    #[test]
    fn test_availability_predicate() {
        let mut drone = drone();
        assert!(drone.is_available());

        drone.set_state(DroneState::Flying);
        assert!(!drone.is_available());

        drone.set_state(DroneState::Idle);
        drone.consume_battery(85.0); // battery 15, below threshold
        assert!(!drone.is_available());

        drone.recharge();
        drone.assign_delivery(Uuid::new_v4());
        assert!(!drone.is_available());
    }

    #[test]
    fn test_battery_exactly_at_threshold_is_unavailable() {
        let mut drone = drone();
        drone.consume_battery(80.0);
        assert_eq!(drone.battery_level, LOW_BATTERY_THRESHOLD);
        assert!(!drone.is_available());
        assert!(!drone.needs_recharge());
    }

    #[test]
    fn test_complete_delivery_updates_stats() {
        let mut drone = drone();
        drone.assign_delivery(Uuid::new_v4());
        drone.complete_delivery(20.0);

        assert_eq!(drone.total_deliveries, 1);
        assert_eq!(drone.total_distance, 20.0);
        assert_eq!(drone.battery_level, 80.0);
        assert!(drone.current_delivery.is_none());
        assert_eq!(drone.efficiency(), 20.0);
    }

    #[test]
    fn test_efficiency_zero_without_deliveries() {
        assert_eq!(drone().efficiency(), 0.0);
    }
}
