//! Abstract repository interfaces for domain entities.
//!
//! Implementations can be swapped for different backends (in-memory,
//! embedded database, mock). All entity fields cross this boundary as
//! plain snapshots; behavior stays in the domain crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use skyfleet_domain::{
    Coordinate, Delivery, DeliveryStatus, Drone, DroneState, Order, OrderStatus,
};

/// Partial update of a drone's mutable fields. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct DroneUpdate {
    pub battery_level: Option<f64>,
    pub current_state: Option<DroneState>,
    pub current_location: Option<Coordinate>,
    pub total_deliveries: Option<u64>,
    pub total_distance: Option<f64>,
}

impl DroneUpdate {
    /// Snapshot every mutable field of a drone.
    #[must_use]
    pub fn from_drone(drone: &Drone) -> Self {
        Self {
            battery_level: Some(drone.battery_level),
            current_state: Some(drone.current_state),
            current_location: Some(drone.current_location),
            total_deliveries: Some(drone.total_deliveries),
            total_distance: Some(drone.total_distance),
        }
    }
}

/// Repository for Order entity operations
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order snapshot
    async fn create_order(&self, order: &Order) -> Result<()>;

    /// All stored orders
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Update an order's lifecycle status
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<()>;
}

/// Repository for Drone entity operations
#[async_trait]
pub trait DroneRepository: Send + Sync {
    /// Persist a new drone snapshot
    async fn create_drone(&self, drone: &Drone) -> Result<()>;

    /// All stored drones
    async fn list_drones(&self) -> Result<Vec<Drone>>;

    /// Apply a partial update to a drone's mutable fields
    async fn update_drone(&self, id: Uuid, update: DroneUpdate) -> Result<()>;

    /// Remove a drone
    async fn delete_drone(&self, id: Uuid) -> Result<()>;
}

/// Repository for Delivery entity operations
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Persist a new delivery snapshot. Idempotent: a delivery whose id
    /// already exists is left untouched.
    async fn create_delivery(&self, delivery: &Delivery) -> Result<()>;

    /// All stored deliveries
    async fn list_deliveries(&self) -> Result<Vec<Delivery>>;

    /// Update a delivery's status, optionally stamping its completion time
    async fn update_delivery_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Stamp a delivery's start time
    async fn set_delivery_started(&self, id: Uuid, started_at: DateTime<Utc>) -> Result<()>;
}
