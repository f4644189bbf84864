//! In-memory repository backend.
//!
//! Reference implementation of the repository traits over
//! `tokio::sync::RwLock`-guarded maps. Used by the simulator binary and
//! as the test double everywhere a repository is needed.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{PersistenceError, Result};
use crate::repository::{
    DeliveryRepository, DroneRepository, DroneUpdate, OrderRepository,
};
use skyfleet_domain::{Delivery, DeliveryStatus, Drone, Order, OrderStatus};

/// Thread-safe in-memory store for entity snapshots.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
    drones: RwLock<HashMap<Uuid, Drone>>,
    deliveries: RwLock<HashMap<Uuid, Delivery>>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for MemoryRepository {
    async fn create_order(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(PersistenceError::DuplicateKey {
                entity_type: "order",
                key: order.id.to_string(),
            });
        }
        orders.insert(order.id, order.clone());
        debug!(order = %order.id, "order persisted");
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.orders.read().await.values().cloned().collect())
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(PersistenceError::NotFound {
            entity_type: "order",
            key: id.to_string(),
        })?;
        order.status = status;
        Ok(())
    }
}

#[async_trait]
impl DroneRepository for MemoryRepository {
    async fn create_drone(&self, drone: &Drone) -> Result<()> {
        let mut drones = self.drones.write().await;
        if drones.contains_key(&drone.id) {
            return Err(PersistenceError::DuplicateKey {
                entity_type: "drone",
                key: drone.id.to_string(),
            });
        }
        drones.insert(drone.id, drone.clone());
        debug!(drone = %drone.id, "drone persisted");
        Ok(())
    }

    async fn list_drones(&self) -> Result<Vec<Drone>> {
        Ok(self.drones.read().await.values().cloned().collect())
    }

    async fn update_drone(&self, id: Uuid, update: DroneUpdate) -> Result<()> {
        let mut drones = self.drones.write().await;
        let drone = drones.get_mut(&id).ok_or(PersistenceError::NotFound {
            entity_type: "drone",
            key: id.to_string(),
        })?;
        if let Some(battery) = update.battery_level {
            drone.battery_level = battery;
        }
        if let Some(state) = update.current_state {
            drone.current_state = state;
        }
        if let Some(location) = update.current_location {
            drone.current_location = location;
        }
        if let Some(deliveries) = update.total_deliveries {
            drone.total_deliveries = deliveries;
        }
        if let Some(distance) = update.total_distance {
            drone.total_distance = distance;
        }
        Ok(())
    }

    async fn delete_drone(&self, id: Uuid) -> Result<()> {
        self.drones
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::NotFound {
                entity_type: "drone",
                key: id.to_string(),
            })
    }
}

#[async_trait]
impl DeliveryRepository for MemoryRepository {
    async fn create_delivery(&self, delivery: &Delivery) -> Result<()> {
        let mut deliveries = self.deliveries.write().await;
        // Idempotent by contract: re-creating an existing id is a no-op.
        if deliveries.contains_key(&delivery.id) {
            debug!(delivery = %delivery.id, "delivery already persisted, skipping");
            return Ok(());
        }
        deliveries.insert(delivery.id, delivery.clone());
        debug!(delivery = %delivery.id, "delivery persisted");
        Ok(())
    }

    async fn list_deliveries(&self) -> Result<Vec<Delivery>> {
        Ok(self.deliveries.read().await.values().cloned().collect())
    }

    async fn update_delivery_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut deliveries = self.deliveries.write().await;
        let delivery = deliveries.get_mut(&id).ok_or(PersistenceError::NotFound {
            entity_type: "delivery",
            key: id.to_string(),
        })?;
        delivery.status = status;
        if completed_at.is_some() {
            delivery.completed_at = completed_at;
        }
        Ok(())
    }

    async fn set_delivery_started(&self, id: Uuid, started_at: DateTime<Utc>) -> Result<()> {
        let mut deliveries = self.deliveries.write().await;
        let delivery = deliveries.get_mut(&id).ok_or(PersistenceError::NotFound {
            entity_type: "delivery",
            key: id.to_string(),
        })?;
        delivery.started_at = Some(started_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfleet_domain::{Coordinate, DroneState, Priority};

    fn order() -> Order {
        Order::new(
            Uuid::new_v4(),
            Coordinate::new(10.0, 20.0),
            5.0,
            Priority::High,
            None,
        )
        .unwrap()
    }

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

    fn delivery(drone_id: Uuid) -> Delivery {
        Delivery::new(
            Uuid::new_v4(),
            drone_id,
            vec![order()],
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(10.0, 20.0),
                Coordinate::new(0.0, 0.0),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_order_roundtrip_and_status_update() {
        let repo = MemoryRepository::new();
        let order = order();
        repo.create_order(&order).await.unwrap();

        repo.update_order_status(order.id, OrderStatus::Assigned)
            .await
            .unwrap();

        let stored = repo.list_orders().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, OrderStatus::Assigned);
    }

    #[tokio::test]
    async fn test_duplicate_order_rejected() {
        let repo = MemoryRepository::new();
        let order = order();
        repo.create_order(&order).await.unwrap();
        assert!(matches!(
            repo.create_order(&order).await,
            Err(PersistenceError::DuplicateKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_drone_partial_update() {
        let repo = MemoryRepository::new();
        let drone = drone();
        repo.create_drone(&drone).await.unwrap();

        repo.update_drone(
            drone.id,
            DroneUpdate {
                battery_level: Some(55.0),
                current_state: Some(DroneState::Flying),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stored = repo.list_drones().await.unwrap();
        assert_eq!(stored[0].battery_level, 55.0);
        assert_eq!(stored[0].current_state, DroneState::Flying);
        // Untouched fields keep their values.
        assert_eq!(stored[0].total_deliveries, 0);
    }

    #[tokio::test]
    async fn test_delete_drone() {
        let repo = MemoryRepository::new();
        let drone = drone();
        repo.create_drone(&drone).await.unwrap();
        repo.delete_drone(drone.id).await.unwrap();
        assert!(repo.list_drones().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_drone(drone.id).await,
            Err(PersistenceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_delivery_is_idempotent() {
        let repo = MemoryRepository::new();
        let delivery = delivery(Uuid::new_v4());
        repo.create_delivery(&delivery).await.unwrap();

        // A second create with the same id is a silent no-op.
        let mut changed = delivery.clone();
        changed.total_weight = 99.0;
        repo.create_delivery(&changed).await.unwrap();

        let stored = repo.list_deliveries().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].total_weight, delivery.total_weight);
    }

    #[tokio::test]
    async fn test_delivery_status_and_timestamps() {
        let repo = MemoryRepository::new();
        let delivery = delivery(Uuid::new_v4());
        repo.create_delivery(&delivery).await.unwrap();

        let started = Utc::now();
        repo.set_delivery_started(delivery.id, started).await.unwrap();
        repo.update_delivery_status(delivery.id, DeliveryStatus::InProgress, None)
            .await
            .unwrap();

        let completed = Utc::now();
        repo.update_delivery_status(delivery.id, DeliveryStatus::Completed, Some(completed))
            .await
            .unwrap();

        let stored = repo.list_deliveries().await.unwrap();
        assert_eq!(stored[0].status, DeliveryStatus::Completed);
        assert_eq!(stored[0].started_at, Some(started));
        assert_eq!(stored[0].completed_at, Some(completed));
    }
}
