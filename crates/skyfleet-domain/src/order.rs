//! Order entity: one shipment request with a lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, Result};
use crate::geo::Coordinate;

/// Delivery priority, ordered HIGH > MEDIUM > LOW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Numeric weight used for allocation ordering.
    #[must_use]
    pub const fn value(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// Order lifecycle. Monotonic pending → assigned → delivered, with
/// cancellation as a terminal side-branch off pending/assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Assigned,
    Delivered,
    Cancelled,
}

/// One shipment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_location: Coordinate,
    /// Drop-off point when it differs from the customer location.
    pub delivery_location: Option<Coordinate>,
    pub weight: f64,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Create a pending order. Fails fast on non-positive weight or
    /// non-finite coordinates; no partial entity is ever created.
    pub fn new(
        id: Uuid,
        customer_location: Coordinate,
        weight: f64,
        priority: Priority,
        delivery_location: Option<Coordinate>,
    ) -> Result<Self> {
        if weight <= 0.0 {
            return Err(DomainError::InvalidWeight(weight));
        }
        if !customer_location.is_finite() {
            return Err(DomainError::InvalidCoordinates {
                x: customer_location.x,
                y: customer_location.y,
            });
        }
        if let Some(loc) = delivery_location {
            if !loc.is_finite() {
                return Err(DomainError::InvalidCoordinates { x: loc.x, y: loc.y });
            }
        }

        Ok(Self {
            id,
            customer_location,
            delivery_location,
            weight,
            priority,
            created_at: Utc::now(),
            status: OrderStatus::Pending,
        })
    }

    /// Drop-off point, defaulting to the customer location when absent.
    #[must_use]
    pub fn delivery_location(&self) -> Coordinate {
        self.delivery_location.unwrap_or(self.customer_location)
    }

    pub fn assign(&mut self) {
        self.status = OrderStatus::Assigned;
    }

    pub fn deliver(&mut self) {
        self.status = OrderStatus::Delivered;
    }

    /// Cancel the order. Delivered orders can no longer be cancelled.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status == OrderStatus::Delivered {
            return Err(DomainError::AlreadyDelivered(self.id));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(weight: f64, priority: Priority) -> Result<Order> {
        Order::new(
            Uuid::new_v4(),
            Coordinate::new(10.0, 20.0),
            weight,
            priority,
            None,
        )
    }

    #[test]
    fn test_create_valid_order() {
        let order = order(5.0, Priority::High).unwrap();
        assert_eq!(order.weight, 5.0);
        assert_eq!(order.priority, Priority::High);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        assert!(matches!(
            order(0.0, Priority::Medium),
            Err(DomainError::InvalidWeight(_))
        ));
        assert!(matches!(
            order(-1.5, Priority::Medium),
            Err(DomainError::InvalidWeight(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let result = Order::new(
            Uuid::new_v4(),
            Coordinate::new(f64::NAN, 0.0),
            5.0,
            Priority::Low,
            None,
        );
        assert!(matches!(result, Err(DomainError::InvalidCoordinates { .. })));
    }

    #[test]
    fn test_delivery_location_defaults_to_customer() {
        let order = order(5.0, Priority::Low).unwrap();
        assert_eq!(order.delivery_location(), order.customer_location);

        let dropoff = Coordinate::new(30.0, 40.0);
        let order = Order::new(
            Uuid::new_v4(),
            Coordinate::new(10.0, 20.0),
            5.0,
            Priority::Low,
            Some(dropoff),
        )
        .unwrap();
        assert_eq!(order.delivery_location(), dropoff);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut order = order(5.0, Priority::High).unwrap();
        order.assign();
        assert_eq!(order.status, OrderStatus::Assigned);
        order.deliver();
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_cancel_rejected_after_delivery() {
        let mut order = order(5.0, Priority::High).unwrap();
        order.assign();
        order.deliver();
        assert!(order.cancel().is_err());
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_cancel_from_pending_and_assigned() {
        let mut pending = order(5.0, Priority::Low).unwrap();
        pending.cancel().unwrap();
        assert_eq!(pending.status, OrderStatus::Cancelled);

        let mut assigned = order(5.0, Priority::Low).unwrap();
        assigned.assign();
        assigned.cancel().unwrap();
        assert_eq!(assigned.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_priority_values() {
        assert_eq!(Priority::High.value(), 3);
        assert_eq!(Priority::Medium.value(), 2);
        assert_eq!(Priority::Low.value(), 1);
    }

    #[test]
    fn test_priority_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::from_str::<Priority>("\"medium\"").unwrap(),
            Priority::Medium
        );
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
    }
}
