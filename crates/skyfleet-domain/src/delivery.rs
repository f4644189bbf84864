//! Delivery aggregate: a drone, its bundled orders, and the planned route.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, Result};
use crate::geo::{route_distance, Coordinate};
use crate::order::Order;

/// Cruise speed used for time estimates: 30 distance units per 60
/// time units, i.e. 0.5 units per tick-minute.
pub const DELIVERY_SPEED_UNITS_PER_MIN: f64 = 30.0 / 60.0;

/// Delivery lifecycle. The failed branch exists as a signal for external
/// failure injection; the simulator never triggers it on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
}

/// One trackable delivery run: a non-empty batch of orders plus the route
/// the owning drone will fly. The route always starts and ends at the
/// drone's base location at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub drone_id: Uuid,
    /// Order snapshots bundled into this run, in visit order.
    pub orders: Vec<Order>,
    pub route: Vec<Coordinate>,
    /// Sum of bundled order weights.
    pub total_weight: f64,
    /// One-way route length: sum of consecutive segment lengths.
    pub total_distance: f64,
    /// Estimated minutes to fly the route at cruise speed, rounded up.
    pub estimated_time: u64,
    pub status: DeliveryStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Delivery {
    /// Bundle orders and a planned route into a scheduled delivery,
    /// computing weight, distance, and time estimates.
    pub fn new(id: Uuid, drone_id: Uuid, orders: Vec<Order>, route: Vec<Coordinate>) -> Result<Self> {
        if orders.is_empty() {
            return Err(DomainError::EmptyDelivery);
        }

        let total_weight = orders.iter().map(|o| o.weight).sum();
        let total_distance = route_distance(&route);
        let estimated_time = (total_distance / DELIVERY_SPEED_UNITS_PER_MIN).ceil() as u64;

        Ok(Self {
            id,
            drone_id,
            orders,
            route,
            total_weight,
            total_distance,
            estimated_time,
            status: DeliveryStatus::Scheduled,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        })
    }

    /// Mark the run in progress and stamp its start time.
    pub fn start(&mut self) {
        self.status = DeliveryStatus::InProgress;
        self.started_at = Some(Utc::now());
    }

    /// Mark the run completed, stamp the completion time, and flip every
    /// bundled order snapshot to delivered.
    pub fn complete(&mut self) {
        self.status = DeliveryStatus::Completed;
        self.completed_at = Some(Utc::now());
        for order in &mut self.orders {
            order.deliver();
        }
    }

    /// External/manual failure injection.
    pub fn fail(&mut self) {
        self.status = DeliveryStatus::Failed;
    }

    /// Wall-clock minutes between start and completion, when both are set.
    #[must_use]
    pub fn delivery_time_minutes(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => {
                Some((completed - started).num_milliseconds() as f64 / 1000.0 / 60.0)
            }
            _ => None,
        }
    }
}
