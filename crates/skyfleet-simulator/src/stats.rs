//! Fleet-wide delivery statistics.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skyfleet_domain::{Delivery, DeliveryStatus, Drone};

/// Efficiency summary for a single drone. Efficiency is distance flown
/// per completed delivery, so lower is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneEfficiency {
    pub drone_id: Uuid,
    pub name: String,
    pub deliveries: u64,
    pub efficiency: f64,
}

/// Aggregate statistics over the fleet and its delivery history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetStats {
    /// Every delivery the engine knows about, regardless of status.
    pub total_deliveries: usize,
    pub completed_deliveries: usize,
    /// Mean wall-clock minutes from start to completion across completed
    /// deliveries, rounded to two decimals. Zero when none completed.
    pub average_delivery_time: f64,
    /// Round-trip distance flown across completed deliveries, rounded to
    /// two decimals.
    pub total_distance: f64,
    /// The drone with the lowest distance-per-delivery; ties go to the
    /// drone with more deliveries. `None` until a drone completes one.
    pub most_efficient_drone: Option<DroneEfficiency>,
}

impl FleetStats {
    /// Compute stats from engine snapshots of drones and deliveries.
    #[must_use]
    pub fn compute<'a, D, V>(drones: D, deliveries: V) -> Self
    where
        D: Iterator<Item = &'a Drone>,
        V: Iterator<Item = &'a Delivery> + Clone,
    {
        let total_deliveries = deliveries.clone().count();
        let completed: Vec<&Delivery> = deliveries
            .filter(|d| d.status == DeliveryStatus::Completed)
            .collect();

        let times: Vec<f64> = completed
            .iter()
            .filter_map(|d| d.delivery_time_minutes())
            .collect();
        let average_delivery_time = if times.is_empty() {
            0.0
        } else {
            round2(times.iter().sum::<f64>() / times.len() as f64)
        };

        // Drones fly each planned route out and back.
        let total_distance = round2(completed.iter().map(|d| d.total_distance * 2.0).sum());

        let mut ranked: Vec<DroneEfficiency> = drones
            .filter(|d| d.total_deliveries > 0)
            .map(|d| DroneEfficiency {
                drone_id: d.id,
                name: d.name.clone(),
                deliveries: d.total_deliveries,
                efficiency: round2(d.efficiency()),
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.efficiency
                .total_cmp(&b.efficiency)
                .then(b.deliveries.cmp(&a.deliveries))
        });

        Self {
            total_deliveries,
            completed_deliveries: completed.len(),
            average_delivery_time,
            total_distance,
            most_efficient_drone: ranked.into_iter().next(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
