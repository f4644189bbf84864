//! # SkyFleet Domain Model
//!
//! Core domain entities, value objects, and geometry primitives for the
//! SkyFleet delivery planning and simulation engine. These types are the
//! single source of truth across all layers: planning, simulation, and
//! persistence.
//!
//! Entities carry their own lifecycle rules: orders move through
//! pending → assigned → delivered (or are cancelled), deliveries through
//! scheduled → in-progress → completed (or failed), and drones cycle
//! through a five-state flight loop. External components mutate entities
//! only through the methods defined here.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod delivery;
pub mod drone;
pub mod error;
pub mod geo;
pub mod order;

pub use delivery::{Delivery, DeliveryStatus, DELIVERY_SPEED_UNITS_PER_MIN};
pub use drone::{Drone, DroneState, LOW_BATTERY_THRESHOLD};
pub use error::{DomainError, Result};
pub use geo::{
    distance, is_inside_obstacle, route_distance, route_intersects_any_obstacle, Coordinate,
    Obstacle,
};
pub use order::{Order, OrderStatus, Priority};
