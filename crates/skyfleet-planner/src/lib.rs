//! # SkyFleet Planner
//!
//! Route planning and order-to-drone allocation for the SkyFleet engine.
//!
//! - Route planning: nearest-neighbor heuristic with a best-effort
//!   obstacle-avoidance fallback.
//! - Allocation: matches pending orders to available drones under
//!   capacity and range constraints, in three passes (single-order,
//!   grouping, consolidation).

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod allocation;
pub mod route;

pub use allocation::{Allocation, AllocationEngine};
pub use route::plan_route;
