//! # SkyFleet Simulator
//!
//! Discrete-tick simulation of a delivery drone fleet. The
//! [`SimulationEngine`] owns the authoritative fleet state and advances
//! every drone through IDLE → LOADING → FLYING → DELIVERING → RETURNING →
//! IDLE, one state evaluation per drone per tick, mirroring each change to
//! a repository backend. The [`TickScheduler`] drives the engine on a
//! timer or one tick at a time.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod engine;
pub mod scheduler;
pub mod stats;

pub use engine::{SimulationEngine, DELIVERING_DWELL_TICKS, REACH_EPSILON, STEP_DISTANCE};
pub use scheduler::TickScheduler;
pub use stats::{DroneEfficiency, FleetStats};
