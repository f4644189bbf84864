//! # SkyFleet Persistence
//!
//! Repository-pattern persistence layer for the SkyFleet engine. The core
//! never talks to a storage engine directly: it hands plain entity
//! snapshots to the repository traits defined here and receives snapshots
//! back. Implementations can be swapped for different backends; the
//! bundled [`MemoryRepository`] is the reference backend used by the
//! simulator and in tests.
//!
//! Writes are best-effort: the engine's in-memory state stays
//! authoritative for the process lifetime even when a write fails, so
//! callers log persistence errors rather than aborting on them.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod memory;
pub mod repository;

pub use error::{PersistenceError, Result};
pub use memory::MemoryRepository;
pub use repository::{DeliveryRepository, DroneRepository, DroneUpdate, OrderRepository};
