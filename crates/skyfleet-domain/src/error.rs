//! Domain-level error types.

use thiserror::Error;

/// Domain-level errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("order weight must be greater than zero, got {0}")]
    InvalidWeight(f64),

    #[error("invalid coordinates: x={x}, y={y}")]
    InvalidCoordinates { x: f64, y: f64 },

    #[error("invalid capacity for drone {name}: max_weight={max_weight}, max_distance={max_distance}")]
    InvalidCapacity {
        name: String,
        max_weight: f64,
        max_distance: f64,
    },

    #[error("a delivery must bundle at least one order")]
    EmptyDelivery,

    #[error("order {0} is already delivered and cannot be cancelled")]
    AlreadyDelivered(uuid::Uuid),
}

pub type Result<T> = std::result::Result<T, DomainError>;
