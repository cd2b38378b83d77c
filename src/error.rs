//! Error types for random-directions.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum DirectionsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed sensor data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid target direction: {0}")]
    InvalidTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sensor fusion stopped before a heading was available")]
    SensorsClosed,
}

pub type Result<T> = std::result::Result<T, DirectionsError>;
