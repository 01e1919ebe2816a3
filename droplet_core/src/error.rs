use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ControlError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout talking to hardware")]
    Timeout,
    #[error("actuator channel closed")]
    Closed,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing camera")]
    MissingCamera,
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing calibration table")]
    MissingCalibration,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// Reasons a calibration table or profile is refused at construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("calibration table must contain at least one entry")]
    Empty,
    #[error("entry {index}: distance {distance} must be finite and > 0")]
    BadDistance { index: usize, distance: f64 },
    #[error("entry {index}: distance {distance} is not greater than the previous entry")]
    NotIncreasing { index: usize, distance: f64 },
    #[error("{field} must be finite and >= 0, got {value}")]
    BadTiming { field: &'static str, value: f64 },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
