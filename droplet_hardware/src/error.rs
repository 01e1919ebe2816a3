use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("serial error: {0}")]
    Serial(String),
    #[error("camera error: {0}")]
    Camera(String),
    #[error("frame timeout")]
    Timeout,
    #[error("channel already closed")]
    Closed,
    #[error("firmware rejected line: {0:?}")]
    Rejected(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
