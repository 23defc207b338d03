use crate::spatial::coord::{BlockLocation, Coordinate};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtectionError {
    /// World is not registered with the protection system. Callers treat
    /// this as "system inactive here" and fall back to host behavior.
    #[error("World not registered: {0}")]
    WorldNotFound(String),

    /// A claim was expected but is absent or has a broken back-reference.
    #[error("Claim lookup failed at {coordinate}: {detail}")]
    ClaimLookupFailure { coordinate: Coordinate, detail: String },

    /// A reversion is already pending for this location; the new request is dropped.
    #[error("Reversion already scheduled at {0}")]
    AlreadyScheduled(BlockLocation),

    /// The engine is in a broken initialization state and denies everything.
    #[error("System error: {0}")]
    SystemError(String),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProtectionError>;
