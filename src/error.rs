//! # Meter Error Handling
//!
//! This module defines the MeterError enum, which represents the different error
//! types that can occur while decoding telegram records and querying meter drivers.

use thiserror::Error;

/// Represents the different error types that can occur in the wmbus-meters crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeterError {
    /// The requested record key is not present in this telegram.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// The record is present but its bytes cannot be decoded as a number.
    #[error("Malformed record {key}: {reason}")]
    MalformedRecord { key: String, reason: String },

    /// A unit of one quantity kind was requested for a field of another kind.
    #[error("Dimension mismatch: unit {unit} is not a {expected} unit")]
    DimensionMismatch { unit: String, expected: String },

    /// The telegram does not match the identity declared by a driver.
    #[error("Identity mismatch: {0}")]
    IdentityMismatch(String),

    /// No driver with this name is registered in the catalog.
    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string")]
    InvalidHexString,

    /// Indicates an invalid manufacturer code.
    #[error("Invalid manufacturer: {0}")]
    InvalidManufacturer(String),

    /// Indicates an unknown DIF.
    #[error("Unknown DIF: 0x{0:02X}")]
    UnknownDif(u8),

    /// Indicates a premature end of data.
    #[error("Premature end of data")]
    PrematureEndAtData,

    /// The record stream could not be tokenized.
    #[error("Error parsing data record: {0}")]
    RecordParseError(String),

    /// Configuration could not be read or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

impl MeterError {
    /// Field-level conditions that leave the previous reading in place.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MeterError::FieldNotFound(_) | MeterError::MalformedRecord { .. }
        )
    }
}

impl From<serde_json::Error> for MeterError {
    fn from(e: serde_json::Error) -> Self {
        MeterError::ConfigError(e.to_string())
    }
}

impl From<std::io::Error> for MeterError {
    fn from(e: std::io::Error) -> Self {
        MeterError::ConfigError(e.to_string())
    }
}
