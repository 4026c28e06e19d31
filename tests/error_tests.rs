//! Unit tests for the `MeterError` enum and its associated `Display` trait implementation.

use wmbus_meters::error::MeterError;
use wmbus_meters::util::hex::{decode_hex, HexError};

/// Tests that the `FieldNotFound` variant is correctly formatted.
#[test]
fn test_field_not_found_error() {
    let err = MeterError::FieldNotFound("0420".to_string());
    assert_eq!(err.to_string(), "Field not found: 0420");
    assert!(err.is_recoverable());
}

/// Tests that the `MalformedRecord` variant is correctly formatted.
#[test]
fn test_malformed_record_error() {
    let err = MeterError::MalformedRecord {
        key: "07803C".to_string(),
        reason: "need 8 bytes, got 2".to_string(),
    };
    assert_eq!(err.to_string(), "Malformed record 07803C: need 8 bytes, got 2");
    assert!(err.is_recoverable());
}

/// Tests that the `DimensionMismatch` variant is correctly formatted and not recoverable.
#[test]
fn test_dimension_mismatch_error() {
    let err = MeterError::DimensionMismatch {
        unit: "kw".to_string(),
        expected: "Energy".to_string(),
    };
    assert_eq!(err.to_string(), "Dimension mismatch: unit kw is not a Energy unit");
    assert!(!err.is_recoverable());
}

#[test]
fn test_identity_and_driver_errors() {
    assert_eq!(
        MeterError::IdentityMismatch("media 0x07 not accepted".to_string()).to_string(),
        "Identity mismatch: media 0x07 not accepted"
    );
    assert_eq!(
        MeterError::UnknownDriver("foo".to_string()).to_string(),
        "Unknown driver: foo"
    );
}

/// Tests that the `UnknownDif` variant is correctly formatted.
#[test]
fn test_unknown_dif_error() {
    let err = MeterError::UnknownDif(0xF7);
    assert_eq!(err.to_string(), "Unknown DIF: 0xF7");
}

/// Tests that the `InvalidHexString` variant is correctly formatted.
#[test]
fn test_invalid_hex_string_error() {
    let err = MeterError::InvalidHexString;
    assert_eq!(err.to_string(), "Invalid hexadecimal string");
}

#[test]
fn test_hex_error_conversion() {
    let hex_err = decode_hex("ABC").unwrap_err();
    assert_eq!(hex_err, HexError::OddLength(3));
    let err: MeterError = hex_err.into();
    assert_eq!(err, MeterError::InvalidHexString);
}

#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: MeterError = json_err.into();
    assert!(matches!(err, MeterError::ConfigError(_)));
}

/// Tests that the `Other` variant is correctly formatted.
#[test]
fn test_other_error() {
    let err = MeterError::Other("Test error message".to_string());
    assert_eq!(err.to_string(), "Other error: Test error message");
}
