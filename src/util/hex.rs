//! # Hex Encoding/Decoding Utilities
//!
//! Record keys are rendered as uppercase hex of their DIF/VIF bytes, and test
//! telegrams are usually written down as hex strings. Both directions go
//! through the `hex` crate.
//!
//! ```rust
//! use wmbus_meters::util::hex::{decode_hex, encode_hex_upper};
//!
//! let data = decode_hex("04 03 39 30 00 00").unwrap();
//! assert_eq!(encode_hex_upper(&data[..2]), "0403");
//! ```

use crate::error::MeterError;
use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

impl From<HexError> for MeterError {
    fn from(_: HexError) -> Self {
        MeterError::InvalidHexString
    }
}

/// Encode bytes to uppercase hex string, the format used for record keys.
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters.
/// Whitespace is automatically stripped.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }
    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// True if `key` is a well-formed literal record key: non-empty, even
/// length, uppercase hex digits only.
pub fn is_literal_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() % 2 == 0
        && key
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}
