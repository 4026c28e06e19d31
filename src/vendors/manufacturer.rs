//! M-Bus Manufacturer IDs
//!
//! Manufacturer IDs are the FLAG Association 3-letter codes packed into 15 bits:
//! ```text
//! id = (char1 - 64) * 32² + (char2 - 64) * 32 + (char3 - 64)
//! ```
//! The MSB of the transmitted 16-bit field flags a soft address and is ignored
//! when decoding.
//!
//! ```rust
//! use wmbus_meters::vendors::manufacturer::{id_to_manufacturer, manufacturer_to_id, MANUFACTURER_EMH};
//!
//! assert_eq!(manufacturer_to_id("EMH"), Some(MANUFACTURER_EMH));
//! assert_eq!(id_to_manufacturer(MANUFACTURER_EMH), "EMH");
//! ```

use crate::error::MeterError;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Packs three uppercase letters at compile time.
const fn pack(code: &[u8; 3]) -> u16 {
    ((code[0] - 64) as u16) * 1024 + ((code[1] - 64) as u16) * 32 + (code[2] - 64) as u16
}

/// EMH Energie-Messtechnik
pub const MANUFACTURER_EMH: u16 = pack(b"EMH");
/// APATOR
pub const MANUFACTURER_APA: u16 = pack(b"APA");
/// DEV (Develco / radio converter side)
pub const MANUFACTURER_DEV: u16 = pack(b"DEV");
/// Kamstrup
pub const MANUFACTURER_KAM: u16 = pack(b"KAM");

/// Known manufacturers by id.
pub static KNOWN_MANUFACTURERS: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(MANUFACTURER_EMH, "EMH Energie-Messtechnik");
    map.insert(MANUFACTURER_APA, "APATOR");
    map.insert(MANUFACTURER_DEV, "Develco");
    map.insert(MANUFACTURER_KAM, "Kamstrup");
    map.insert(pack(b"ESY"), "EasyMeter");
    map.insert(pack(b"ITW"), "Itron");
    map.insert(pack(b"LUG"), "Landis+Gyr");
    map.insert(pack(b"DZG"), "DZG Metering");
    map.insert(pack(b"EFE"), "Engelmann");
    map.insert(pack(b"TCH"), "Techem");
    map
});

/// Convert a 3-letter manufacturer code (case insensitive) to its id.
pub fn manufacturer_to_id(manufacturer: &str) -> Option<u16> {
    let code = manufacturer.to_ascii_uppercase();
    let bytes: [u8; 3] = code.as_bytes().try_into().ok()?;
    if !bytes.iter().all(u8::is_ascii_uppercase) {
        return None;
    }
    Some(pack(&bytes))
}

/// Like [`manufacturer_to_id`], for configuration input.
pub fn parse_manufacturer(manufacturer: &str) -> Result<u16, MeterError> {
    manufacturer_to_id(manufacturer)
        .ok_or_else(|| MeterError::InvalidManufacturer(manufacturer.to_string()))
}

/// Convert an id to its 3-letter code; `"UNK"` if any letter is out of range.
pub fn id_to_manufacturer(id: u16) -> String {
    let id = id & 0x7FFF;
    let letters = [id / 1024, (id / 32) % 32, id % 32];
    if letters.iter().any(|v| !(1..=26).contains(v)) {
        return "UNK".to_string();
    }
    letters.iter().map(|v| (*v as u8 + 64) as char).collect()
}

/// Full name when known, otherwise the 3-letter code.
pub fn get_manufacturer_name(id: u16) -> String {
    KNOWN_MANUFACTURERS
        .get(&(id & 0x7FFF))
        .map(|name| name.to_string())
        .unwrap_or_else(|| id_to_manufacturer(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_manufacturer_constants() {
        assert_eq!(MANUFACTURER_EMH, 0x15A8);
        assert_eq!(MANUFACTURER_APA, 0x0601);
        assert_eq!(MANUFACTURER_DEV, 0x10B6);
        assert_eq!(MANUFACTURER_KAM, 0x2C2D);
    }

    #[test]
    fn test_encoding() {
        assert_eq!(manufacturer_to_id("emh"), Some(0x15A8));
        assert_eq!(manufacturer_to_id("AAA"), Some(0x0421));
        assert_eq!(manufacturer_to_id("ZZZ"), Some(0x6B5A));
        assert_eq!(manufacturer_to_id("AB"), None);
        assert_eq!(manufacturer_to_id("A1B"), None);
        assert_eq!(manufacturer_to_id("ÄBC"), None);
        assert!(parse_manufacturer("12").is_err());
    }

    #[test]
    fn test_decoding() {
        assert_eq!(id_to_manufacturer(0x15A8), "EMH");
        assert_eq!(id_to_manufacturer(0x95A8), "EMH");
        assert_eq!(id_to_manufacturer(0x0000), "UNK");
        assert_eq!(id_to_manufacturer(0x6B5B), "UNK");
    }

    #[test]
    fn test_known_names() {
        assert_eq!(get_manufacturer_name(MANUFACTURER_EMH), "EMH Energie-Messtechnik");
        assert_eq!(get_manufacturer_name(manufacturer_to_id("XYZ").unwrap()), "XYZ");
        for (&id, _) in KNOWN_MANUFACTURERS.iter() {
            assert_eq!(manufacturer_to_id(&id_to_manufacturer(id)), Some(id));
        }
    }
}
