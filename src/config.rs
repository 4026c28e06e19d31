//! # Meter Configuration
//!
//! Meters are configured with a name, the driver to use, the meter ids to
//! listen for and optional identity overrides that widen what the driver
//! accepts. Configuration is read from JSON.
//!
//! ```json
//! {
//!   "meters": [
//!     { "name": "house", "driver": "ehzp", "ids": ["12345678"],
//!       "identity": { "manufacturers": ["ESY"], "version": 3 } }
//!   ]
//! }
//! ```

use crate::error::MeterError;
use crate::util::hex::decode_hex;
use crate::vendors::manufacturer::parse_manufacturer;
use crate::wmbus::link_mode::LinkMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn meter_ids_default() -> Vec<String> {
    vec!["*".to_string()]
}

/// Additions to the identity a driver declares.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IdentityOverrides {
    #[serde(default)]
    pub manufacturers: Vec<String>,
    #[serde(default)]
    pub media: Vec<u8>,
    /// Replaces the expected version.
    #[serde(default)]
    pub version: Option<u8>,
    /// Replaces the driver's link modes when non-empty.
    #[serde(default)]
    pub link_modes: Vec<LinkMode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MeterInfo {
    pub name: String,
    pub driver: String,
    /// Exact 8 digit ids, `*`, or a prefix ending in `*`.
    #[serde(default = "meter_ids_default")]
    pub ids: Vec<String>,
    /// AES key as 32 hex digits; consumed by the decryption layer.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub identity: IdentityOverrides,
}

impl MeterInfo {
    pub fn new(name: &str, driver: &str, ids: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            driver: driver.to_string(),
            ids: ids.iter().map(|s| s.to_string()).collect(),
            key: None,
            identity: IdentityOverrides::default(),
        }
    }

    pub fn validate(&self) -> Result<(), MeterError> {
        if self.name.trim().is_empty() {
            return Err(MeterError::ConfigError("meter name is empty".to_string()));
        }
        if self.ids.is_empty() {
            return Err(MeterError::ConfigError(format!(
                "meter {} has no ids",
                self.name
            )));
        }
        for id in &self.ids {
            let digits = id.strip_suffix('*').unwrap_or(id);
            let wildcard = digits.len() != id.len();
            let ok = digits.chars().all(|c| c.is_ascii_digit())
                && (digits.len() == 8 || (wildcard && digits.len() < 8));
            if !ok {
                return Err(MeterError::ConfigError(format!(
                    "meter {}: bad id pattern {id}",
                    self.name
                )));
            }
        }
        if let Some(key) = &self.key {
            let bytes = decode_hex(key)?;
            if bytes.len() != 16 {
                return Err(MeterError::ConfigError(format!(
                    "meter {}: key must be 16 bytes, got {}",
                    self.name,
                    bytes.len()
                )));
            }
        }
        for code in &self.identity.manufacturers {
            parse_manufacturer(code)?;
        }
        Ok(())
    }

    /// True if the telegram id is one this meter listens for.
    pub fn id_matches(&self, id: &str) -> bool {
        self.ids.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => id.starts_with(prefix),
            None => pattern == id,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub meters: Vec<MeterInfo>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, MeterError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MeterError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), MeterError> {
        for (i, meter) in self.meters.iter().enumerate() {
            meter.validate()?;
            if self.meters[..i].iter().any(|m| m.name == meter.name) {
                return Err(MeterError::ConfigError(format!(
                    "duplicate meter name {}",
                    meter.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let info: MeterInfo = serde_json::from_str(r#"{"name":"m","driver":"ehzp"}"#).unwrap();
        assert_eq!(info.ids, vec!["*"]);
        assert_eq!(info.key, None);
        assert_eq!(info.identity, IdentityOverrides::default());
        assert!(info.validate().is_ok());
    }

    #[test]
    fn test_id_patterns() {
        let info = MeterInfo::new("m", "ehzp", &["12345678", "9999*"]);
        assert!(info.validate().is_ok());
        assert!(info.id_matches("12345678"));
        assert!(info.id_matches("99990001"));
        assert!(!info.id_matches("12345679"));
        assert!(MeterInfo::new("m", "ehzp", &["*"]).id_matches("00000000"));
        assert!(MeterInfo::new("m", "ehzp", &["1234"]).validate().is_err());
        assert!(MeterInfo::new("m", "ehzp", &["1234567a"]).validate().is_err());
        assert!(MeterInfo::new("m", "ehzp", &[]).validate().is_err());
    }

    #[test]
    fn test_key_and_manufacturer_validation() {
        let mut info = MeterInfo::new("m", "ehzp", &["12345678"]);
        info.key = Some("00112233445566778899AABBCCDDEEFF".to_string());
        assert!(info.validate().is_ok());
        info.key = Some("0011".to_string());
        assert!(info.validate().is_err());
        info.key = None;
        info.identity.manufacturers = vec!["EM".to_string()];
        assert!(matches!(info.validate(), Err(MeterError::InvalidManufacturer(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{"meters":[{"name":"a","driver":"ehzp"},{"name":"a","driver":"ehzp"}]}"#;
        assert!(matches!(Config::from_json(json), Err(MeterError::ConfigError(_))));
    }
}
