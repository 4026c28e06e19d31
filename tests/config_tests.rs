//! Tests for building meters from a JSON configuration.

use std::io::Write;
use tempfile::NamedTempFile;
use wmbus_meters::{
    manufacturer_to_id, Config, DriverCatalog, LinkMode, LinkModeSet, MeterError, MeterManager,
    SecurityMode, Telegram, TelegramHeader, Unit, WMBusHandle, MANUFACTURER_EMH,
};

const CONFIG: &str = r#"{
  "meters": [
    { "name": "house", "driver": "ehzp", "ids": ["12345678"] },
    { "name": "garage", "driver": "ehzp", "ids": ["4444*"],
      "key": "00112233445566778899AABBCCDDEEFF",
      "identity": { "manufacturers": ["ESY"], "media": [2], "version": 3 } }
  ]
}"#;

fn header(manufacturer: u16, id: &str, version: u8) -> TelegramHeader {
    TelegramHeader {
        manufacturer,
        id: id.to_string(),
        version,
        media: 0x02,
        security_mode: SecurityMode::AesCbcIv,
        link_mode: Some(LinkMode::T1),
    }
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.meters.len(), 2);
    assert_eq!(config.meters[1].identity.version, Some(3));

    let catalog = DriverCatalog::with_defaults().unwrap();
    let mut manager =
        MeterManager::from_config(&catalog, WMBusHandle::new("bus", LinkModeSet::T1), &config)
            .unwrap();
    assert_eq!(manager.len(), 2);

    let esy = manufacturer_to_id("ESY").unwrap();
    let mut t = Telegram::from_hex(header(esy, "44440001", 3), "0403 E8030000").unwrap();
    let reports = manager.dispatch(&mut t);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].meter, "garage");

    let garage = manager.meter("garage").unwrap();
    let kwh = garage
        .electricity()
        .unwrap()
        .total_energy_consumption(Unit::KWH)
        .unwrap();
    assert!((kwh - 1.0).abs() < 1e-9);

    // the default meter does not accept the overridden identity
    let mut t = Telegram::from_hex(header(esy, "12345678", 3), "0403 E8030000").unwrap();
    assert!(manager.dispatch(&mut t).is_empty());
    let mut t = Telegram::from_hex(header(MANUFACTURER_EMH, "12345678", 2), "0403 E8030000").unwrap();
    assert_eq!(manager.dispatch(&mut t).len(), 1);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("meters.json"));
    assert!(matches!(result, Err(MeterError::ConfigError(_))));
}

#[test]
fn test_invalid_json() {
    assert!(matches!(
        Config::from_json("{ \"meters\": [ { \"name\": 1 } ] }"),
        Err(MeterError::ConfigError(_))
    ));
}

#[test]
fn test_unknown_driver_in_config() {
    let config = Config::from_json(r#"{"meters":[{"name":"m","driver":"amiplus"}]}"#).unwrap();
    let catalog = DriverCatalog::with_defaults().unwrap();
    let result =
        MeterManager::from_config(&catalog, WMBusHandle::new("bus", LinkModeSet::T1), &config);
    assert!(matches!(result, Err(MeterError::UnknownDriver(_))));
}

#[test]
fn test_link_mode_override_in_config() {
    let config = Config::from_json(
        r#"{"meters":[{"name":"m","driver":"ehzp","identity":{"link_modes":["c1"]}}]}"#,
    )
    .unwrap();
    let catalog = DriverCatalog::with_defaults().unwrap();
    let manager =
        MeterManager::from_config(&catalog, WMBusHandle::new("bus", LinkModeSet::C1), &config)
            .unwrap();
    let meter = manager.meter("m").unwrap();
    assert_eq!(meter.identity().link_modes(), LinkModeSet::C1);
}
