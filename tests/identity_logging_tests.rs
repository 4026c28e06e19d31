//! Tests for what the identity check logs while telegrams are dispatched.
//!
//! This binary installs its own logger, so it keeps a single test.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::Mutex;
use wmbus_meters::vendors::MANUFACTURER_KAM;
use wmbus_meters::{
    DriverCatalog, LinkMode, LinkModeSet, MeterInfo, MeterManager, SecurityMode, Telegram,
    TelegramHeader, WMBusHandle, MANUFACTURER_EMH,
};

static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

fn security_warnings() -> usize {
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, msg)| *level == Level::Warn && msg.contains("security mode"))
        .count()
}

fn header(manufacturer: u16, security_mode: SecurityMode) -> TelegramHeader {
    TelegramHeader {
        manufacturer,
        id: "12345678".to_string(),
        version: 0x02,
        media: 0x02,
        security_mode,
        link_mode: Some(LinkMode::T1),
    }
}

#[test]
fn test_security_mode_difference_is_logged_once_per_telegram() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let catalog = DriverCatalog::with_defaults().unwrap();
    let mut manager = MeterManager::new(&catalog, WMBusHandle::new("bus", LinkModeSet::T1));
    manager
        .add_meter(MeterInfo::new("house", "ehzp", &["12345678"]))
        .unwrap();
    manager
        .add_meter(MeterInfo::new("auto", "auto", &["12345678"]))
        .unwrap();

    // the first telegram also resolves the auto meter, so two meters take it
    let mut t = Telegram::from_hex(
        header(MANUFACTURER_EMH, SecurityMode::NoSecurity),
        "0403 39300000",
    )
    .unwrap();
    assert_eq!(manager.dispatch(&mut t).len(), 2);
    assert_eq!(security_warnings(), 2);

    RECORDS.lock().unwrap().clear();
    let mut t = Telegram::from_hex(
        header(MANUFACTURER_EMH, SecurityMode::NoSecurity),
        "0403 39300000",
    )
    .unwrap();
    assert_eq!(manager.dispatch(&mut t).len(), 2);
    assert_eq!(security_warnings(), 2);

    // rejected telegrams do not get as far as the security mode
    RECORDS.lock().unwrap().clear();
    let mut t = Telegram::from_hex(
        header(MANUFACTURER_KAM, SecurityMode::NoSecurity),
        "0403 39300000",
    )
    .unwrap();
    assert!(manager.dispatch(&mut t).is_empty());
    assert_eq!(security_warnings(), 0);

    // matching the expected mode logs nothing
    let mut t = Telegram::from_hex(
        header(MANUFACTURER_EMH, SecurityMode::AesCbcIv),
        "0403 39300000",
    )
    .unwrap();
    assert_eq!(manager.dispatch(&mut t).len(), 2);
    assert_eq!(security_warnings(), 0);
}
