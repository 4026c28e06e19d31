//! # wmbus-meters - Typed Drivers for Wireless M-Bus Meters
//!
//! The wmbus-meters crate turns decoded wireless M-Bus telegrams into named,
//! unit-typed meter readings. It sits behind the radio and decryption layers:
//! a telegram arrives with its sender identity and its (plain text)
//! application layer, the records are tokenized into a keyed store, and the
//! driver configured for the sender pulls the values it declares out of that
//! store.
//!
//! ## Features
//!
//! - Tokenize DIF/DIFE/VIF/VIFE data records into a keyed [`DataRecordStore`]
//! - Look records up semantically (measurement type, value information,
//!   storage number) or by their literal hex key, e.g. `"07803C"`
//! - Decode integer, BCD and real values and scale them into canonical units
//! - Convert readings between units of one quantity kind at query time
//! - Match telegrams against driver identities (manufacturer, media, version)
//! - Build meters from a JSON configuration through an explicit [`DriverCatalog`]
//!
//! ## Usage
//!
//! ```rust
//! use wmbus_meters::{
//!     DriverCatalog, LinkMode, LinkModeSet, MeterInfo, MeterManager, SecurityMode,
//!     Telegram, TelegramHeader, Unit, WMBusHandle, MANUFACTURER_EMH,
//! };
//!
//! let catalog = DriverCatalog::with_defaults().unwrap();
//! let bus = WMBusHandle::new("radio", LinkModeSet::T1);
//! let mut manager = MeterManager::new(&catalog, bus);
//! manager.add_meter(MeterInfo::new("house", "ehzp", &["12345678"])).unwrap();
//!
//! let header = TelegramHeader {
//!     manufacturer: MANUFACTURER_EMH,
//!     id: "12345678".to_string(),
//!     version: 0x02,
//!     media: 0x02,
//!     security_mode: SecurityMode::AesCbcIv,
//!     link_mode: Some(LinkMode::T1),
//! };
//! let mut telegram = Telegram::from_hex(header, "0403 39300000").unwrap();
//! manager.dispatch(&mut telegram);
//!
//! let meter = manager.meter("house").unwrap();
//! let kwh = meter.electricity().unwrap().total_energy_consumption(Unit::KWH).unwrap();
//! assert!((kwh - 12.345).abs() < 1e-9);
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod meters;
pub mod payload;
pub mod units;
pub mod util;
pub mod vendors;
pub mod wmbus;

pub use crate::config::{Config, IdentityOverrides, MeterInfo};
pub use crate::error::MeterError;
pub use crate::logging::{init_logger, init_test_logger};

// Record model
pub use payload::{DataRecord, DataRecordStore, Extracted, MeasurementType, RecordLookup, TypeCode};
pub use payload::ValueInformation;

// Units
pub use units::{convert, Quantity, Unit};

// Drivers
pub use meters::catalog::{DriverCatalog, DriverRegistration};
pub use meters::ehzp::MeterEhzp;
pub use meters::manager::MeterManager;
pub use meters::{
    ElectricityMeter, FieldInfo, FieldUpdate, Meter, MeterIdentity, MeterSnapshot, ProcessReport,
};

// Link layer
pub use wmbus::{
    Explanations, LinkMode, LinkModeSet, SecurityMode, Telegram, TelegramAnnotator,
    TelegramHeader, WMBusHandle,
};

pub use vendors::{
    id_to_manufacturer, manufacturer_to_id, MANUFACTURER_APA, MANUFACTURER_DEV, MANUFACTURER_EMH,
};
