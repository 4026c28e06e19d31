//! # EHZP Electricity Meter
//!
//! Driver for EHZP compatible electricity meters sending wM-Bus T1 telegrams
//! with AES-CBC-IV (security mode 5) encryption. Units are built by EMH and
//! APATOR with media 0x02, and by DEV, which announce themselves as a radio
//! converter (media 0x37).
//!
//! Total energy and current power use the standard energy and power records
//! at storage 0. Returned energy and on time are read from fixed tags:
//!
//! | Field                       | Record                  |
//! |-----------------------------|-------------------------|
//! | `total_energy_consumption`  | energy (Wh range), st 0 |
//! | `current_power_consumption` | power (W range), st 0   |
//! | `total_energy_production`   | `07803C`                |
//! | `on_time`                   | `0420`                  |

use crate::config::MeterInfo;
use crate::error::MeterError;
use crate::meters::{
    ElectricityMeter, FieldInfo, FieldUpdate, Meter, MeterCommon, MeterIdentity, ProcessReport,
};
use crate::payload::record::MeasurementType;
use crate::payload::store::{Extracted, RecordLookup};
use crate::payload::vif::ValueInformation;
use crate::units::{assert_quantity, convert, default_unit, Quantity, Unit};
use crate::vendors::manufacturer::{MANUFACTURER_APA, MANUFACTURER_DEV, MANUFACTURER_EMH};
use crate::wmbus::handle::WMBusHandle;
use crate::wmbus::link_mode::LinkModeSet;
use crate::wmbus::security::SecurityMode;
use crate::wmbus::telegram::{Telegram, TelegramAnnotator};
use log::{debug, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DRIVER_NAME: &str = "ehzp";

/// Manufacturer specific tag carrying the returned energy.
pub const KEY_TOTAL_ENERGY_RETURNED: &str = "07803C";
pub const KEY_ON_TIME: &str = "0420";

pub const MEDIA_ELECTRICITY: u8 = 0x02;
pub const MEDIA_RADIO_CONVERTER_METER_SIDE: u8 = 0x37;

pub fn identity() -> MeterIdentity {
    MeterIdentity::new(LinkModeSet::T1)
        .add_manufacturer(MANUFACTURER_EMH)
        .add_manufacturer(MANUFACTURER_APA)
        .add_media(MEDIA_ELECTRICITY)
        .add_manufacturer(MANUFACTURER_DEV)
        .add_media(MEDIA_RADIO_CONVERTER_METER_SIDE)
        .expected_version(0x02)
        .expected_security_mode(SecurityMode::AesCbcIv)
}

/// Latest readings in canonical units.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Readings {
    total_energy_kwh: f64,
    current_power_kw: f64,
    total_energy_returned_kwh: f64,
    current_power_returned_kw: f64,
    on_time_h: f64,
}

struct FieldBinding {
    info: FieldInfo,
    lookup: RecordLookup,
    /// Label of the explanation added at the record offset.
    label: &'static str,
    get: fn(&Readings) -> f64,
    set: fn(&mut Readings, f64),
}

const FIELDS: &[FieldInfo] = &[
    FieldInfo {
        name: "total_energy_consumption",
        quantity: Quantity::Energy,
        description: "The total energy consumption recorded by this meter.",
    },
    FieldInfo {
        name: "current_power_consumption",
        quantity: Quantity::Power,
        description: "Current power consumption.",
    },
    FieldInfo {
        name: "total_energy_production",
        quantity: Quantity::Energy,
        description: "The total energy production recorded by this meter.",
    },
    FieldInfo {
        name: "on_time",
        quantity: Quantity::Time,
        description: "Device on time.",
    },
];

const BINDINGS: &[FieldBinding] = &[
    FieldBinding {
        info: FIELDS[0],
        lookup: RecordLookup::semantic(MeasurementType::Any, ValueInformation::EnergyWh, 0),
        label: "total energy",
        get: |r| r.total_energy_kwh,
        set: |r, v| r.total_energy_kwh = v,
    },
    FieldBinding {
        info: FIELDS[1],
        lookup: RecordLookup::semantic(MeasurementType::Any, ValueInformation::PowerW, 0),
        label: "current power",
        get: |r| r.current_power_kw,
        set: |r, v| r.current_power_kw = v,
    },
    FieldBinding {
        info: FIELDS[2],
        lookup: RecordLookup::literal(KEY_TOTAL_ENERGY_RETURNED),
        label: "total energy returned",
        get: |r| r.total_energy_returned_kwh,
        set: |r, v| r.total_energy_returned_kwh = v,
    },
    FieldBinding {
        info: FIELDS[3],
        lookup: RecordLookup::literal(KEY_ON_TIME),
        label: "on time",
        get: |r| r.on_time_h,
        set: |r, v| r.on_time_h = v,
    },
];

/// Brings an extracted value into the canonical unit of `quantity`.
fn canonical_value(extracted: &Extracted, quantity: Quantity) -> Result<f64, String> {
    let unit = extracted
        .unit
        .ok_or_else(|| format!("record {} carries no unit", extracted.key))?;
    if unit.quantity() != quantity {
        return Err(format!(
            "record {} holds {}, expected {}",
            extracted.key,
            unit.quantity(),
            quantity
        ));
    }
    convert(extracted.value, unit, default_unit(quantity)).map_err(|e| e.to_string())
}

pub struct MeterEhzp {
    common: MeterCommon,
    readings: Mutex<Readings>,
}

impl MeterEhzp {
    pub fn new(bus: &WMBusHandle, info: MeterInfo) -> Result<Self, MeterError> {
        Ok(Self {
            common: MeterCommon::new(bus, info, DRIVER_NAME, identity())?,
            readings: Mutex::new(Readings::default()),
        })
    }

    fn readings(&self) -> MutexGuard<'_, Readings> {
        self.readings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self, stored: f64, quantity: Quantity, unit: Unit) -> Result<f64, MeterError> {
        assert_quantity(unit, quantity)?;
        convert(stored, default_unit(quantity), unit)
    }
}

/// Factory registered in the driver catalog.
pub fn create(bus: &WMBusHandle, info: MeterInfo) -> Result<Box<dyn Meter>, MeterError> {
    Ok(Box::new(MeterEhzp::new(bus, info)?))
}

impl Meter for MeterEhzp {
    fn common(&self) -> &MeterCommon {
        &self.common
    }

    fn fields(&self) -> &'static [FieldInfo] {
        FIELDS
    }

    fn field_value(&self, field: &str, unit: Unit) -> Result<f64, MeterError> {
        let binding = BINDINGS
            .iter()
            .find(|b| b.info.name == field)
            .ok_or_else(|| MeterError::FieldNotFound(field.to_string()))?;
        let stored = (binding.get)(&*self.readings());
        self.read(stored, binding.info.quantity, unit)
    }

    fn process_content(&self, telegram: &mut Telegram) -> ProcessReport {
        let mut updates = Vec::with_capacity(BINDINGS.len());
        let mut notes = Vec::new();
        {
            let mut readings = self.readings();
            for binding in BINDINGS {
                let name = binding.info.name;
                let update = match telegram.values.extract(&binding.lookup) {
                    Ok(extracted) => match canonical_value(&extracted, binding.info.quantity) {
                        Ok(value) => {
                            (binding.set)(&mut *readings, value);
                            let unit = default_unit(binding.info.quantity);
                            notes.push((
                                extracted.offset,
                                format!(" {} ({value:.6} {unit})", binding.label),
                            ));
                            FieldUpdate::Updated(value)
                        }
                        Err(reason) => {
                            warn!("{}: {name} not updated: {reason}", self.name());
                            FieldUpdate::Malformed(reason)
                        }
                    },
                    Err(MeterError::FieldNotFound(wanted)) => {
                        debug!("{}: {name} absent ({wanted})", self.name());
                        FieldUpdate::Absent
                    }
                    Err(e) => {
                        warn!("{}: {name} not updated: {e}", self.name());
                        FieldUpdate::Malformed(e.to_string())
                    }
                };
                updates.push((name, update));
            }
        }

        for (offset, note) in notes {
            telegram.add_more_explanation(offset, &note);
        }

        ProcessReport {
            meter: self.name().to_string(),
            updates,
        }
    }

    fn electricity(&self) -> Option<&dyn ElectricityMeter> {
        Some(self)
    }
}

impl ElectricityMeter for MeterEhzp {
    fn total_energy_consumption(&self, unit: Unit) -> Result<f64, MeterError> {
        let stored = self.readings().total_energy_kwh;
        self.read(stored, Quantity::Energy, unit)
    }

    fn current_power_consumption(&self, unit: Unit) -> Result<f64, MeterError> {
        let stored = self.readings().current_power_kw;
        self.read(stored, Quantity::Power, unit)
    }

    fn total_energy_production(&self, unit: Unit) -> Result<f64, MeterError> {
        let stored = self.readings().total_energy_returned_kwh;
        self.read(stored, Quantity::Energy, unit)
    }

    /// Never reported by these meters; stays at zero.
    fn current_power_production(&self, unit: Unit) -> Result<f64, MeterError> {
        let stored = self.readings().current_power_returned_kw;
        self.read(stored, Quantity::Power, unit)
    }
}
