//! # Meter Drivers
//!
//! A driver binds a device identity (manufacturers, media, version, security
//! and link modes) to a telegram processing routine and a schema of named,
//! unit-typed fields.
//!
//! Capabilities are split into traits: every driver is a [`Meter`] (generic
//! metadata, telegram handling, field queries) and drivers for electricity
//! meters additionally implement [`ElectricityMeter`]. Callers holding a
//! `Box<dyn Meter>` reach the typed accessors through [`Meter::electricity`].
//!
//! ```rust
//! use wmbus_meters::meters::{catalog::DriverCatalog, Meter};
//! use wmbus_meters::{MeterInfo, Unit, WMBusHandle, LinkModeSet};
//!
//! let catalog = DriverCatalog::with_defaults().unwrap();
//! let bus = WMBusHandle::new("radio", LinkModeSet::T1);
//! let meter = catalog.create(&bus, MeterInfo::new("house", "ehzp", &["12345678"])).unwrap();
//! let energy = meter.electricity().unwrap().total_energy_consumption(Unit::KWH).unwrap();
//! assert_eq!(energy, 0.0);
//! ```

pub mod catalog;
pub mod common;
pub mod ehzp;
pub mod manager;

use crate::config::IdentityOverrides;
use crate::error::MeterError;
use crate::units::{default_unit, Quantity, Unit};
use crate::vendors::manufacturer::{id_to_manufacturer, parse_manufacturer};
use crate::wmbus::link_mode::LinkModeSet;
use crate::wmbus::security::SecurityMode;
use crate::wmbus::telegram::{Telegram, TelegramHeader};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub use common::MeterCommon;

/// What a driver accepts. Fixed once the driver is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterIdentity {
    manufacturers: BTreeSet<u16>,
    media: BTreeSet<u8>,
    expected_version: Option<u8>,
    security_mode: SecurityMode,
    link_modes: LinkModeSet,
}

impl MeterIdentity {
    pub fn new(link_modes: LinkModeSet) -> Self {
        Self {
            manufacturers: BTreeSet::new(),
            media: BTreeSet::new(),
            expected_version: None,
            security_mode: SecurityMode::NoSecurity,
            link_modes,
        }
    }

    pub fn add_manufacturer(mut self, manufacturer: u16) -> Self {
        self.manufacturers.insert(manufacturer & 0x7FFF);
        self
    }

    pub fn add_media(mut self, media: u8) -> Self {
        self.media.insert(media);
        self
    }

    pub fn expected_version(mut self, version: u8) -> Self {
        self.expected_version = Some(version);
        self
    }

    pub fn expected_security_mode(mut self, mode: SecurityMode) -> Self {
        self.security_mode = mode;
        self
    }

    /// Widens the identity with configured overrides.
    pub fn with_overrides(mut self, overrides: &IdentityOverrides) -> Result<Self, MeterError> {
        for code in &overrides.manufacturers {
            self = self.add_manufacturer(parse_manufacturer(code)?);
        }
        for media in &overrides.media {
            self = self.add_media(*media);
        }
        if let Some(version) = overrides.version {
            self = self.expected_version(version);
        }
        if !overrides.link_modes.is_empty() {
            self.link_modes = overrides.link_modes.iter().copied().collect();
        }
        Ok(self)
    }

    pub fn manufacturers(&self) -> impl Iterator<Item = u16> + '_ {
        self.manufacturers.iter().copied()
    }

    pub fn media(&self) -> impl Iterator<Item = u8> + '_ {
        self.media.iter().copied()
    }

    pub fn version(&self) -> Option<u8> {
        self.expected_version
    }

    pub fn security_mode(&self) -> SecurityMode {
        self.security_mode
    }

    pub fn link_modes(&self) -> LinkModeSet {
        self.link_modes
    }

    /// Checks manufacturer, media and version. A different security mode or
    /// link mode is only logged; the telegram was already decrypted and
    /// received by then.
    pub fn check(&self, header: &TelegramHeader) -> Result<(), MeterError> {
        self.check_required(header)?;
        if header.security_mode != self.security_mode {
            warn!(
                "telegram from {} uses security mode {}, driver expects {}",
                header.id, header.security_mode, self.security_mode
            );
        }
        if let Some(mode) = header.link_mode {
            if !self.link_modes.has_mode(mode) {
                debug!("telegram from {} arrived in link mode {mode}", header.id);
            }
        }
        Ok(())
    }

    /// Same decision as [`MeterIdentity::check`] without logging anything.
    pub fn matches(&self, header: &TelegramHeader) -> bool {
        self.check_required(header).is_ok()
    }

    fn check_required(&self, header: &TelegramHeader) -> Result<(), MeterError> {
        let manufacturer = header.manufacturer & 0x7FFF;
        if !self.manufacturers.contains(&manufacturer) {
            return Err(MeterError::IdentityMismatch(format!(
                "manufacturer {} not accepted",
                id_to_manufacturer(manufacturer)
            )));
        }
        if !self.media.contains(&header.media) {
            return Err(MeterError::IdentityMismatch(format!(
                "media 0x{:02X} not accepted",
                header.media
            )));
        }
        if let Some(version) = self.expected_version {
            if header.version != version {
                return Err(MeterError::IdentityMismatch(format!(
                    "version 0x{:02X}, expected 0x{version:02X}",
                    header.version
                )));
            }
        }
        Ok(())
    }
}

/// One entry of a driver's field schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub quantity: Quantity,
    pub description: &'static str,
}

impl FieldInfo {
    /// Name with the default unit suffix, e.g. `total_energy_consumption_kwh`.
    pub fn name_with_unit(&self) -> String {
        format!("{}_{}", self.name, default_unit(self.quantity).suffix())
    }
}

/// Outcome of one field for one telegram.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// New value in the field's canonical unit.
    Updated(f64),
    /// The telegram did not carry the field; the previous value stays.
    Absent,
    /// The record was present but undecodable; the previous value stays.
    Malformed(String),
}

/// Per-telegram result of a driver's processing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub meter: String,
    pub updates: Vec<(&'static str, FieldUpdate)>,
}

impl ProcessReport {
    pub fn get(&self, field: &str) -> Option<&FieldUpdate> {
        self.updates
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, update)| update)
    }

    pub fn updated(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.updates.iter().filter_map(|(name, update)| match update {
            FieldUpdate::Updated(v) => Some((*name, *v)),
            _ => None,
        })
    }

    pub fn has_warnings(&self) -> bool {
        self.updates
            .iter()
            .any(|(_, update)| matches!(update, FieldUpdate::Malformed(_)))
    }
}

/// Latest readings of a meter, in default units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterSnapshot {
    pub name: String,
    pub driver: String,
    pub id: Option<String>,
    pub updates: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub fields: BTreeMap<String, f64>,
}

impl MeterSnapshot {
    pub fn to_json(&self) -> Result<String, MeterError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Generic meter capability.
pub trait Meter: Send + Sync {
    /// Shared metadata and update bookkeeping.
    fn common(&self) -> &MeterCommon;

    /// Field schema in declaration order.
    fn fields(&self) -> &'static [FieldInfo];

    /// Reads a field converted to `unit`.
    fn field_value(&self, field: &str, unit: Unit) -> Result<f64, MeterError>;

    /// Extracts the declared fields from a telegram that already passed the
    /// identity check. Missing or malformed records leave fields unchanged.
    fn process_content(&self, telegram: &mut Telegram) -> ProcessReport;

    fn name(&self) -> &str {
        &self.common().info().name
    }

    fn driver_name(&self) -> &'static str {
        self.common().driver()
    }

    fn ids(&self) -> &[String] {
        &self.common().info().ids
    }

    fn identity(&self) -> &MeterIdentity {
        self.common().identity()
    }

    fn is_telegram_for_me(&self, header: &TelegramHeader) -> bool {
        self.common().info().id_matches(&header.id) && self.identity().matches(header)
    }

    /// Identity check followed by [`Meter::process_content`].
    fn handle_telegram(&self, telegram: &mut Telegram) -> Result<ProcessReport, MeterError> {
        if !self.common().info().id_matches(&telegram.header.id) {
            return Err(MeterError::IdentityMismatch(format!(
                "id {} not configured for {}",
                telegram.header.id,
                self.name()
            )));
        }
        self.identity().check(&telegram.header)?;
        let report = self.process_content(telegram);
        self.common().record_update(&telegram.header);
        Ok(report)
    }

    fn snapshot(&self) -> MeterSnapshot {
        let mut fields = BTreeMap::new();
        for field in self.fields() {
            if let Ok(value) = self.field_value(field.name, default_unit(field.quantity)) {
                fields.insert(field.name_with_unit(), value);
            }
        }
        self.common().snapshot(fields)
    }

    /// The electricity meter capability, if this driver has it.
    fn electricity(&self) -> Option<&dyn ElectricityMeter> {
        None
    }
}

/// Typed accessors of an electricity meter. Each fails with
/// `DimensionMismatch` when `unit` is not of the accessor's quantity.
pub trait ElectricityMeter: Meter {
    fn total_energy_consumption(&self, unit: Unit) -> Result<f64, MeterError>;
    fn current_power_consumption(&self, unit: Unit) -> Result<f64, MeterError>;
    fn total_energy_production(&self, unit: Unit) -> Result<f64, MeterError>;
    fn current_power_production(&self, unit: Unit) -> Result<f64, MeterError>;
}
