//! # Meter Manager
//!
//! Owns the configured meters and routes every decoded telegram to the meters
//! it belongs to. A telegram reaches a driver only when the meter's configured
//! id patterns accept the sender id and the driver identity accepts the
//! manufacturer, media and version. Everything else is dropped here.
//!
//! Meters configured with the driver name `auto` are created on the first
//! telegram from a matching id, with the driver the catalog detects for it.

use crate::config::{Config, MeterInfo};
use crate::error::MeterError;
use crate::meters::catalog::DriverCatalog;
use crate::meters::{Meter, ProcessReport};
use crate::vendors::manufacturer::get_manufacturer_name;
use crate::wmbus::handle::WMBusHandle;
use crate::wmbus::telegram::{Telegram, TelegramHeader};
use log::{debug, info, warn};

pub const AUTO_DRIVER: &str = "auto";

pub struct MeterManager<'c> {
    catalog: &'c DriverCatalog,
    bus: WMBusHandle,
    meters: Vec<Box<dyn Meter>>,
    /// `auto` meters that have not seen a telegram yet.
    pending: Vec<MeterInfo>,
}

impl<'c> MeterManager<'c> {
    pub fn new(catalog: &'c DriverCatalog, bus: WMBusHandle) -> Self {
        Self {
            catalog,
            bus,
            meters: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Creates every configured meter.
    pub fn from_config(
        catalog: &'c DriverCatalog,
        bus: WMBusHandle,
        config: &Config,
    ) -> Result<Self, MeterError> {
        config.validate()?;
        let mut manager = Self::new(catalog, bus);
        for info in &config.meters {
            manager.add_meter(info.clone())?;
        }
        Ok(manager)
    }

    pub fn add_meter(&mut self, info: MeterInfo) -> Result<(), MeterError> {
        if self.meter(&info.name).is_some() || self.pending.iter().any(|p| p.name == info.name) {
            return Err(MeterError::ConfigError(format!(
                "meter {} already added",
                info.name
            )));
        }
        if info.driver.eq_ignore_ascii_case(AUTO_DRIVER) {
            info.validate()?;
            info!("meter {} waits for a telegram to pick its driver", info.name);
            self.pending.push(info);
            return Ok(());
        }
        let meter = self.catalog.create(&self.bus, info)?;
        self.meters.push(meter);
        Ok(())
    }

    pub fn meter(&self, name: &str) -> Option<&dyn Meter> {
        self.meters
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }

    pub fn meters(&self) -> &[Box<dyn Meter>] {
        &self.meters
    }

    pub fn len(&self) -> usize {
        self.meters.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bus(&self) -> &WMBusHandle {
        &self.bus
    }

    /// Resolves `auto` meters whose ids accept this sender.
    fn resolve_pending(&mut self, header: &TelegramHeader) {
        let catalog = self.catalog;
        let mut i = 0;
        while i < self.pending.len() {
            if !self.pending[i].id_matches(&header.id) {
                i += 1;
                continue;
            }
            let Some(driver) = catalog.detect(header) else {
                debug!(
                    "no driver for {} from {} media 0x{:02X}",
                    header.id,
                    header.manufacturer_code(),
                    header.media
                );
                i += 1;
                continue;
            };
            let mut info = self.pending.remove(i);
            info.driver = driver.name.to_string();
            info!("meter {} detected as {}", info.name, info.driver);
            match (driver.factory)(&self.bus, info) {
                Ok(meter) => self.meters.push(meter),
                Err(e) => warn!("could not create detected meter: {e}"),
            }
        }
    }

    /// Hands the telegram to every meter it belongs to and returns their
    /// reports. An empty result means nobody wanted it.
    pub fn dispatch(&mut self, telegram: &mut Telegram) -> Vec<ProcessReport> {
        if !self.pending.is_empty() {
            self.resolve_pending(&telegram.header);
        }

        let mut reports = Vec::new();
        for meter in &self.meters {
            if !meter.is_telegram_for_me(&telegram.header) {
                continue;
            }
            match meter.handle_telegram(telegram) {
                Ok(report) => reports.push(report),
                Err(e) => warn!("meter {} rejected telegram: {e}", meter.name()),
            }
        }

        if reports.is_empty() {
            debug!(
                "telegram from {} ({}) matched no meter",
                telegram.header.id,
                get_manufacturer_name(telegram.header.manufacturer)
            );
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::store::DataRecordStore;
    use crate::vendors::manufacturer::MANUFACTURER_APA;
    use crate::wmbus::link_mode::LinkModeSet;
    use crate::wmbus::security::SecurityMode;

    fn telegram(id: &str) -> Telegram {
        let header = TelegramHeader {
            manufacturer: MANUFACTURER_APA,
            id: id.to_string(),
            version: 0x02,
            media: 0x02,
            security_mode: SecurityMode::AesCbcIv,
            link_mode: None,
        };
        Telegram::with_records(header, DataRecordStore::new())
    }

    #[test]
    fn test_duplicate_meter_names() {
        let catalog = DriverCatalog::with_defaults().unwrap();
        let mut manager = MeterManager::new(&catalog, WMBusHandle::new("bus", LinkModeSet::T1));
        manager.add_meter(MeterInfo::new("a", "ehzp", &["*"])).unwrap();
        assert!(manager.add_meter(MeterInfo::new("a", "auto", &["*"])).is_err());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_auto_meter_is_created_on_first_telegram() {
        let catalog = DriverCatalog::with_defaults().unwrap();
        let mut manager = MeterManager::new(&catalog, WMBusHandle::new("bus", LinkModeSet::T1));
        manager.add_meter(MeterInfo::new("a", "auto", &["1111*"])).unwrap();
        assert!(manager.meter("a").is_none());

        assert!(manager.dispatch(&mut telegram("22220000")).is_empty());
        assert!(manager.meter("a").is_none());

        let reports = manager.dispatch(&mut telegram("11110000"));
        assert_eq!(reports.len(), 1);
        assert_eq!(manager.meter("a").unwrap().driver_name(), "ehzp");
        assert_eq!(manager.len(), 1);
    }
}
