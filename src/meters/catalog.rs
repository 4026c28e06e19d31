//! # Driver Catalog
//!
//! The set of drivers known to the process. A catalog is built once at
//! startup, usually with [`DriverCatalog::with_defaults`], and handed by
//! reference to whatever creates meters.
//!
//! ```rust
//! use wmbus_meters::meters::catalog::DriverCatalog;
//!
//! let catalog = DriverCatalog::with_defaults().unwrap();
//! assert!(catalog.lookup("ehzp").is_some());
//! assert!(catalog.lookup("nosuchdriver").is_none());
//! ```

use crate::config::MeterInfo;
use crate::error::MeterError;
use crate::meters::{ehzp, Meter, MeterIdentity};
use crate::wmbus::handle::WMBusHandle;
use crate::wmbus::telegram::TelegramHeader;
use log::debug;
use std::fmt;

pub type DriverFactory = fn(&WMBusHandle, MeterInfo) -> Result<Box<dyn Meter>, MeterError>;

#[derive(Clone)]
pub struct DriverRegistration {
    pub name: &'static str,
    pub description: &'static str,
    /// Identity before any configured overrides.
    pub identity: MeterIdentity,
    pub factory: DriverFactory,
}

impl fmt::Debug for DriverRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverCatalog {
    drivers: Vec<DriverRegistration>,
}

impl DriverCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with all built-in drivers.
    pub fn with_defaults() -> Result<Self, MeterError> {
        let mut catalog = Self::new();
        catalog.register(DriverRegistration {
            name: ehzp::DRIVER_NAME,
            description: "EHZP electricity meter",
            identity: ehzp::identity(),
            factory: ehzp::create,
        })?;
        Ok(catalog)
    }

    /// Adds a driver; names must be unique.
    pub fn register(&mut self, registration: DriverRegistration) -> Result<(), MeterError> {
        if self.lookup(registration.name).is_some() {
            return Err(MeterError::Other(format!(
                "driver {} already registered",
                registration.name
            )));
        }
        debug!("registered driver {}", registration.name);
        self.drivers.push(registration);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&DriverRegistration> {
        self.drivers
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.drivers.iter().map(|d| d.name)
    }

    /// First driver, in registration order, whose identity accepts the header.
    pub fn detect(&self, header: &TelegramHeader) -> Option<&DriverRegistration> {
        self.drivers.iter().find(|d| d.identity.matches(header))
    }

    /// Creates a meter with the driver named in `info`. The driver name
    /// `auto` is not resolved here; callers detect the driver first.
    pub fn create(
        &self,
        bus: &WMBusHandle,
        info: MeterInfo,
    ) -> Result<Box<dyn Meter>, MeterError> {
        let registration = self
            .lookup(&info.driver)
            .ok_or_else(|| MeterError::UnknownDriver(info.driver.clone()))?;
        (registration.factory)(bus, info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::manufacturer::{MANUFACTURER_DEV, MANUFACTURER_KAM};
    use crate::wmbus::link_mode::LinkModeSet;
    use crate::wmbus::security::SecurityMode;

    fn header(manufacturer: u16, media: u8) -> TelegramHeader {
        TelegramHeader {
            manufacturer,
            id: "00000001".to_string(),
            version: 0x02,
            media,
            security_mode: SecurityMode::AesCbcIv,
            link_mode: None,
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut catalog = DriverCatalog::with_defaults().unwrap();
        let again = catalog.lookup("EHZP").unwrap().clone();
        assert!(catalog.register(again).is_err());
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["ehzp"]);
    }

    #[test]
    fn test_detect() {
        let catalog = DriverCatalog::with_defaults().unwrap();
        assert_eq!(
            catalog.detect(&header(MANUFACTURER_DEV, 0x37)).map(|d| d.name),
            Some("ehzp")
        );
        assert!(catalog.detect(&header(MANUFACTURER_KAM, 0x02)).is_none());
    }

    #[test]
    fn test_create_unknown_driver() {
        let catalog = DriverCatalog::with_defaults().unwrap();
        let bus = WMBusHandle::new("bus", LinkModeSet::T1);
        let result = catalog.create(&bus, MeterInfo::new("m", "multical21", &["*"]));
        assert!(matches!(result, Err(MeterError::UnknownDriver(d)) if d == "multical21"));
    }
}
