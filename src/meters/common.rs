//! State every driver carries regardless of its fields.

use crate::config::MeterInfo;
use crate::error::MeterError;
use crate::meters::{MeterIdentity, MeterSnapshot};
use crate::wmbus::handle::WMBusHandle;
use crate::wmbus::telegram::TelegramHeader;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct UpdateState {
    updates: u64,
    last_id: Option<String>,
    last_update: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct MeterCommon {
    info: MeterInfo,
    driver: &'static str,
    identity: MeterIdentity,
    bus: String,
    state: Mutex<UpdateState>,
}

impl MeterCommon {
    /// Validates `info` and widens `identity` with its overrides.
    pub fn new(
        bus: &WMBusHandle,
        info: MeterInfo,
        driver: &'static str,
        identity: MeterIdentity,
    ) -> Result<Self, MeterError> {
        info.validate()?;
        let identity = identity.with_overrides(&info.identity)?;
        if !bus.can_hear(identity.link_modes()) {
            warn!(
                "meter {} transmits {} but bus {} listens to {}",
                info.name,
                identity.link_modes(),
                bus.name(),
                bus.listening_to()
            );
        }
        info!("meter {} ({driver}) attached to {}", info.name, bus.name());
        Ok(Self {
            info,
            driver,
            identity,
            bus: bus.name().to_string(),
            state: Mutex::new(UpdateState::default()),
        })
    }

    pub fn info(&self) -> &MeterInfo {
        &self.info
    }

    pub fn driver(&self) -> &'static str {
        self.driver
    }

    pub fn identity(&self) -> &MeterIdentity {
        &self.identity
    }

    pub fn bus(&self) -> &str {
        &self.bus
    }

    fn state(&self) -> MutexGuard<'_, UpdateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_update(&self, header: &TelegramHeader) {
        let mut state = self.state();
        state.updates += 1;
        state.last_id = Some(header.id.clone());
        state.last_update = Some(Utc::now());
    }

    pub fn num_updates(&self) -> u64 {
        self.state().updates
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state().last_update
    }

    pub(crate) fn snapshot(&self, fields: BTreeMap<String, f64>) -> MeterSnapshot {
        let state = self.state();
        MeterSnapshot {
            name: self.info.name.clone(),
            driver: self.driver.to_string(),
            id: state.last_id.clone(),
            updates: state.updates,
            timestamp: state.last_update,
            fields,
        }
    }
}
