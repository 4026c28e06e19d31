//! # Wireless M-Bus (wM-Bus) Handle
//!
//! The receiving side a meter is attached to: a named bus device and the link
//! modes it listens to. Meters are created against a handle so they can warn
//! when the bus would never hear them.

use crate::wmbus::link_mode::LinkModeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct WMBusHandle {
    name: String,
    listening_to: LinkModeSet,
}

impl WMBusHandle {
    pub fn new(name: &str, listening_to: LinkModeSet) -> Self {
        Self {
            name: name.to_string(),
            listening_to,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn listening_to(&self) -> LinkModeSet {
        self.listening_to
    }

    /// True if any of `modes` can be received on this bus.
    pub fn can_hear(&self, modes: LinkModeSet) -> bool {
        self.listening_to.intersects(modes)
    }
}
