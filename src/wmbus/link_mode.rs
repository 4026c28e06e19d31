//! # wM-Bus Link Modes
//!
//! Link modes (EN 13757-4) a meter transmits in and a receiver listens to.
//! Drivers declare the modes their meters use; a bus handle declares the modes
//! it can receive. Sets of modes are kept as bitflags so intersections are
//! cheap.

use crate::error::MeterError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wireless M-Bus communication modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// C-mode: 100 kbps with NRZ encoding
    C1,
    /// T-mode: 100 kbps with 3-out-of-6 encoding
    T1,
    /// S-mode: 32.768 kbps with Manchester encoding
    S1,
    /// S-mode with frequent short preamble
    S1m,
    N1a,
    N1b,
    N1c,
    N1d,
    N1e,
    N1f,
    /// Wired M-Bus
    MBus,
}

const LINK_MODE_NAMES: &[(LinkMode, &str, LinkModeSet)] = &[
    (LinkMode::C1, "c1", LinkModeSet::C1),
    (LinkMode::T1, "t1", LinkModeSet::T1),
    (LinkMode::S1, "s1", LinkModeSet::S1),
    (LinkMode::S1m, "s1m", LinkModeSet::S1M),
    (LinkMode::N1a, "n1a", LinkModeSet::N1A),
    (LinkMode::N1b, "n1b", LinkModeSet::N1B),
    (LinkMode::N1c, "n1c", LinkModeSet::N1C),
    (LinkMode::N1d, "n1d", LinkModeSet::N1D),
    (LinkMode::N1e, "n1e", LinkModeSet::N1E),
    (LinkMode::N1f, "n1f", LinkModeSet::N1F),
    (LinkMode::MBus, "mbus", LinkModeSet::MBUS),
];

impl LinkMode {
    pub fn name(self) -> &'static str {
        LINK_MODE_NAMES
            .iter()
            .find(|(m, _, _)| *m == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("?")
    }

    /// Effective data rate after line encoding, in bits per second.
    pub fn data_rate(self) -> u32 {
        match self {
            LinkMode::T1 => 66_667,
            LinkMode::S1 | LinkMode::S1m => 16_384,
            LinkMode::C1 => 100_000,
            LinkMode::N1a | LinkMode::N1b | LinkMode::N1c | LinkMode::N1d => 4_800,
            LinkMode::N1e | LinkMode::N1f => 2_400,
            LinkMode::MBus => 2_400,
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LinkMode {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LINK_MODE_NAMES
            .iter()
            .find(|(_, name, _)| *name == wanted)
            .map(|(m, _, _)| *m)
            .ok_or_else(|| MeterError::ConfigError(format!("Unknown link mode: {s}")))
    }
}

bitflags! {
    /// A set of link modes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct LinkModeSet: u16 {
        const C1   = 0b0000_0000_0001;
        const T1   = 0b0000_0000_0010;
        const S1   = 0b0000_0000_0100;
        const S1M  = 0b0000_0000_1000;
        const N1A  = 0b0000_0001_0000;
        const N1B  = 0b0000_0010_0000;
        const N1C  = 0b0000_0100_0000;
        const N1D  = 0b0000_1000_0000;
        const N1E  = 0b0001_0000_0000;
        const N1F  = 0b0010_0000_0000;
        const MBUS = 0b0100_0000_0000;
    }
}

impl From<LinkMode> for LinkModeSet {
    fn from(mode: LinkMode) -> Self {
        LINK_MODE_NAMES
            .iter()
            .find(|(m, _, _)| *m == mode)
            .map(|(_, _, bit)| *bit)
            .unwrap_or_else(LinkModeSet::empty)
    }
}

impl FromIterator<LinkMode> for LinkModeSet {
    fn from_iter<I: IntoIterator<Item = LinkMode>>(iter: I) -> Self {
        iter.into_iter()
            .fold(LinkModeSet::empty(), |set, mode| set | LinkModeSet::from(mode))
    }
}

impl LinkModeSet {
    pub fn has_mode(&self, mode: LinkMode) -> bool {
        self.contains(LinkModeSet::from(mode))
    }

    /// Modes contained in the set, in table order.
    pub fn modes(&self) -> Vec<LinkMode> {
        LINK_MODE_NAMES
            .iter()
            .filter(|(_, _, bit)| self.contains(*bit))
            .map(|(m, _, _)| *m)
            .collect()
    }
}

impl fmt::Display for LinkModeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.modes().into_iter().map(LinkMode::name).collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(","))
        }
    }
}
