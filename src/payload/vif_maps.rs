//! VIF range table
//!
//! Primary VIF codes as defined in EN 13757-3, grouped into the value
//! information kinds the drivers search for. The extension bit is masked off
//! before lookup.

use crate::payload::vif::ValueInformation;

/// (first VIF, last VIF, kind, description)
pub const VIF_RANGES: &[(u8, u8, ValueInformation, &str)] = &[
    (0x00, 0x07, ValueInformation::EnergyWh, "Energy Wh"),
    (0x08, 0x0F, ValueInformation::EnergyMJ, "Energy J"),
    (0x10, 0x17, ValueInformation::Volume, "Volume m3"),
    (0x18, 0x1F, ValueInformation::Mass, "Mass kg"),
    (0x20, 0x23, ValueInformation::OnTime, "On time"),
    (0x24, 0x27, ValueInformation::OperatingTime, "Operating time"),
    (0x28, 0x2F, ValueInformation::PowerW, "Power W"),
    (0x30, 0x37, ValueInformation::PowerJh, "Power J/h"),
    (0x38, 0x3F, ValueInformation::VolumeFlow, "Volume flow m3/h"),
    (0x58, 0x5B, ValueInformation::FlowTemperature, "Flow temperature"),
    (0x5C, 0x5F, ValueInformation::ReturnTemperature, "Return temperature"),
    (0x6C, 0x6C, ValueInformation::Date, "Date"),
    (0x6D, 0x6D, ValueInformation::DateTime, "Date and time"),
    (0x6E, 0x6E, ValueInformation::HeatCostAllocation, "Units for H.C.A."),
];

/// Finds the kind and description of a primary VIF.
pub fn lookup_primary_vif(vif: u8) -> Option<(ValueInformation, &'static str)> {
    let code = vif & 0x7F;
    VIF_RANGES
        .iter()
        .find(|(low, high, _, _)| (*low..=*high).contains(&code))
        .map(|(_, _, kind, name)| (*kind, *name))
}

/// Inclusive VIF range belonging to a kind, if it has one.
pub fn vif_range(kind: ValueInformation) -> Option<(u8, u8)> {
    VIF_RANGES
        .iter()
        .find(|(_, _, k, _)| *k == kind)
        .map(|(low, high, _, _)| (*low, *high))
}

/// Short descriptions of the combinable VIFE codes seen on electricity meters.
pub fn describe_combinable_vife(vife: u8) -> Option<&'static str> {
    match vife & 0x7F {
        0x3B => Some("forward flow"),
        0x3C => Some("backward flow"),
        0x3E => Some("value during lower limit exceeded"),
        0x3F => Some("value during upper limit exceeded"),
        0x74 => Some("multiplicative correction factor 10^-3"),
        0x75 => Some("multiplicative correction factor 10^-2"),
        0x76 => Some("multiplicative correction factor 10^-1"),
        0x7D => Some("multiplicative correction factor 10^3"),
        _ => None,
    }
}
