//! # Quantities and Units
//!
//! Every meter field stores its value in the canonical unit of its quantity
//! kind (kWh, kW, hours, ...). Readers pick a display unit at query time and
//! the value is converted with a plain multiplicative factor. Converting
//! between units of different quantity kinds is a caller defect and is
//! reported as [`MeterError::DimensionMismatch`].

use crate::error::MeterError;
use log::error;
use std::fmt;
use std::str::FromStr;

/// Kind of physical quantity a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Energy,
    Power,
    Time,
    Volume,
    Flow,
    Temperature,
    Mass,
    Dimensionless,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::Energy => "Energy",
            Quantity::Power => "Power",
            Quantity::Time => "Time",
            Quantity::Volume => "Volume",
            Quantity::Flow => "Flow",
            Quantity::Temperature => "Temperature",
            Quantity::Mass => "Mass",
            Quantity::Dimensionless => "Dimensionless",
        };
        f.write_str(name)
    }
}

/// Units understood by the typed accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    KWH,
    WH,
    MWH,
    MJ,
    GJ,
    KW,
    W,
    MW,
    Second,
    Minute,
    Hour,
    Day,
    Year,
    M3,
    L,
    M3H,
    C,
    KG,
    Number,
}

/// (unit, quantity, factor to the SI base of the quantity, suffix)
const UNIT_TABLE: &[(Unit, Quantity, f64, &str)] = &[
    (Unit::KWH, Quantity::Energy, 3.6e6, "kwh"),
    (Unit::WH, Quantity::Energy, 3.6e3, "wh"),
    (Unit::MWH, Quantity::Energy, 3.6e9, "mwh"),
    (Unit::MJ, Quantity::Energy, 1e6, "mj"),
    (Unit::GJ, Quantity::Energy, 1e9, "gj"),
    (Unit::KW, Quantity::Power, 1e3, "kw"),
    (Unit::W, Quantity::Power, 1.0, "w"),
    (Unit::MW, Quantity::Power, 1e6, "mw"),
    (Unit::Second, Quantity::Time, 1.0, "s"),
    (Unit::Minute, Quantity::Time, 60.0, "min"),
    (Unit::Hour, Quantity::Time, 3600.0, "h"),
    (Unit::Day, Quantity::Time, 86_400.0, "d"),
    (Unit::Year, Quantity::Time, 31_557_600.0, "y"),
    (Unit::M3, Quantity::Volume, 1.0, "m3"),
    (Unit::L, Quantity::Volume, 1e-3, "l"),
    (Unit::M3H, Quantity::Flow, 1.0, "m3h"),
    (Unit::C, Quantity::Temperature, 1.0, "c"),
    (Unit::KG, Quantity::Mass, 1.0, "kg"),
    (Unit::Number, Quantity::Dimensionless, 1.0, "counter"),
];

impl Unit {
    /// All known units, in table order.
    pub fn all() -> impl Iterator<Item = Unit> {
        UNIT_TABLE.iter().map(|(u, _, _, _)| *u)
    }

    fn entry(self) -> &'static (Unit, Quantity, f64, &'static str) {
        // Every variant has exactly one row.
        UNIT_TABLE
            .iter()
            .find(|(u, _, _, _)| *u == self)
            .unwrap_or(&UNIT_TABLE[UNIT_TABLE.len() - 1])
    }

    pub fn quantity(self) -> Quantity {
        self.entry().1
    }

    /// Short lowercase suffix used in field names, e.g. `total_energy_consumption_kwh`.
    pub fn suffix(self) -> &'static str {
        self.entry().3
    }

    fn si_factor(self) -> f64 {
        self.entry().2
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Unit {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        UNIT_TABLE
            .iter()
            .find(|(_, _, _, suffix)| *suffix == wanted)
            .map(|(u, _, _, _)| *u)
            .ok_or_else(|| MeterError::Other(format!("Unknown unit: {s}")))
    }
}

/// The unit a quantity kind is stored in.
pub fn default_unit(quantity: Quantity) -> Unit {
    match quantity {
        Quantity::Energy => Unit::KWH,
        Quantity::Power => Unit::KW,
        Quantity::Time => Unit::Hour,
        Quantity::Volume => Unit::M3,
        Quantity::Flow => Unit::M3H,
        Quantity::Temperature => Unit::C,
        Quantity::Mass => Unit::KG,
        Quantity::Dimensionless => Unit::Number,
    }
}

/// Fails with `DimensionMismatch` unless `unit` measures `quantity`.
pub fn assert_quantity(unit: Unit, quantity: Quantity) -> Result<(), MeterError> {
    if unit.quantity() == quantity {
        return Ok(());
    }
    error!("Unit {unit} requested for a {quantity} quantity");
    Err(MeterError::DimensionMismatch {
        unit: unit.to_string(),
        expected: quantity.to_string(),
    })
}

/// Converts `value` from one unit to another of the same quantity kind.
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, MeterError> {
    assert_quantity(to, from.quantity())?;
    if from == to {
        return Ok(value);
    }
    Ok(value * from.si_factor() / to.si_factor())
}
