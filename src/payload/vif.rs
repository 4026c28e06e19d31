use crate::payload::vif_maps::{lookup_primary_vif, vif_range};
use crate::units::{default_unit, Quantity, Unit};

/// Semantic kind of a record, derived from its primary VIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueInformation {
    None,
    EnergyWh,
    EnergyMJ,
    Volume,
    Mass,
    OnTime,
    OperatingTime,
    PowerW,
    PowerJh,
    VolumeFlow,
    FlowTemperature,
    ReturnTemperature,
    Date,
    DateTime,
    HeatCostAllocation,
}

impl ValueInformation {
    /// Kind of a primary VIF; unknown codes map to `None`.
    pub fn from_vif(vif: u8) -> Self {
        lookup_primary_vif(vif)
            .map(|(kind, _)| kind)
            .unwrap_or(ValueInformation::None)
    }

    pub fn matches(self, vif: u8) -> bool {
        match vif_range(self) {
            Some((low, high)) => (low..=high).contains(&(vif & 0x7F)),
            None => false,
        }
    }

    pub fn quantity(self) -> Quantity {
        match self {
            ValueInformation::EnergyWh | ValueInformation::EnergyMJ => Quantity::Energy,
            ValueInformation::Volume => Quantity::Volume,
            ValueInformation::Mass => Quantity::Mass,
            ValueInformation::OnTime | ValueInformation::OperatingTime => Quantity::Time,
            ValueInformation::PowerW | ValueInformation::PowerJh => Quantity::Power,
            ValueInformation::VolumeFlow => Quantity::Flow,
            ValueInformation::FlowTemperature | ValueInformation::ReturnTemperature => {
                Quantity::Temperature
            }
            ValueInformation::None
            | ValueInformation::Date
            | ValueInformation::DateTime
            | ValueInformation::HeatCostAllocation => Quantity::Dimensionless,
        }
    }

    /// Unit a scaled value of this kind is expressed in.
    pub fn canonical_unit(self) -> Unit {
        default_unit(self.quantity())
    }
}

/// Divisor taking a raw record value with this VIF into the canonical unit
/// of its quantity (kWh, kW, h, m3, kg, m3/h, C). Codes without a scale
/// divide by one.
pub fn vif_scale(vif: u8) -> f64 {
    let code = vif & 0x7F;
    let n = (code & 0x07) as i32;
    let nn = (code & 0x03) as i32;
    match ValueInformation::from_vif(code) {
        // 10^(n-3) Wh
        ValueInformation::EnergyWh => 10f64.powi(6 - n),
        // 10^n J
        ValueInformation::EnergyMJ => 3.6e6 / 10f64.powi(n),
        // 10^(n-6) m3
        ValueInformation::Volume => 10f64.powi(6 - n),
        // 10^(n-3) kg
        ValueInformation::Mass => 10f64.powi(3 - n),
        ValueInformation::OnTime | ValueInformation::OperatingTime => match nn {
            0 => 3600.0,
            1 => 60.0,
            2 => 1.0,
            _ => 1.0 / 24.0,
        },
        // 10^(n-3) W
        ValueInformation::PowerW => 10f64.powi(6 - n),
        // 10^n J/h
        ValueInformation::PowerJh => 3.6e6 / 10f64.powi(n),
        // 10^(n-6) m3/h
        ValueInformation::VolumeFlow => 10f64.powi(6 - n),
        // 10^(nn-3) C
        ValueInformation::FlowTemperature | ValueInformation::ReturnTemperature => {
            10f64.powi(3 - nn)
        }
        _ => 1.0,
    }
}

/// Human-readable name of a primary VIF, for telegram explanations.
pub fn describe_vif(vif: u8) -> &'static str {
    match lookup_primary_vif(vif) {
        Some((_, name)) => name,
        None => match vif & 0x7F {
            0x78 => "Fabrication no",
            0x79 => "Enhanced identification",
            0x7A => "Bus address",
            0x7C => "Plain text",
            0x7E => "Any VIF",
            0x7F => "Manufacturer specific",
            _ => "?",
        },
    }
}
