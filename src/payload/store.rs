//! # Data Record Store
//!
//! The decoded records of one telegram, in parse order, with keyed lookup.
//! Drivers find records in two ways:
//!
//! - semantically, by measurement type, value information and storage number
//!   (the first record in parse order that fits wins), or
//! - literally, by the exact uppercase hex key of a manufacturer specific tag.
//!
//! Extraction decodes the record bytes and scales the result into the
//! canonical unit of the record's quantity.

use crate::error::MeterError;
use crate::payload::data_encoding::decode_numeric;
use crate::payload::record::{DataRecord, MeasurementType, TypeCode};
use crate::payload::vif::{vif_scale, ValueInformation};
use crate::units::Unit;
use std::collections::HashMap;

/// How a driver field locates its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLookup {
    /// Storage number `None` matches any storage number.
    Semantic {
        measurement: MeasurementType,
        value_information: ValueInformation,
        storage_nr: Option<u64>,
    },
    Literal(&'static str),
}

impl RecordLookup {
    pub const fn semantic(
        measurement: MeasurementType,
        value_information: ValueInformation,
        storage_nr: u64,
    ) -> Self {
        RecordLookup::Semantic {
            measurement,
            value_information,
            storage_nr: Some(storage_nr),
        }
    }

    pub const fn literal(key: &'static str) -> Self {
        RecordLookup::Literal(key)
    }
}

/// A decoded and scaled value together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub key: String,
    pub value: f64,
    /// Unit of `value` when it was scaled, otherwise `None` (raw value).
    pub unit: Option<Unit>,
    pub offset: usize,
    pub type_code: TypeCode,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRecordStore {
    records: Vec<DataRecord>,
    index: HashMap<String, usize>,
    manufacturer_data: Option<(usize, Vec<u8>)>,
}

impl DataRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns the key it is stored under. A repeated
    /// tag is stored as `KEY_2`, `KEY_3`, ... so the bare key keeps pointing
    /// at the first occurrence.
    ///
    /// Records arrive in payload order, so offsets never decrease.
    pub(crate) fn push(
        &mut self,
        type_code: TypeCode,
        data: Vec<u8>,
        offset: usize,
        header_offset: usize,
    ) -> Result<String, MeterError> {
        if let Some(last) = self.records.last() {
            if header_offset < last.offset + last.data.len() || offset < header_offset {
                return Err(MeterError::RecordParseError(format!(
                    "record at offset {offset} overlaps or precedes record {} at {}",
                    last.key, last.offset
                )));
            }
        } else if offset < header_offset {
            return Err(MeterError::RecordParseError(format!(
                "data offset {offset} before header offset {header_offset}"
            )));
        }

        let base = type_code.key();
        let mut key = base.clone();
        let mut n = 1;
        while self.index.contains_key(&key) {
            n += 1;
            key = format!("{base}_{n}");
        }

        self.index.insert(key.clone(), self.records.len());
        self.records.push(DataRecord {
            key: key.clone(),
            type_code,
            data,
            offset,
            header_offset,
        });
        Ok(key)
    }

    pub(crate) fn set_manufacturer_data(&mut self, offset: usize, data: Vec<u8>) {
        self.manufacturer_data = Some((offset, data));
    }

    /// Trailing manufacturer specific bytes after a 0x0F/0x1F DIF.
    pub fn manufacturer_data(&self) -> Option<(usize, &[u8])> {
        self.manufacturer_data
            .as_ref()
            .map(|(offset, data)| (*offset, data.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in parse order.
    pub fn iter(&self) -> impl Iterator<Item = &DataRecord> {
        self.records.iter()
    }

    pub fn get(&self, key: &str) -> Option<&DataRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Semantic lookup: key of the first record whose VIF falls in the
    /// value information range and whose function and storage number fit.
    /// Backward flow records are only reachable by their literal key.
    pub fn find_key(
        &self,
        measurement: MeasurementType,
        value_information: ValueInformation,
        storage_nr: Option<u64>,
    ) -> Option<&str> {
        self.records
            .iter()
            .find(|r| {
                let tc = &r.type_code;
                !tc.has_extension_table_vif()
                    && !tc.is_backward_flow()
                    && value_information.matches(tc.vif)
                    && measurement.accepts(tc.measurement_type())
                    && storage_nr.map_or(true, |s| s == tc.storage_nr())
            })
            .map(|r| r.key.as_str())
    }

    /// Resolves a lookup to the key it refers to in this telegram.
    pub fn resolve(&self, lookup: &RecordLookup) -> Option<&str> {
        match lookup {
            RecordLookup::Semantic {
                measurement,
                value_information,
                storage_nr,
            } => self.find_key(*measurement, *value_information, *storage_nr),
            RecordLookup::Literal(key) => self.get(key).map(|r| r.key.as_str()),
        }
    }

    /// Decodes the record under `key`. With `auto_scale` the value is
    /// divided by the VIF scale so it lands in the canonical unit.
    pub fn extract_double(&self, key: &str, auto_scale: bool) -> Result<Extracted, MeterError> {
        let record = self
            .get(key)
            .ok_or_else(|| MeterError::FieldNotFound(key.to_string()))?;
        let tc = &record.type_code;

        let raw = decode_numeric(tc.encoding(), &record.data).map_err(|reason| {
            MeterError::MalformedRecord {
                key: key.to_string(),
                reason,
            }
        })?;

        let (value, unit) = if auto_scale && !tc.has_extension_table_vif() {
            let vi = tc.value_information();
            let unit = (vi != ValueInformation::None).then(|| vi.canonical_unit());
            (raw / vif_scale(tc.vif), unit)
        } else {
            (raw, None)
        };

        Ok(Extracted {
            key: record.key.clone(),
            value,
            unit,
            offset: record.offset,
            type_code: tc.clone(),
        })
    }

    /// Resolves and extracts in one step; an unresolved lookup is
    /// `FieldNotFound`.
    pub fn extract(&self, lookup: &RecordLookup) -> Result<Extracted, MeterError> {
        let key = match self.resolve(lookup) {
            Some(key) => key,
            None => {
                let wanted = match lookup {
                    RecordLookup::Literal(key) => key.to_string(),
                    RecordLookup::Semantic { value_information, .. } => {
                        format!("{value_information:?}")
                    }
                };
                return Err(MeterError::FieldNotFound(wanted));
            }
        };
        self.extract_double(key, true)
    }
}
