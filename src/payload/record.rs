//! # Variable Data Record Tokenizer
//!
//! Splits a plain application layer payload into data records. Each record is
//! identified by a [`TypeCode`] built from its DIF, DIFE, VIF and VIFE bytes;
//! the uppercase hex rendering of those bytes is the record key drivers look
//! up (`"0403"`, `"07803C"`, ...).

use crate::constants::*;
use crate::error::MeterError;
use crate::payload::data_encoding::DataEncoding;
use crate::payload::store::DataRecordStore;
use crate::payload::vif::{describe_vif, ValueInformation};
use crate::payload::vif_maps::describe_combinable_vife;
use crate::util::hex::{decode_hex, encode_hex_upper, is_literal_key};
use crate::wmbus::telegram::Explanations;
use log::debug;
use nom::{bytes::complete::take, number::complete::le_u8, IResult};

/// Function field of the DIF, or `Any` when searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementType {
    Any,
    Instantaneous,
    Maximum,
    Minimum,
    AtError,
}

impl MeasurementType {
    pub fn from_dif(dif: u8) -> Self {
        match (dif & MBUS_DATA_RECORD_DIF_MASK_FUNCTION) >> 4 {
            0 => MeasurementType::Instantaneous,
            1 => MeasurementType::Maximum,
            2 => MeasurementType::Minimum,
            _ => MeasurementType::AtError,
        }
    }

    /// True if a record with function `other` satisfies this search pattern.
    pub fn accepts(self, other: MeasurementType) -> bool {
        self == MeasurementType::Any || self == other
    }

    pub fn describe(self) -> &'static str {
        match self {
            MeasurementType::Any => "Any",
            MeasurementType::Instantaneous => "Instantaneous value",
            MeasurementType::Maximum => "Maximum value",
            MeasurementType::Minimum => "Minimum value",
            MeasurementType::AtError => "Value during error state",
        }
    }
}

/// Structured form of a record tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeCode {
    pub dif: u8,
    pub difes: Vec<u8>,
    pub vif: u8,
    pub vifes: Vec<u8>,
    pub plain_text_unit: Option<String>,
}

impl TypeCode {
    /// Parses a literal key such as `"07803C"` into its DIF/VIF parts.
    pub fn from_key(key: &str) -> Result<Self, MeterError> {
        if !is_literal_key(key) {
            return Err(MeterError::RecordParseError(format!("bad key {key:?}")));
        }
        let bytes = decode_hex(key)?;
        let (rest, type_code) = parse_type_code(&bytes)
            .map_err(|e| MeterError::RecordParseError(format!("key {key}: {e:?}")))?;
        if !rest.is_empty() {
            return Err(MeterError::RecordParseError(format!(
                "key {key} has {} trailing bytes",
                rest.len()
            )));
        }
        Ok(type_code)
    }

    /// Uppercase hex of DIF, DIFEs, VIF and VIFEs.
    pub fn key(&self) -> String {
        let mut bytes = Vec::with_capacity(2 + self.difes.len() + self.vifes.len());
        bytes.push(self.dif);
        bytes.extend_from_slice(&self.difes);
        bytes.push(self.vif);
        bytes.extend_from_slice(&self.vifes);
        encode_hex_upper(&bytes)
    }

    pub fn encoding(&self) -> DataEncoding {
        DataEncoding::from_dif(self.dif)
    }

    pub fn measurement_type(&self) -> MeasurementType {
        MeasurementType::from_dif(self.dif)
    }

    /// One bit from the DIF and four per DIFE, so ten DIFEs need 41 bits.
    pub fn storage_nr(&self) -> u64 {
        let mut storage = u64::from((self.dif & MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO) >> 6);
        for (i, dife) in self.difes.iter().enumerate() {
            storage |= u64::from(dife & MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO) << (1 + 4 * i);
        }
        storage
    }

    pub fn tariff(&self) -> u32 {
        self.difes.iter().enumerate().fold(0, |acc, (i, dife)| {
            acc | u32::from((dife & MBUS_DATA_RECORD_DIFE_MASK_TARIFF) >> 4) << (2 * i)
        })
    }

    pub fn subunit(&self) -> u32 {
        self.difes.iter().enumerate().fold(0, |acc, (i, dife)| {
            acc | u32::from((dife & MBUS_DATA_RECORD_DIFE_MASK_DEVICE) >> 6) << i
        })
    }

    /// VIF selecting one of the extension tables (0xFB/0xFD).
    pub fn has_extension_table_vif(&self) -> bool {
        self.vif == MBUS_DIB_VIF_EXTENSION_FB || self.vif == MBUS_DIB_VIF_EXTENSION_FD
    }

    /// Value counted against the normal flow direction, e.g. energy returned
    /// to the grid (`07803C`).
    pub fn is_backward_flow(&self) -> bool {
        !self.has_extension_table_vif()
            && self
                .vifes
                .iter()
                .any(|vife| vife & MBUS_DIB_VIF_WITHOUT_EXTENSION == MBUS_VIFE_BACKWARD_FLOW)
    }

    /// Semantic kind from the primary VIF; extension table codes have none.
    pub fn value_information(&self) -> ValueInformation {
        if self.has_extension_table_vif() {
            ValueInformation::None
        } else {
            ValueInformation::from_vif(self.vif)
        }
    }

    /// One-line description used for telegram explanations.
    pub fn describe(&self) -> String {
        let mut text = format!(
            "{} dif ({} {}) vif ({})",
            self.key(),
            self.encoding().describe(),
            self.measurement_type().describe(),
            describe_vif(self.vif)
        );
        if let Some(unit) = &self.plain_text_unit {
            text.push_str(&format!(" unit \"{unit}\""));
        }
        for vife in &self.vifes {
            if let Some(name) = describe_combinable_vife(*vife) {
                text.push_str(&format!(" vife ({name})"));
            }
        }
        if self.storage_nr() != 0 {
            text.push_str(&format!(" storage {}", self.storage_nr()));
        }
        if self.tariff() != 0 {
            text.push_str(&format!(" tariff {}", self.tariff()));
        }
        text
    }
}

/// One decoded data record.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    /// Lookup key; duplicates of an earlier key carry a `_N` suffix.
    pub key: String,
    pub type_code: TypeCode,
    pub data: Vec<u8>,
    /// Absolute offset of the first data byte in the telegram.
    pub offset: usize,
    /// Absolute offset of the DIF.
    pub header_offset: usize,
}

fn parse_extensions(input: &[u8], mut last: u8) -> IResult<&[u8], Vec<u8>> {
    let mut extensions = Vec::new();
    let mut rest = input;
    while last & MBUS_DIB_DIF_EXTENSION_BIT != 0 {
        if extensions.len() >= MBUS_MAX_EXTENSIONS {
            return Err(nom::Err::Failure(nom::error::Error::new(
                rest,
                nom::error::ErrorKind::TooLarge,
            )));
        }
        let (next, byte) = le_u8(rest)?;
        extensions.push(byte);
        last = byte;
        rest = next;
    }
    Ok((rest, extensions))
}

/// DIB followed by VIB, including a plain text unit if present.
pub fn parse_type_code(input: &[u8]) -> IResult<&[u8], TypeCode> {
    let (i, dif) = le_u8(input)?;
    let (i, difes) = parse_extensions(i, dif)?;
    let (i, vif) = le_u8(i)?;
    let (mut i, vifes) = parse_extensions(i, vif)?;

    let mut plain_text_unit = None;
    if vif & MBUS_DIB_VIF_WITHOUT_EXTENSION == MBUS_DIB_VIF_PLAIN_TEXT {
        let (next, len) = le_u8(i)?;
        if len > MBUS_VALUE_INFO_BLOCK_CUSTOM_VIF_SIZE {
            return Err(nom::Err::Failure(nom::error::Error::new(
                next,
                nom::error::ErrorKind::TooLarge,
            )));
        }
        let (next, text) = take(len)(next)?;
        // Plain text units are transmitted last character first.
        plain_text_unit = Some(text.iter().rev().map(|b| *b as char).collect());
        i = next;
    }

    Ok((
        i,
        TypeCode {
            dif,
            difes,
            vif,
            vifes,
            plain_text_unit,
        },
    ))
}

/// Number of data bytes announced by an LVAR byte.
fn variable_data_length(lvar: u8) -> Result<usize, MeterError> {
    match lvar {
        0x00..=0xBF => Ok(lvar as usize),
        0xC0..=0xCF | 0xD0..=0xDF | 0xE0..=0xEF => Ok((lvar & 0x0F) as usize),
        0xF0..=0xF4 => Ok(4 * (lvar as usize - 0xEC)),
        0xF5 => Ok(48),
        0xF6 => Ok(64),
        _ => Err(MeterError::UnknownDif(lvar)),
    }
}

/// Tokenizes a decrypted application layer payload into a record store.
///
/// `base_offset` is the position of `payload[0]` inside the whole telegram,
/// so record offsets and explanations refer to telegram bytes.
pub fn parse_records(
    payload: &[u8],
    base_offset: usize,
    explanations: &mut Explanations,
) -> Result<DataRecordStore, MeterError> {
    let mut store = DataRecordStore::new();
    let mut rest = payload;
    let offset_of = |rest: &[u8]| base_offset + payload.len() - rest.len();

    while let Some(&dif) = rest.first() {
        let header_offset = offset_of(rest);

        if dif == MBUS_DIB_DIF_IDLE_FILLER {
            explanations.add(header_offset, "2F skip");
            rest = &rest[1..];
            continue;
        }

        if dif == MBUS_DIB_DIF_MANUFACTURER_SPECIFIC || dif == MBUS_DIB_DIF_MORE_RECORDS_FOLLOW {
            let blob = &rest[1..];
            explanations.add(
                header_offset,
                &format!("{dif:02X} manufacturer specific data {}", encode_hex_upper(blob)),
            );
            store.set_manufacturer_data(header_offset + 1, blob.to_vec());
            break;
        }

        let (after_header, type_code) = parse_type_code(rest).map_err(|e| match e {
            nom::Err::Incomplete(_) => MeterError::PrematureEndAtData,
            nom::Err::Error(err) | nom::Err::Failure(err) if err.input.is_empty() => {
                MeterError::PrematureEndAtData
            }
            other => MeterError::RecordParseError(format!(
                "at offset {header_offset}: {other:?}"
            )),
        })?;

        let (after_lvar, data_len) = match type_code.encoding().data_length() {
            Some(len) => (after_header, len),
            None => {
                let (&lvar, next) = after_header
                    .split_first()
                    .ok_or(MeterError::PrematureEndAtData)?;
                (next, variable_data_length(lvar)?)
            }
        };

        if after_lvar.len() < data_len {
            return Err(MeterError::PrematureEndAtData);
        }
        let data_offset = offset_of(after_lvar);
        let (data, next) = after_lvar.split_at(data_len);

        explanations.add(header_offset, &type_code.describe());
        let key = store.push(type_code, data.to_vec(), data_offset, header_offset)?;
        debug!(
            "record {key} at {data_offset}: {}",
            encode_hex_upper(data)
        );

        rest = next;
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_round_trip_of_literal_keys() {
        for key in ["07803C", "0420", "0403", "8410FB0D", "02FD17"] {
            let tc = TypeCode::from_key(key).unwrap();
            assert_eq!(tc.key(), key);
        }
    }

    #[test]
    fn test_type_code_fields() {
        let tc = TypeCode::from_key("07803C").unwrap();
        assert_eq!(tc.dif, 0x07);
        assert_eq!(tc.vif, 0x80);
        assert_eq!(tc.vifes, vec![0x3C]);
        assert_eq!(tc.encoding(), DataEncoding::Int64);
        assert_eq!(tc.value_information(), ValueInformation::EnergyWh);
        assert!(tc.is_backward_flow());
        assert!(!TypeCode::from_key("0403").unwrap().is_backward_flow());

        // DIF storage bit + DIFE storage/tariff
        let tc = TypeCode::from_key("C41303").unwrap();
        assert_eq!(tc.storage_nr(), 1 | (3 << 1));
        assert_eq!(tc.tariff(), 1);
        assert_eq!(tc.measurement_type(), MeasurementType::Instantaneous);
    }

    #[test]
    fn test_from_key_rejects_garbage() {
        assert!(TypeCode::from_key("").is_err());
        assert!(TypeCode::from_key("04").is_err());
        assert!(TypeCode::from_key("040300").is_err());
        assert!(TypeCode::from_key("xyz0").is_err());
    }

    #[test]
    fn test_measurement_type() {
        assert_eq!(MeasurementType::from_dif(0x14), MeasurementType::Maximum);
        assert_eq!(MeasurementType::from_dif(0x24), MeasurementType::Minimum);
        assert_eq!(MeasurementType::from_dif(0x34), MeasurementType::AtError);
        assert!(MeasurementType::Any.accepts(MeasurementType::AtError));
        assert!(!MeasurementType::Instantaneous.accepts(MeasurementType::Maximum));
    }

    #[test]
    fn test_parse_records_offsets() {
        // 2F filler, 0403 energy, 022B power
        let payload = [0x2F, 0x04, 0x03, 0x39, 0x30, 0x00, 0x00, 0x02, 0x2B, 0x10, 0x00];
        let mut ex = Explanations::default();
        let store = parse_records(&payload, 10, &mut ex).unwrap();
        assert_eq!(store.len(), 2);
        let energy = store.get("0403").unwrap();
        assert_eq!(energy.header_offset, 11);
        assert_eq!(energy.offset, 13);
        assert_eq!(energy.data, vec![0x39, 0x30, 0x00, 0x00]);
        assert_eq!(store.get("022B").unwrap().offset, 19);
        assert!(ex.get(10).unwrap().contains("skip"));
        assert!(ex.get(11).unwrap().starts_with("0403 dif (32 Bit Integer"));
    }

    #[test]
    fn test_parse_records_variable_length_and_manufacturer_data() {
        let payload = [0x0D, 0x78, 0x03, 0x43, 0x42, 0x41, 0x0F, 0xAA, 0xBB];
        let mut ex = Explanations::default();
        let store = parse_records(&payload, 0, &mut ex).unwrap();
        assert_eq!(store.get("0D78").unwrap().data, vec![0x43, 0x42, 0x41]);
        assert_eq!(store.manufacturer_data(), Some((7, &[0xAA, 0xBB][..])));
    }

    #[test]
    fn test_parse_records_truncated() {
        let payload = [0x04, 0x03, 0x39, 0x30];
        let mut ex = Explanations::default();
        assert_eq!(
            parse_records(&payload, 0, &mut ex).unwrap_err(),
            MeterError::PrematureEndAtData
        );
        let header_only = [0x84];
        assert_eq!(
            parse_records(&header_only, 0, &mut ex).unwrap_err(),
            MeterError::PrematureEndAtData
        );
    }

    #[test]
    fn test_storage_number_with_long_dife_chains() {
        // nine DIFEs, storage nibble 1 in the last one
        let payload = decode_hex("84 80 80 80 80 80 80 80 80 01 03 01000000").unwrap();
        let mut ex = Explanations::default();
        let store = parse_records(&payload, 0, &mut ex).unwrap();
        let record = store.iter().next().unwrap();
        assert_eq!(record.type_code.difes.len(), 9);
        assert_eq!(record.type_code.storage_nr(), 1 << 33);
        assert_eq!(record.offset, 11);

        // ten DIFEs, every storage nibble set, plus the DIF storage bit
        let payload = decode_hex("C4 8F 8F 8F 8F 8F 8F 8F 8F 8F 0F 03 02000000").unwrap();
        let mut ex = Explanations::default();
        let store = parse_records(&payload, 0, &mut ex).unwrap();
        let record = store.iter().next().unwrap();
        assert_eq!(record.type_code.difes.len(), 10);
        assert_eq!(record.type_code.storage_nr(), (1u64 << 41) - 1);
        assert!(ex.get(0).unwrap().contains(" storage 2199023255551"));

        // neither is a current value
        assert_eq!(
            store.find_key(MeasurementType::Any, ValueInformation::EnergyWh, Some(0)),
            None
        );
    }

    #[test]
    fn test_plain_text_unit() {
        // 01 7C 03 "hWk" 05
        let payload = [0x01, 0x7C, 0x03, b'h', b'W', b'k', 0x05];
        let mut ex = Explanations::default();
        let store = parse_records(&payload, 0, &mut ex).unwrap();
        let record = store.iter().next().unwrap();
        assert_eq!(record.type_code.plain_text_unit.as_deref(), Some("kWh"));
        assert_eq!(record.data, vec![0x05]);
    }
}
