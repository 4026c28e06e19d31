//! # M-Bus Data Field Decoding
//!
//! This module decodes the data bytes of a variable data record according to
//! the encoding named by the low nibble of its DIF: little-endian two's
//! complement integers, 32-bit reals and BCD of various widths.

use crate::constants::MBUS_DATA_RECORD_DIF_MASK_DATA;
use nom::{
    bytes::complete::take,
    number::complete::{le_f32, le_i16, le_i24, le_i32, le_i64, le_i8},
    IResult,
};

/// Data field encodings (DIF bits 0-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEncoding {
    NoData,
    Int8,
    Int16,
    Int24,
    Int32,
    Real32,
    Int48,
    Int64,
    SelectionForReadout,
    Bcd2,
    Bcd4,
    Bcd6,
    Bcd8,
    VariableLength,
    Bcd12,
    Special,
}

impl DataEncoding {
    pub fn from_dif(dif: u8) -> Self {
        match dif & MBUS_DATA_RECORD_DIF_MASK_DATA {
            0x0 => DataEncoding::NoData,
            0x1 => DataEncoding::Int8,
            0x2 => DataEncoding::Int16,
            0x3 => DataEncoding::Int24,
            0x4 => DataEncoding::Int32,
            0x5 => DataEncoding::Real32,
            0x6 => DataEncoding::Int48,
            0x7 => DataEncoding::Int64,
            0x8 => DataEncoding::SelectionForReadout,
            0x9 => DataEncoding::Bcd2,
            0xA => DataEncoding::Bcd4,
            0xB => DataEncoding::Bcd6,
            0xC => DataEncoding::Bcd8,
            0xD => DataEncoding::VariableLength,
            0xE => DataEncoding::Bcd12,
            _ => DataEncoding::Special,
        }
    }

    /// Fixed data length in bytes; `None` for variable length data.
    pub fn data_length(self) -> Option<usize> {
        match self {
            DataEncoding::NoData | DataEncoding::SelectionForReadout | DataEncoding::Special => {
                Some(0)
            }
            DataEncoding::Int8 | DataEncoding::Bcd2 => Some(1),
            DataEncoding::Int16 | DataEncoding::Bcd4 => Some(2),
            DataEncoding::Int24 | DataEncoding::Bcd6 => Some(3),
            DataEncoding::Int32 | DataEncoding::Real32 | DataEncoding::Bcd8 => Some(4),
            DataEncoding::Int48 | DataEncoding::Bcd12 => Some(6),
            DataEncoding::Int64 => Some(8),
            DataEncoding::VariableLength => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            DataEncoding::NoData => "No data",
            DataEncoding::Int8 => "8 Bit Integer",
            DataEncoding::Int16 => "16 Bit Integer",
            DataEncoding::Int24 => "24 Bit Integer",
            DataEncoding::Int32 => "32 Bit Integer",
            DataEncoding::Real32 => "32 Bit Real",
            DataEncoding::Int48 => "48 Bit Integer",
            DataEncoding::Int64 => "64 Bit Integer",
            DataEncoding::SelectionForReadout => "Selection for Readout",
            DataEncoding::Bcd2 => "2 digit BCD",
            DataEncoding::Bcd4 => "4 digit BCD",
            DataEncoding::Bcd6 => "6 digit BCD",
            DataEncoding::Bcd8 => "8 digit BCD",
            DataEncoding::VariableLength => "Variable length",
            DataEncoding::Bcd12 => "12 digit BCD",
            DataEncoding::Special => "Special functions",
        }
    }
}

/// Decodes the numeric value of a data field, or explains why it cannot be.
pub fn decode_numeric(encoding: DataEncoding, data: &[u8]) -> Result<f64, String> {
    let expected = match encoding.data_length() {
        Some(len) if len > 0 => len,
        _ => return Err(format!("{} is not numeric", encoding.describe())),
    };
    if data.len() != expected {
        return Err(format!(
            "{} needs {expected} bytes, got {}",
            encoding.describe(),
            data.len()
        ));
    }

    let result: IResult<&[u8], f64> = match encoding {
        DataEncoding::Int8 => le_i8(data).map(|(i, v)| (i, v as f64)),
        DataEncoding::Int16 => le_i16(data).map(|(i, v)| (i, v as f64)),
        DataEncoding::Int24 => le_i24(data).map(|(i, v)| (i, v as f64)),
        DataEncoding::Int32 => le_i32(data).map(|(i, v)| (i, v as f64)),
        DataEncoding::Int48 => decode_i48(data).map(|(i, v)| (i, v as f64)),
        DataEncoding::Int64 => le_i64(data).map(|(i, v)| (i, v as f64)),
        DataEncoding::Real32 => le_f32(data).map(|(i, v)| (i, v as f64)),
        _ => return decode_bcd(data),
    };

    let (_, value) = result.map_err(|e| format!("{e:?}"))?;
    if !value.is_finite() {
        return Err("value is not finite".to_string());
    }
    Ok(value)
}

fn decode_i48(input: &[u8]) -> IResult<&[u8], i64> {
    let (rest, bytes) = take(6usize)(input)?;
    let value = bytes
        .iter()
        .rev()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    // sign-extend from bit 47
    Ok((rest, ((value << 16) as i64) >> 16))
}

/// Decodes little-endian BCD. A high nibble of 0xF in the most significant
/// byte marks a negative value.
pub fn decode_bcd(data: &[u8]) -> Result<f64, String> {
    let mut value: i64 = 0;
    let mut negative = false;

    for (i, byte) in data.iter().enumerate().rev() {
        let mut high = byte >> 4;
        let low = byte & 0x0F;
        if i == data.len() - 1 && high == 0x0F {
            negative = true;
            high = 0;
        }
        if high > 9 || low > 9 {
            return Err(format!("invalid BCD byte 0x{byte:02X}"));
        }
        value = value * 100 + i64::from(high) * 10 + i64::from(low);
    }

    Ok(if negative { -(value as f64) } else { value as f64 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_little_endian() {
        assert_eq!(decode_numeric(DataEncoding::Int16, &[0x39, 0x30]).unwrap(), 12345.0);
        assert_eq!(decode_numeric(DataEncoding::Int24, &[0x01, 0x00, 0x01]).unwrap(), 65537.0);
        assert_eq!(
            decode_numeric(DataEncoding::Int32, &[0x39, 0x30, 0x00, 0x00]).unwrap(),
            12345.0
        );
        assert_eq!(
            decode_numeric(DataEncoding::Int48, &[0x01, 0, 0, 0, 0, 0x01]).unwrap(),
            (1u64 << 40 | 1) as f64
        );
        assert_eq!(
            decode_numeric(DataEncoding::Int64, &[0x20, 0xA1, 0x07, 0, 0, 0, 0, 0]).unwrap(),
            500_000.0
        );
    }

    #[test]
    fn test_integers_are_signed() {
        assert_eq!(decode_numeric(DataEncoding::Int8, &[0xFF]).unwrap(), -1.0);
        assert_eq!(decode_numeric(DataEncoding::Int16, &[0xFF, 0xFF]).unwrap(), -1.0);
        assert_eq!(decode_numeric(DataEncoding::Int16, &[0xFF, 0x7F]).unwrap(), 32767.0);
        assert_eq!(decode_numeric(DataEncoding::Int24, &[0x00, 0x00, 0x80]).unwrap(), -8388608.0);
        assert_eq!(
            decode_numeric(DataEncoding::Int32, &[0xC7, 0xCF, 0xFF, 0xFF]).unwrap(),
            -12345.0
        );
        assert_eq!(
            decode_numeric(DataEncoding::Int48, &[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            -2.0
        );
        assert_eq!(decode_numeric(DataEncoding::Int64, &[0xFF; 8]).unwrap(), -1.0);
    }

    #[test]
    fn test_real() {
        let bytes = 2.5f32.to_le_bytes();
        assert_eq!(decode_numeric(DataEncoding::Real32, &bytes).unwrap(), 2.5);
        let nan = f32::NAN.to_le_bytes();
        assert!(decode_numeric(DataEncoding::Real32, &nan).is_err());
    }

    #[test]
    fn test_bcd() {
        assert_eq!(decode_numeric(DataEncoding::Bcd8, &[0x45, 0x23, 0x01, 0x00]).unwrap(), 12345.0);
        assert_eq!(decode_numeric(DataEncoding::Bcd4, &[0x21, 0xF0]).unwrap(), -21.0);
        assert!(decode_numeric(DataEncoding::Bcd2, &[0x1A]).is_err());
    }

    #[test]
    fn test_non_numeric_and_short_data() {
        assert!(decode_numeric(DataEncoding::NoData, &[]).is_err());
        assert!(decode_numeric(DataEncoding::VariableLength, &[0x41]).is_err());
        assert!(decode_numeric(DataEncoding::Int32, &[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_encoding_from_dif() {
        assert_eq!(DataEncoding::from_dif(0x04), DataEncoding::Int32);
        assert_eq!(DataEncoding::from_dif(0x84), DataEncoding::Int32);
        assert_eq!(DataEncoding::from_dif(0x07), DataEncoding::Int64);
        assert_eq!(DataEncoding::from_dif(0x0D).data_length(), None);
    }
}
