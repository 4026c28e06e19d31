//! M-Bus Data Record Constants
//!
//! This module defines constants used by the application layer record
//! tokenizer, based on the EN 13757-3 standard.

/// DIF (Data Information Field) mask for data length / encoding
pub const MBUS_DATA_RECORD_DIF_MASK_DATA: u8 = 0x0F;

/// DIF mask for function
pub const MBUS_DATA_RECORD_DIF_MASK_FUNCTION: u8 = 0x30;

/// DIF mask for storage number LSB
pub const MBUS_DATA_RECORD_DIF_MASK_STORAGE_NO: u8 = 0x40;

/// DIFE (Data Information Field Extension) mask for storage number
pub const MBUS_DATA_RECORD_DIFE_MASK_STORAGE_NO: u8 = 0x0F;

/// DIFE mask for tariff
pub const MBUS_DATA_RECORD_DIFE_MASK_TARIFF: u8 = 0x30;

/// DIFE mask for device (subunit)
pub const MBUS_DATA_RECORD_DIFE_MASK_DEVICE: u8 = 0x40;

/// DIF idle filler
pub const MBUS_DIB_DIF_IDLE_FILLER: u8 = 0x2F;

/// DIF manufacturer specific
pub const MBUS_DIB_DIF_MANUFACTURER_SPECIFIC: u8 = 0x0F;

/// DIF more records follow
pub const MBUS_DIB_DIF_MORE_RECORDS_FOLLOW: u8 = 0x1F;

/// DIF extension bit
pub const MBUS_DIB_DIF_EXTENSION_BIT: u8 = 0x80;

/// VIF without extension
pub const MBUS_DIB_VIF_WITHOUT_EXTENSION: u8 = 0x7F;

/// VIF extension bit
pub const MBUS_DIB_VIF_EXTENSION_BIT: u8 = 0x80;

/// VIF plain text (ASCII unit follows)
pub const MBUS_DIB_VIF_PLAIN_TEXT: u8 = 0x7C;

/// First extension table selector (main VIFE code table)
pub const MBUS_DIB_VIF_EXTENSION_FD: u8 = 0xFD;

/// Second extension table selector
pub const MBUS_DIB_VIF_EXTENSION_FB: u8 = 0xFB;

/// Combinable VIFE marking a backward flow (returned) value
pub const MBUS_VIFE_BACKWARD_FLOW: u8 = 0x3C;

/// Maximum number of DIFE/VIFE bytes accepted per record
pub const MBUS_MAX_EXTENSIONS: usize = 10;

/// Maximum plain text VIF length
pub const MBUS_VALUE_INFO_BLOCK_CUSTOM_VIF_SIZE: u8 = 16;
