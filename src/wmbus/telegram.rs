//! # Decoded Telegrams
//!
//! A [`Telegram`] is what the drivers receive: the identity fields of the
//! sender, the tokenized data records of the (already decrypted) application
//! layer, and a list of human-readable explanations keyed by byte offset.
//! Explanations are a diagnostic aid only and never influence decoded values.

use crate::error::MeterError;
use crate::logging::log_payload_hex;
use crate::payload::record::parse_records;
use crate::payload::store::DataRecordStore;
use crate::util::hex::decode_hex;
use crate::vendors::manufacturer::id_to_manufacturer;
use crate::wmbus::link_mode::LinkMode;
use crate::wmbus::security::SecurityMode;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Attaches notes to byte offsets of a telegram.
pub trait TelegramAnnotator {
    /// Appends `text` to the note at `offset`; earlier text is kept.
    fn add_more_explanation(&mut self, offset: usize, text: &str);
}

/// Notes per byte offset, ordered by offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Explanations {
    notes: BTreeMap<usize, String>,
}

impl Explanations {
    pub fn add(&mut self, offset: usize, text: &str) {
        self.notes.entry(offset).or_default().push_str(text);
    }

    pub fn get(&self, offset: usize) -> Option<&str> {
        self.notes.get(&offset).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.notes.iter().map(|(offset, text)| (*offset, text.as_str()))
    }

    /// One line per offset: `013: 0403 dif (...) total energy (12.345000 kwh)`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (offset, text) in self.iter() {
            let _ = writeln!(out, "{offset:03}: {text}");
        }
        out
    }
}

impl TelegramAnnotator for Explanations {
    fn add_more_explanation(&mut self, offset: usize, text: &str) {
        self.add(offset, text);
    }
}

/// Identity fields of the sending meter.
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramHeader {
    /// 15-bit FLAG manufacturer id (MSB soft-address flag allowed).
    pub manufacturer: u16,
    /// Meter id as 8 decimal digits, e.g. `"12345678"`.
    pub id: String,
    pub version: u8,
    /// Media / device type byte.
    pub media: u8,
    pub security_mode: SecurityMode,
    pub link_mode: Option<LinkMode>,
}

impl TelegramHeader {
    pub fn manufacturer_code(&self) -> String {
        id_to_manufacturer(self.manufacturer)
    }
}

#[derive(Debug, Clone)]
pub struct Telegram {
    pub header: TelegramHeader,
    pub values: DataRecordStore,
    pub explanations: Explanations,
}

impl Telegram {
    /// Tokenizes `payload`, which starts at `payload_offset` in the full telegram.
    pub fn parse(
        header: TelegramHeader,
        payload: &[u8],
        payload_offset: usize,
    ) -> Result<Self, MeterError> {
        log_payload_hex("payload", payload);
        let mut explanations = Explanations::default();
        let values = parse_records(payload, payload_offset, &mut explanations)?;
        Ok(Self {
            header,
            values,
            explanations,
        })
    }

    /// Convenience for payloads written as hex strings; offsets start at zero.
    pub fn from_hex(header: TelegramHeader, payload_hex: &str) -> Result<Self, MeterError> {
        let payload = decode_hex(payload_hex)?;
        Self::parse(header, &payload, 0)
    }

    /// A telegram with already tokenized records.
    pub fn with_records(header: TelegramHeader, values: DataRecordStore) -> Self {
        Self {
            header,
            values,
            explanations: Explanations::default(),
        }
    }
}

impl TelegramAnnotator for Telegram {
    fn add_more_explanation(&mut self, offset: usize, text: &str) {
        self.explanations.add(offset, text);
    }
}
