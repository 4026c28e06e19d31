//! The payload module contains the components responsible for tokenizing the
//! application layer of a telegram into data records, decoding their values
//! and looking them up by key.

pub mod data_encoding;
pub mod record;
pub mod store;
pub mod vif;
pub mod vif_maps;

pub use data_encoding::{decode_numeric, DataEncoding};
pub use record::{parse_records, DataRecord, MeasurementType, TypeCode};
pub use store::{DataRecordStore, Extracted, RecordLookup};
pub use vif::{vif_scale, ValueInformation};
