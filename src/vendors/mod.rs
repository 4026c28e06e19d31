//! Manufacturer identification shared by the drivers and the catalog.

pub mod manufacturer;

pub use manufacturer::{
    get_manufacturer_name, id_to_manufacturer, manufacturer_to_id, parse_manufacturer,
    MANUFACTURER_APA, MANUFACTURER_DEV, MANUFACTURER_EMH, MANUFACTURER_KAM,
};
