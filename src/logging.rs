use log::{debug, log_enabled, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// The filter is taken from `RUST_LOG`, e.g. `RUST_LOG=wmbus_meters=debug`.
pub fn init_logger() {
    env_logger::init();
}

/// Initializes a test-friendly logger; safe to call more than once.
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Logs a telegram payload as hex at debug level.
pub fn log_payload_hex(label: &str, payload: &[u8]) {
    if log_enabled!(Level::Debug) {
        debug!("{label}: {}", crate::util::hex::encode_hex_upper(payload));
    }
}
