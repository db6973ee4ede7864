//! Linky TIC reader library
//!
//! This library decodes the tele-information (TIC) stream of French Linky
//! electricity meters, in historic or standard mode, and keeps the last
//! value of every label while the serial link is up.

pub mod config;
pub mod metering_tic;
pub mod transport;

// Re-export common types for easier access
pub use config::{ConfigHolder, TicConfig};
pub use metering_tic::{ReaderSession, TicParseError, InvalidChecksum};
pub use metering_tic::structs::{DecodedField, SessionState, TicValue, WireMode};
pub use transport::{SerialTransport, TicTransport, TransportError};

pub fn get_unix_ts() -> u64 {
    return std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
}
