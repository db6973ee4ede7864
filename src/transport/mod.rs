//! Byte stream sources for the TIC reader
//!
//! The reader only needs something it can open, read lines from and close.
//! `SerialTransport` is the real serial port, tests use in-memory streams.

use crate::metering_tic::structs::WireMode;
use log::debug;
use std::future::Future;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Unable to open serial device {port}: {reason}")]
    Open { port: String, reason: String },
    #[error("Error while reading serial device: {0}")]
    Read(#[from] std::io::Error),
    #[error("Serial device closed the stream")]
    Closed,
}

/// Line settings of the TIC output: 7 data bits, even parity, one stop bit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity_even: bool,
    pub stop_bits: u8,
}

impl SerialSettings {
    pub fn for_mode(port: &str, mode: WireMode) -> Self {
        SerialSettings {
            port: port.to_string(),
            baud_rate: mode.baud_rate(),
            data_bits: 7,
            parity_even: true,
            stop_bits: 1,
        }
    }

    pub fn connection_info(&self) -> String {
        format!(
            "{} @ {} baud ({}{}{})",
            self.port,
            self.baud_rate,
            self.data_bits,
            if self.parity_even { "E" } else { "N" },
            self.stop_bits
        )
    }
}

pub trait TicTransport: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Opens the device. Runs on the reader task, so it must not block the
    /// runtime; the session drops the returned future when a stop is requested.
    fn open(&self, settings: &SerialSettings) -> impl Future<Output = Result<Self::Stream, TransportError>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct SerialTransport;

impl TicTransport for SerialTransport {
    type Stream = SerialStream;

    async fn open(&self, settings: &SerialSettings) -> Result<Self::Stream, TransportError> {
        let data_bits = match settings.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };

        let stop_bits = match settings.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        };

        let parity = if settings.parity_even { Parity::Even } else { Parity::None };

        debug!("Opening serial device {}", settings.connection_info());
        tokio_serial::new(&settings.port, settings.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .open_native_async()
            .map_err(|e| TransportError::Open {
                port: settings.port.clone(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_for_mode() {
        let settings = SerialSettings::for_mode("/dev/ttyUSB0", WireMode::Historic);
        assert_eq!(settings.baud_rate, 1200);
        assert_eq!(settings.data_bits, 7);
        assert!(settings.parity_even);
        assert_eq!(settings.stop_bits, 1);
        assert_eq!(settings.connection_info(), "/dev/ttyUSB0 @ 1200 baud (7E1)");

        let settings = SerialSettings::for_mode("/dev/ttyAMA0", WireMode::Standard);
        assert_eq!(settings.baud_rate, 9600);
    }

    #[tokio::test]
    async fn test_open_missing_device() {
        let settings = SerialSettings::for_mode("/dev/does-not-exist-tic", WireMode::Historic);
        match SerialTransport.open(&settings).await {
            Err(TransportError::Open { port, .. }) => assert_eq!(port, "/dev/does-not-exist-tic"),
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("a missing device must not open"),
        }
    }
}
