//! Failures a serial channel can report.

use std::io;

use thiserror::Error;

/// Why a channel could not be brought up.
///
/// Each variant is returned synchronously by
/// [`SerialChannel::open`](super::SerialChannel::open). Whenever one of them
/// is returned, the device handle has already been released.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The device could not be opened (missing, busy, permission denied).
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The current terminal attributes of the device could not be read.
    #[error("failed to get tty current attributes for {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: nix::Error,
    },

    /// The raw mode attributes could not be committed to the device.
    #[error("failed to set tty attributes for {path}: {source}")]
    ConfigWrite {
        path: String,
        #[source]
        source: nix::Error,
    },

    /// The background reader thread could not be started.
    #[error("failed to start the reader for {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The requested baud rate label is not one of the supported rates.
    #[error("unsupported baud rate `{0}`")]
    UnknownBaudRate(String),
}

/// A read from the device failed after the channel was connected.
///
/// The background reader stops producing data when this happens. It is kept
/// by the channel until the consumer picks it up with
/// [`SerialChannel::take_failure`](super::SerialChannel::take_failure).
#[derive(Debug, Error)]
#[error("failed to read from serial port {path}: {source}")]
pub struct ReadFailure {
    pub path: String,
    #[source]
    pub source: io::Error,
}
