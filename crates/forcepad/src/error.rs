//! Error types for the channel reader and the record codec
//!
//! This module defines error types for channel table construction
//! ([`BuilderError`]), channel reads ([`Error`]) and record decoding
//! ([`PacketError`]).
//!
//! None of these are fatal to the device. The trigger scan treats any
//! [`Error`] as "skip this channel for this cycle", and the value-query path
//! turns it into the [`READ_FAILED`](crate::config::READ_FAILED) sentinel.
//!
//! ## Example
//!
//! ```
//! use forcepad::{Builder, BuilderError};
//!
//! // Missing input map
//! let result = Builder::new().build();
//! assert!(matches!(result, Err(BuilderError::MissingInputs)));
//! ```

use crate::config::CHANNEL_COUNT;
use crate::interface::AdcInterface;

/// Errors that can occur when reading a channel
///
/// Generic over the interface type to preserve the backend's error type.
#[derive(Debug)]
pub enum Error<A: AdcInterface> {
    /// The backend rejected the channel setup or the conversion
    Adc(A::Error),
    /// The ADC device did not report ready at configuration time
    NotReady,
    /// Channel index outside `0..CHANNEL_COUNT`
    InvalidChannel(usize),
    /// The channel was never set up successfully
    NotConfigured(usize),
}

impl<A: AdcInterface> core::fmt::Display for Error<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Adc(e) => write!(f, "ADC error: {e:?}"),
            Error::NotReady => write!(f, "ADC device not ready"),
            Error::InvalidChannel(channel) => {
                write!(f, "Invalid channel {channel} (expected 0..{CHANNEL_COUNT})")
            }
            Error::NotConfigured(channel) => write!(f, "Channel {channel} is not configured"),
        }
    }
}

impl<A: AdcInterface + core::fmt::Debug> core::error::Error for Error<A> {}

/// Errors that can occur when building the channel table
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// [`Builder::inputs()`](crate::config::Builder::inputs) was never called
    MissingInputs,
    /// Two logical channels map to the same physical input
    DuplicateInput {
        /// The input used twice
        input: u8,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BuilderError::MissingInputs => write!(f, "Channel inputs must be specified"),
            BuilderError::DuplicateInput { input } => {
                write!(f, "Input {input} is mapped to more than one channel")
            }
        }
    }
}

impl core::error::Error for BuilderError {}

/// Errors that can occur when decoding an [`EventRecord`](crate::packet::EventRecord)
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Notification is not exactly one record long
    WrongLength {
        /// Record size in bytes
        expected: usize,
        /// Bytes received
        actual: usize,
    },
    /// Channel byte outside `0..CHANNEL_COUNT`
    InvalidChannel(u8),
    /// Device class tag this firmware does not know
    UnknownDeviceClass(u8),
    /// On/off flag byte other than 0 or 1
    InvalidFlag(u8),
}

impl core::fmt::Display for PacketError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PacketError::WrongLength { expected, actual } => {
                write!(f, "Wrong record length: expected {expected} bytes, got {actual}")
            }
            PacketError::InvalidChannel(channel) => write!(f, "Invalid channel {channel}"),
            PacketError::UnknownDeviceClass(tag) => write!(f, "Unknown device class {tag}"),
            PacketError::InvalidFlag(flag) => write!(f, "Invalid on/off flag {flag}"),
        }
    }
}

impl core::error::Error for PacketError {}
