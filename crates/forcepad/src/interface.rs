//! Hardware interface abstraction
//!
//! This module provides the [`AdcInterface`] trait, the only thing the
//! [`ChannelReader`](crate::reader::ChannelReader) needs from the analog
//! front-end. Firmware implements it on top of the vendor ADC driver; tests
//! implement it with scripted samples.
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcepad::{AdcInterface, ChannelConfig};
//!
//! struct Saadc { /* register block, buffers */ }
//!
//! impl AdcInterface for Saadc {
//!     type Error = SaadcError;
//!
//!     fn is_ready(&mut self) -> bool { true }
//!
//!     fn setup_channel(&mut self, config: &ChannelConfig) -> Result<(), Self::Error> {
//!         // program gain, reference, acquisition time and input mux
//!     }
//!
//!     fn read_channel(&mut self, config: &ChannelConfig) -> Result<i16, Self::Error> {
//!         // start a single conversion and block until it completes
//!     }
//! }
//! ```

use core::fmt::Debug;

use crate::config::ChannelConfig;

/// Trait for the analog-to-digital converter behind the pressure pads
///
/// ## Implementing
///
/// Conversions are blocking. The reader calls `read_channel` only for
/// channels whose `setup_channel` succeeded.
pub trait AdcInterface {
    /// Error type for setup and conversion failures
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Whether the device is powered and its driver is usable
    fn is_ready(&mut self) -> bool;

    /// Program one channel
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects any part of the configuration.
    fn setup_channel(&mut self, config: &ChannelConfig) -> Result<(), Self::Error>;

    /// Run one blocking conversion on a configured channel
    ///
    /// The returned value is the raw signed result at `config.resolution`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    fn read_channel(&mut self, config: &ChannelConfig) -> Result<i16, Self::Error>;
}

impl<T: AdcInterface + ?Sized> AdcInterface for &mut T {
    type Error = T::Error;

    fn is_ready(&mut self) -> bool {
        (**self).is_ready()
    }

    fn setup_channel(&mut self, config: &ChannelConfig) -> Result<(), Self::Error> {
        (**self).setup_channel(config)
    }

    fn read_channel(&mut self, config: &ChannelConfig) -> Result<i16, Self::Error> {
        (**self).read_channel(config)
    }
}
