//! Pressure-pad button detection for a BLE notify peripheral.
//!
//! Six analog pressure channels are polled in a fixed order. Channels 0..4
//! are momentary buttons, channels 4..6 are latched on/off buttons. An
//! accepted trigger becomes a 6-byte [`EventRecord`] pushed over a [`Link`].
//!
//! The crate knows nothing about a particular ADC or radio: firmware plugs
//! in an [`AdcInterface`] and a [`Link`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcepad::{Builder, ChannelReader, Poller};
//!
//! let table = Builder::new().inputs([0, 1, 7, 6, 5, 4]).build()?;
//! let mut reader = ChannelReader::new(adc, table);
//! reader.configure().ok();
//!
//! let mut poller = Poller::new(reader);
//! loop {
//!     poller.poll_once(&link);
//!     delay.delay_ms(200);
//! }
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod interface;
pub mod link;
pub mod packet;
pub mod poller;
pub mod reader;

pub use classifier::{Candidate, TriggerClassifier, Verdict};
pub use config::{
    AcquisitionTime, Builder, ButtonKind, CHANNEL_COUNT, ChannelConfig, ChannelTable,
    DEBOUNCE_INTERVAL_MS, Gain, LATCH_THRESHOLD, PRESSURE_THRESHOLD, READ_FAILED, Reference,
    Resolution,
};
pub use error::{BuilderError, Error, PacketError};
pub use interface::AdcInterface;
pub use link::{Connection, ConnectionTracker, Link, LinkEvent, Offline, Transition};
pub use packet::{DeviceClass, EventRecord, PACKET_SIZE};
pub use poller::Poller;
pub use reader::{ChannelReader, ConfigureReport};
