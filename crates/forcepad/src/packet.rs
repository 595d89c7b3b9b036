//! Event record wire format
//!
//! Every accepted trigger becomes one 6-byte notification:
//!
//! | byte | content                                               |
//! |------|-------------------------------------------------------|
//! | 0..3 | ms since connection, low 24 bits, big-endian          |
//! | 3    | triggering channel (0..6)                             |
//! | 4    | device class tag (always [`DeviceClass::Toy`] for now) |
//! | 5    | 1 for a latched channel turning on, else 0            |
//!
//! There is no version byte, CRC or length prefix.

use crate::config::CHANNEL_COUNT;
use crate::error::PacketError;

/// Size of an encoded record in bytes
pub const PACKET_SIZE: usize = 6;

/// Bits of the connection clock that fit in the timestamp field
pub const TIMESTAMP_MASK: u32 = 0x00FF_FFFF;

/// Device family tag carried in byte 4
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceClass {
    /// Pressure-pad toy board; the only class this firmware emits
    #[default]
    Toy = 0,
    /// Reserved for the GSI sensor board
    Gsi = 1,
}

impl TryFrom<u8> for DeviceClass {
    type Error = PacketError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeviceClass::Toy),
            1 => Ok(DeviceClass::Gsi),
            other => Err(PacketError::UnknownDeviceClass(other)),
        }
    }
}

/// One encoded trigger event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRecord {
    bytes: [u8; PACKET_SIZE],
}

impl EventRecord {
    /// All-zero record, used as the characteristic's initial value
    pub const EMPTY: Self = Self {
        bytes: [0; PACKET_SIZE],
    };

    /// Encode a record; `elapsed_ms` is truncated to its low 24 bits
    pub fn new(elapsed_ms: u32, channel: u8, class: DeviceClass, latched_on: bool) -> Self {
        let ts = (elapsed_ms & TIMESTAMP_MASK).to_be_bytes();
        Self {
            bytes: [ts[1], ts[2], ts[3], channel, class as u8, latched_on as u8],
        }
    }

    /// Decode a received notification
    ///
    /// # Errors
    ///
    /// Returns [`PacketError`] if the length, channel, class tag or flag byte
    /// is not something [`EventRecord::new`] could have produced.
    pub fn parse(bytes: &[u8]) -> Result<Self, PacketError> {
        let bytes: [u8; PACKET_SIZE] =
            bytes.try_into().map_err(|_| PacketError::WrongLength {
                expected: PACKET_SIZE,
                actual: bytes.len(),
            })?;

        if bytes[3] as usize >= CHANNEL_COUNT {
            return Err(PacketError::InvalidChannel(bytes[3]));
        }
        DeviceClass::try_from(bytes[4])?;
        if bytes[5] > 1 {
            return Err(PacketError::InvalidFlag(bytes[5]));
        }

        Ok(Self { bytes })
    }

    /// Timestamp field (already truncated to 24 bits)
    pub fn timestamp_ms(&self) -> u32 {
        u32::from_be_bytes([0, self.bytes[0], self.bytes[1], self.bytes[2]])
    }

    pub fn channel(&self) -> u8 {
        self.bytes[3]
    }

    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::try_from(self.bytes[4]).unwrap_or_default()
    }

    /// Whether this is a latched channel's "on" transition
    pub fn latched_on(&self) -> bool {
        self.bytes[5] != 0
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.bytes
    }
}

impl From<EventRecord> for [u8; PACKET_SIZE] {
    fn from(record: EventRecord) -> Self {
        record.bytes
    }
}
