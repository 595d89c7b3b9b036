//! Channel configuration and the compile-time tuning constants

pub use crate::error::BuilderError;

/// Number of pressure channels wired to the board
pub const CHANNEL_COUNT: usize = 6;

/// Channels `0..MOMENTARY_CHANNELS` are momentary (toy) buttons
pub const MOMENTARY_CHANNELS: usize = 4;

/// Channels `MOMENTARY_CHANNELS..CHANNEL_COUNT` are latched (TV) buttons
pub const LATCHED_CHANNELS: usize = CHANNEL_COUNT - MOMENTARY_CHANNELS;

/// A momentary channel triggers when its sample is strictly above this
pub const PRESSURE_THRESHOLD: i16 = 250;

/// A latched channel is "on" while its sample is strictly above this
pub const LATCH_THRESHOLD: i16 = 400;

/// Minimum spacing between two accepted triggers, in milliseconds
pub const DEBOUNCE_INTERVAL_MS: u32 = 1500;

/// Sample value returned by the value-query path when a read fails
pub const READ_FAILED: i16 = -1;

/// How a channel's samples are interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonKind {
    /// Edge-triggered; only presses are reported
    Momentary,
    /// Level-triggered; on and off transitions are both reported
    Latched,
}

impl ButtonKind {
    /// Kind of the button wired to `channel`
    pub fn of(channel: usize) -> Self {
        if channel < MOMENTARY_CHANNELS {
            Self::Momentary
        } else {
            Self::Latched
        }
    }
}

/// Analog front-end gain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gain {
    /// 1/6x
    OneSixth,
    /// 1/4x
    OneQuarter,
    /// 1/2x
    OneHalf,
    /// 1x
    #[default]
    Unity,
    /// 2x
    Double,
    /// 4x
    Quadruple,
}

/// Conversion reference voltage source
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Reference {
    /// Internal bandgap reference
    #[default]
    Internal,
    /// Fraction of the supply voltage
    Supply,
}

/// Sample-and-hold acquisition time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AcquisitionTime {
    /// Whatever the backend uses when nothing is requested
    #[default]
    Default,
    /// Explicit acquisition time in microseconds
    Micros(u16),
}

/// Conversion resolution
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    #[default]
    Bits12,
}

impl Resolution {
    /// Resolution in bits
    pub fn bits(self) -> u8 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    /// Largest raw value a conversion can produce
    pub fn max_value(self) -> i16 {
        (1i16 << self.bits()) - 1
    }
}

/// Setup for one logical channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Logical channel id (index into the channel table)
    pub channel_id: u8,
    /// Backend-specific identifier of the physical analog input
    pub input: u8,
    pub gain: Gain,
    pub reference: Reference,
    pub acquisition: AcquisitionTime,
    pub resolution: Resolution,
}

/// The full per-board channel table
pub type ChannelTable = [ChannelConfig; CHANNEL_COUNT];

/// Builder for the channel table
///
/// Every channel shares the same analog settings and differs only in its
/// physical input.
///
/// # Example
///
/// ```
/// use forcepad::{Builder, Gain, Resolution};
///
/// let table = Builder::new()
///     .inputs([0, 1, 7, 6, 5, 4])
///     .build()
///     .expect("valid channel table");
///
/// assert_eq!(table[2].input, 7);
/// assert_eq!(table[2].gain, Gain::Unity);
/// assert_eq!(table[5].resolution, Resolution::Bits12);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Builder {
    inputs: Option<[u8; CHANNEL_COUNT]>,
    gain: Gain,
    reference: Reference,
    acquisition: AcquisitionTime,
    resolution: Resolution,
}

impl Builder {
    /// Create a new Builder with default analog settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the physical input for each logical channel (required)
    pub fn inputs(mut self, inputs: [u8; CHANNEL_COUNT]) -> Self {
        self.inputs = Some(inputs);
        self
    }

    pub fn gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    pub fn reference(mut self, reference: Reference) -> Self {
        self.reference = reference;
        self
    }

    pub fn acquisition(mut self, acquisition: AcquisitionTime) -> Self {
        self.acquisition = acquisition;
        self
    }

    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Build the channel table
    ///
    /// # Errors
    ///
    /// - `BuilderError::MissingInputs` if no input map was given
    /// - `BuilderError::DuplicateInput` if two channels share a physical input
    pub fn build(self) -> Result<ChannelTable, BuilderError> {
        let inputs = self.inputs.ok_or(BuilderError::MissingInputs)?;

        for (i, input) in inputs.iter().enumerate() {
            if inputs[..i].contains(input) {
                return Err(BuilderError::DuplicateInput { input: *input });
            }
        }

        Ok(core::array::from_fn(|i| ChannelConfig {
            channel_id: i as u8,
            input: inputs[i],
            gain: self.gain,
            reference: self.reference,
            acquisition: self.acquisition,
            resolution: self.resolution,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_inputs() {
        assert!(matches!(
            Builder::new().build(),
            Err(BuilderError::MissingInputs)
        ));
    }

    #[test]
    fn builder_rejects_shared_input() {
        let result = Builder::new().inputs([0, 1, 2, 3, 4, 1]).build();
        assert!(matches!(
            result,
            Err(BuilderError::DuplicateInput { input: 1 })
        ));
    }

    #[test]
    fn builder_defaults_match_board_setup() {
        let table = Builder::new().inputs([0, 1, 7, 6, 5, 4]).build().unwrap();
        for (i, cfg) in table.iter().enumerate() {
            assert_eq!(cfg.channel_id as usize, i);
            assert_eq!(cfg.gain, Gain::Unity);
            assert_eq!(cfg.reference, Reference::Internal);
            assert_eq!(cfg.acquisition, AcquisitionTime::Default);
            assert_eq!(cfg.resolution.bits(), 12);
        }
        assert_eq!(table[3].input, 6);
    }

    #[test]
    fn channel_kinds_split_at_four() {
        assert_eq!(ButtonKind::of(0), ButtonKind::Momentary);
        assert_eq!(ButtonKind::of(3), ButtonKind::Momentary);
        assert_eq!(ButtonKind::of(4), ButtonKind::Latched);
        assert_eq!(ButtonKind::of(5), ButtonKind::Latched);
    }

    #[test]
    fn twelve_bit_full_scale() {
        assert_eq!(Resolution::Bits12.max_value(), 4095);
    }
}
