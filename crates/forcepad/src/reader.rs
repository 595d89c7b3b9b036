//! Channel reader: per-channel setup and blocking reads

use log::{info, warn};

use crate::config::{CHANNEL_COUNT, ChannelConfig, ChannelTable, READ_FAILED};
use crate::error::Error;
use crate::interface::AdcInterface;

/// Which channels were set up by the last [`ChannelReader::configure`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfigureReport {
    mask: u8,
}

impl ConfigureReport {
    /// Whether `channel` was set up successfully
    pub fn is_configured(self, channel: usize) -> bool {
        channel < CHANNEL_COUNT && self.mask & (1 << channel) != 0
    }

    /// Number of channels set up successfully
    pub fn count(self) -> u32 {
        self.mask.count_ones()
    }

    /// Whether every channel was set up
    pub fn is_complete(self) -> bool {
        self.count() as usize == CHANNEL_COUNT
    }

    fn mark(&mut self, channel: usize) {
        self.mask |= 1 << channel;
    }
}

/// Owns the ADC backend, the channel table and the per-channel sample buffers
pub struct ChannelReader<A>
where
    A: AdcInterface,
{
    /// Hardware interface
    adc: A,
    /// Per-channel analog setup
    table: ChannelTable,
    /// Channels that accepted their setup
    report: ConfigureReport,
    /// Last successful conversion per channel
    samples: [i16; CHANNEL_COUNT],
}

impl<A> ChannelReader<A>
where
    A: AdcInterface,
{
    /// Create a reader; nothing touches the hardware until [`configure`](Self::configure)
    pub fn new(adc: A, table: ChannelTable) -> Self {
        Self {
            adc,
            table,
            report: ConfigureReport::default(),
            samples: [0; CHANNEL_COUNT],
        }
    }

    /// Set up every channel in the table
    ///
    /// A channel whose setup is rejected is logged and left unconfigured;
    /// the remaining channels are still attempted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] without touching any channel if the device
    /// is not ready.
    pub fn configure(&mut self) -> Result<ConfigureReport, Error<A>> {
        self.report = ConfigureReport::default();

        if !self.adc.is_ready() {
            warn!("ADC device not ready");
            return Err(Error::NotReady);
        }

        for (channel, config) in self.table.iter().enumerate() {
            match self.adc.setup_channel(config) {
                Ok(()) => {
                    self.report.mark(channel);
                    info!(
                        "ADC initialized on channel {} (input {})",
                        channel, config.input
                    );
                }
                Err(err) => warn!("Failed to set up ADC channel {}: {:?}", channel, err),
            }
        }

        Ok(self.report)
    }

    /// Outcome of the last [`configure`](Self::configure)
    pub fn report(&self) -> ConfigureReport {
        self.report
    }

    /// Setup used for `channel`
    pub fn config(&self, channel: usize) -> Option<&ChannelConfig> {
        self.table.get(channel)
    }

    /// Run one blocking conversion and store it in the channel's buffer
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidChannel`] if `channel >= CHANNEL_COUNT`
    /// - [`Error::NotConfigured`] if the channel's setup failed or never ran
    /// - [`Error::Adc`] if the conversion fails; the buffer keeps its old value
    pub fn try_read(&mut self, channel: usize) -> Result<i16, Error<A>> {
        let config = self
            .table
            .get(channel)
            .ok_or(Error::InvalidChannel(channel))?;
        if !self.report.is_configured(channel) {
            return Err(Error::NotConfigured(channel));
        }

        let value = self.adc.read_channel(config).map_err(Error::Adc)?;
        self.samples[channel] = value;
        Ok(value)
    }

    /// Value query: like [`try_read`](Self::try_read) but logs failures and
    /// returns [`READ_FAILED`] instead of an error
    pub fn read(&mut self, channel: usize) -> i16 {
        match self.try_read(channel) {
            Ok(value) => value,
            Err(err) => {
                warn!("ADC read error (channel {}): {}", channel, err);
                READ_FAILED
            }
        }
    }

    /// Contents of the channel's buffer without running a conversion
    pub fn last_sample(&self, channel: usize) -> Option<i16> {
        self.samples.get(channel).copied()
    }

    /// Give the backend back
    pub fn release(self) -> A {
        self.adc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Builder;

    #[derive(Debug, PartialEq)]
    enum FakeError {
        Rejected,
        Conversion,
    }

    #[derive(Debug, Default)]
    struct FakeAdc {
        ready: bool,
        reject_setup: Option<u8>,
        fail_read: Option<u8>,
        values: [i16; CHANNEL_COUNT],
        setups: usize,
    }

    impl AdcInterface for FakeAdc {
        type Error = FakeError;

        fn is_ready(&mut self) -> bool {
            self.ready
        }

        fn setup_channel(&mut self, config: &ChannelConfig) -> Result<(), FakeError> {
            self.setups += 1;
            if self.reject_setup == Some(config.channel_id) {
                return Err(FakeError::Rejected);
            }
            Ok(())
        }

        fn read_channel(&mut self, config: &ChannelConfig) -> Result<i16, FakeError> {
            if self.fail_read == Some(config.channel_id) {
                return Err(FakeError::Conversion);
            }
            Ok(self.values[config.channel_id as usize])
        }
    }

    fn reader(adc: FakeAdc) -> ChannelReader<FakeAdc> {
        let table = Builder::new().inputs([0, 1, 7, 6, 5, 4]).build().unwrap();
        ChannelReader::new(adc, table)
    }

    #[test]
    fn not_ready_configures_nothing() {
        let mut reader = reader(FakeAdc::default());
        assert!(matches!(reader.configure(), Err(Error::NotReady)));
        assert_eq!(reader.report().count(), 0);
        assert_eq!(reader.read(0), READ_FAILED);
        assert_eq!(reader.release().setups, 0);
    }

    #[test]
    fn rejected_channel_does_not_stop_the_rest() {
        let mut reader = reader(FakeAdc {
            ready: true,
            reject_setup: Some(2),
            ..Default::default()
        });
        let report = reader.configure().unwrap();
        assert_eq!(report.count(), 5);
        assert!(!report.is_complete());
        assert!(!report.is_configured(2));
        assert!(report.is_configured(5));
        assert!(matches!(reader.try_read(2), Err(Error::NotConfigured(2))));
    }

    #[test]
    fn read_updates_buffer() {
        let mut reader = reader(FakeAdc {
            ready: true,
            values: [10, 20, 30, 40, 50, 60],
            ..Default::default()
        });
        reader.configure().unwrap();
        assert_eq!(reader.last_sample(3), Some(0));
        assert_eq!(reader.read(3), 40);
        assert_eq!(reader.last_sample(3), Some(40));
    }

    #[test]
    fn out_of_range_index_returns_sentinel() {
        let mut reader = reader(FakeAdc {
            ready: true,
            ..Default::default()
        });
        reader.configure().unwrap();
        assert_eq!(reader.read(CHANNEL_COUNT), READ_FAILED);
        assert!(matches!(
            reader.try_read(7),
            Err(Error::InvalidChannel(7))
        ));
        assert_eq!(reader.last_sample(CHANNEL_COUNT), None);
    }

    #[test]
    fn failed_conversion_keeps_previous_sample() {
        let mut reader = reader(FakeAdc {
            ready: true,
            values: [0, 0, 0, 0, 420, 0],
            ..Default::default()
        });
        reader.configure().unwrap();
        assert_eq!(reader.read(4), 420);

        reader.adc.fail_read = Some(4);
        assert!(matches!(
            reader.try_read(4),
            Err(Error::Adc(FakeError::Conversion))
        ));
        assert_eq!(reader.read(4), READ_FAILED);
        assert_eq!(reader.last_sample(4), Some(420));
    }
}
