use esp_idf_svc::sys::{self, EspError};

use forcepad::{AcquisitionTime, AdcInterface, ChannelConfig, Gain, Reference, Resolution};

const ADC_WIDTH_BIT_12: u32 = 3;
const ADC_ATTEN_DB_0: u32 = 0;
const ADC_ATTEN_DB_2_5: u32 = 1;
const ADC_ATTEN_DB_6: u32 = 2;
const ADC_ATTEN_DB_12: u32 = 3;
// ESP32-S3: ADC1_CH0..ADC1_CH9 are GPIO1..GPIO10.
const ADC1_CHANNEL_COUNT: u8 = 10;

#[derive(Debug)]
pub enum AdcError {
    Esp(EspError),
    /// ADC1 has no such input
    InvalidInput(u8),
    /// The setting has no equivalent on this ADC
    Unsupported(&'static str),
    /// `adc1_get_raw` reported a failed conversion
    Conversion(u8),
}

impl From<EspError> for AdcError {
    fn from(err: EspError) -> Self {
        Self::Esp(err)
    }
}

/// Legacy one-shot ADC1 driver
#[derive(Debug)]
pub struct EspAdc {
    ready: bool,
}

impl EspAdc {
    pub fn new() -> Self {
        let ready = match sys::esp!(unsafe { sys::adc1_config_width(ADC_WIDTH_BIT_12) }) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("ADC1 width setup failed: {}", err);
                false
            }
        };
        Self { ready }
    }
}

/// Map the requested front-end gain onto ADC1 input attenuation.
///
/// Full scale with 0 dB is roughly 950 mV; gains above unity cannot be
/// expressed and are clamped to it.
fn attenuation(gain: Gain) -> u32 {
    match gain {
        Gain::Unity | Gain::Double | Gain::Quadruple => ADC_ATTEN_DB_0,
        Gain::OneHalf => ADC_ATTEN_DB_2_5,
        Gain::OneQuarter => ADC_ATTEN_DB_6,
        Gain::OneSixth => ADC_ATTEN_DB_12,
    }
}

impl AdcInterface for EspAdc {
    type Error = AdcError;

    fn is_ready(&mut self) -> bool {
        self.ready
    }

    fn setup_channel(&mut self, config: &ChannelConfig) -> Result<(), AdcError> {
        if config.input >= ADC1_CHANNEL_COUNT {
            return Err(AdcError::InvalidInput(config.input));
        }
        if config.reference != Reference::Internal {
            return Err(AdcError::Unsupported("external reference"));
        }
        if config.acquisition != AcquisitionTime::Default {
            return Err(AdcError::Unsupported("acquisition time"));
        }
        if config.resolution != Resolution::Bits12 {
            return Err(AdcError::Unsupported("resolution other than 12 bits"));
        }

        sys::esp!(unsafe {
            sys::adc1_config_channel_atten(config.input as u32, attenuation(config.gain))
        })?;
        Ok(())
    }

    fn read_channel(&mut self, config: &ChannelConfig) -> Result<i16, AdcError> {
        let raw = unsafe { sys::adc1_get_raw(config.input as u32) };
        if raw < 0 {
            return Err(AdcError::Conversion(config.input));
        }
        Ok(raw as i16)
    }
}
