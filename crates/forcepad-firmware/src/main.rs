mod adc;
mod ble;
mod runtime_diagnostics;

use esp_idf_svc::hal::{delay::FreeRtos, peripherals::Peripherals};

use forcepad::{Builder, ChannelReader, Link, Offline, Poller, CHANNEL_COUNT};

use adc::EspAdc;
use ble::NotifyServer;
use runtime_diagnostics::{check_main_stack, log_heap};

/// ADC1 inputs wired to channels 0..6 (buttons 0-3 momentary, 4-5 latched).
const ADC_INPUTS: [u8; CHANNEL_COUNT] = [0, 1, 7, 6, 5, 4];
const POLL_INTERVAL_MS: u32 = 200;

const DEBUG_SAMPLES: bool = false;
// Every 5 s at the default poll interval
const SAMPLE_LOG_EVERY: u32 = 25;

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log_heap("startup");
    check_main_stack();

    let peripherals = Peripherals::take()?;

    let table = Builder::new().inputs(ADC_INPUTS).build()?;
    let mut reader = ChannelReader::new(EspAdc::new(), table);
    match reader.configure() {
        Ok(report) if report.is_complete() => {
            log::info!("All {} channels configured", CHANNEL_COUNT);
        }
        Ok(report) => {
            let missing: Vec<usize> = (0..CHANNEL_COUNT)
                .filter(|&channel| !report.is_configured(channel))
                .collect();
            log::warn!(
                "{}/{} channels configured, missing {:?}",
                report.count(),
                CHANNEL_COUNT,
                missing
            );
        }
        // Nothing will ever trigger, but the radio still comes up.
        Err(err) => log::warn!("Channel setup aborted: {}", err),
    }

    let server = match NotifyServer::start(peripherals.modem) {
        Ok(server) => Some(server),
        Err(err) => {
            log::warn!("BLE bring-up failed, running offline: {:?}", err);
            None
        }
    };
    let link: &dyn Link = match server.as_ref() {
        Some(server) => server,
        None => &Offline,
    };
    log_heap("after_radio");

    let mut poller = Poller::new(reader);
    let mut ticks: u32 = 0;
    log::info!("Polling every {} ms", POLL_INTERVAL_MS);

    loop {
        poller.poll_once(link);

        if DEBUG_SAMPLES {
            ticks = ticks.wrapping_add(1);
            if ticks % SAMPLE_LOG_EVERY == 0 {
                let reader = poller.reader_mut();
                let samples: [i16; CHANNEL_COUNT] = core::array::from_fn(|i| reader.read(i));
                log::info!("Samples: {:?}", samples);
            }
        }

        FreeRtos::delay_ms(POLL_INTERVAL_MS);
    }
}
