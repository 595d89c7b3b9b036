use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use enumset::{enum_set, EnumSet};
use esp_idf_svc::bt::ble::gap::{AdvConfiguration, BleGapEvent, EspBleGap};
use esp_idf_svc::bt::ble::gatt::server::{ConnectionId, EspGatts, GattsEvent, TransferId};
use esp_idf_svc::bt::ble::gatt::{
    AutoResponse, GattCharacteristic, GattDescriptor, GattId, GattInterface, GattServiceId,
    GattStatus, Handle, Permission, Property,
};
use esp_idf_svc::bt::{Ble, BtDriver, BtStatus, BtUuid};
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{self, EspError, ESP_FAIL};

use forcepad::{ConnectionTracker, EventRecord, Link, LinkEvent, Transition, PACKET_SIZE};

const APP_ID: u16 = 0;
const DEVICE_NAME: &str = "Forcepad";
// Flags AD: LE General Discoverable | BR/EDR Not Supported
const ADV_FLAGS: u8 = 0x06;
const SERVICE_NUM_HANDLES: u16 = 4;

pub const SERVICE_UUID: u128 = 0x12345678_1234_1234_1234_1234567890ab;
pub const EVENT_CHARACTERISTIC_UUID: u128 = 0xabcdef01_1234_5678_9abc_def012345678;
const CCCD_UUID: u16 = 0x2902;
const CCCD_NOTIFY: u16 = 0x0001;

type BleDriver = BtDriver<'static, Ble>;
type Gap = Arc<EspBleGap<'static, Ble, Arc<BleDriver>>>;
type Gatts = Arc<EspGatts<'static, Ble, Arc<BleDriver>>>;

#[derive(Default)]
struct RadioState {
    gatt_if: Option<GattInterface>,
    service_handle: Option<Handle>,
    event_handle: Option<Handle>,
    cccd_handle: Option<Handle>,
    connection: ConnectionTracker,
}

/// Bluedroid GATT server with a single notify-only event characteristic
///
/// Radio callbacks and the polling loop share `state`; every read of the
/// connection and every notify happens under its lock.
#[derive(Clone)]
pub struct NotifyServer {
    gap: Gap,
    gatts: Gatts,
    state: Arc<Mutex<RadioState>>,
}

impl NotifyServer {
    /// Bring up the controller, register the GATT app and start advertising
    /// once the service is in place.
    pub fn start(modem: Modem) -> anyhow::Result<Self> {
        let nvs = EspDefaultNvsPartition::take()?;
        let bt: Arc<BleDriver> = Arc::new(BtDriver::new(modem, Some(nvs))?);

        let server = Self {
            gap: Arc::new(EspBleGap::new(bt.clone())?),
            gatts: Arc::new(EspGatts::new(bt)?),
            state: Arc::new(Mutex::new(RadioState::default())),
        };

        let gap_server = server.clone();
        server.gap.subscribe(move |event| {
            gap_server.log_failure(gap_server.on_gap_event(event));
        })?;

        let gatts_server = server.clone();
        server.gatts.subscribe(move |(gatt_if, event)| {
            gatts_server.log_failure(gatts_server.on_gatts_event(gatt_if, event));
        })?;

        server.gatts.register_app(APP_ID)?;
        log::info!("BLE: GATT app {} registered", APP_ID);

        Ok(server)
    }

    fn state(&self) -> MutexGuard<'_, RadioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_gap_event(&self, event: BleGapEvent) -> Result<(), EspError> {
        if let BleGapEvent::AdvertisingConfigured(status) = event {
            check_bt_status(status)?;
            self.gap.start_advertising()?;
            log::info!("BLE: advertising as {}", DEVICE_NAME);
        }
        Ok(())
    }

    fn on_gatts_event(&self, gatt_if: GattInterface, event: GattsEvent) -> Result<(), EspError> {
        match event {
            GattsEvent::ServiceRegistered { status, app_id } => {
                check_gatt_status(status)?;
                if app_id == APP_ID {
                    self.create_service(gatt_if)?;
                }
            }
            GattsEvent::ServiceCreated {
                status,
                service_handle,
                ..
            } => {
                check_gatt_status(status)?;
                self.start_service(service_handle)?;
            }
            GattsEvent::CharacteristicAdded {
                status,
                attr_handle,
                service_handle,
                char_uuid,
            } => {
                check_gatt_status(status)?;
                self.register_characteristic(service_handle, attr_handle, char_uuid)?;
            }
            GattsEvent::DescriptorAdded {
                status,
                attr_handle,
                service_handle,
                descr_uuid,
            } => {
                check_gatt_status(status)?;
                self.register_cccd(service_handle, attr_handle, descr_uuid);
            }
            GattsEvent::PeerConnected { conn_id, .. } => {
                self.on_connection(LinkEvent::Connected {
                    conn_id,
                    at_ms: uptime_ms(),
                })?;
            }
            GattsEvent::PeerDisconnected { conn_id, .. } => {
                self.on_connection(LinkEvent::Disconnected { conn_id })?;
            }
            GattsEvent::Write {
                conn_id,
                trans_id,
                handle,
                offset,
                need_rsp,
                value,
                ..
            } => {
                self.on_write(gatt_if, conn_id, trans_id, handle, offset, value)?;
                if need_rsp {
                    self.gatts
                        .send_response(gatt_if, conn_id, trans_id, GattStatus::Ok, None)?;
                }
            }
            _ => (),
        }
        Ok(())
    }

    fn create_service(&self, gatt_if: GattInterface) -> Result<(), EspError> {
        self.state().gatt_if = Some(gatt_if);

        self.gap.set_device_name(DEVICE_NAME)?;
        self.gap.set_adv_conf(&AdvConfiguration {
            include_name: true,
            include_txpower: false,
            flag: ADV_FLAGS,
            service_uuid: Some(BtUuid::uuid128(SERVICE_UUID)),
            ..Default::default()
        })?;
        self.gatts.create_service(
            gatt_if,
            &GattServiceId {
                id: GattId {
                    uuid: BtUuid::uuid128(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            },
            SERVICE_NUM_HANDLES,
        )?;
        Ok(())
    }

    fn start_service(&self, service_handle: Handle) -> Result<(), EspError> {
        self.state().service_handle = Some(service_handle);
        self.gatts.start_service(service_handle)?;

        self.gatts.add_characteristic(
            service_handle,
            &GattCharacteristic {
                uuid: BtUuid::uuid128(EVENT_CHARACTERISTIC_UUID),
                permissions: EnumSet::empty(),
                properties: enum_set!(Property::Notify),
                max_len: PACKET_SIZE,
                auto_rsp: AutoResponse::ByApp,
            },
            EventRecord::EMPTY.as_bytes(),
        )?;
        Ok(())
    }

    fn register_characteristic(
        &self,
        service_handle: Handle,
        attr_handle: Handle,
        char_uuid: BtUuid,
    ) -> Result<(), EspError> {
        let is_event_char = {
            let mut state = self.state();
            let matches = state.service_handle == Some(service_handle)
                && char_uuid == BtUuid::uuid128(EVENT_CHARACTERISTIC_UUID);
            if matches {
                state.event_handle = Some(attr_handle);
            }
            matches
        };

        if is_event_char {
            self.gatts.add_descriptor(
                service_handle,
                &GattDescriptor {
                    uuid: BtUuid::uuid16(CCCD_UUID),
                    permissions: enum_set!(Permission::Read | Permission::Write),
                },
            )?;
        }
        Ok(())
    }

    fn register_cccd(&self, service_handle: Handle, attr_handle: Handle, descr_uuid: BtUuid) {
        let mut state = self.state();
        if state.service_handle == Some(service_handle) && descr_uuid == BtUuid::uuid16(CCCD_UUID)
        {
            state.cccd_handle = Some(attr_handle);
            log::info!("BLE: event characteristic ready");
        }
    }

    fn on_connection(&self, event: LinkEvent) -> Result<(), EspError> {
        let transition = self.state().connection.apply(event);
        match (transition, event) {
            (Transition::Opened, LinkEvent::Connected { conn_id, .. }) => {
                log::info!("BLE: central connected (conn {})", conn_id);
            }
            (Transition::Closed, LinkEvent::Disconnected { conn_id }) => {
                log::info!("BLE: central disconnected (conn {})", conn_id);
                self.gap.start_advertising()?;
            }
            (Transition::Ignored, LinkEvent::Connected { conn_id, .. }) => {
                log::warn!("BLE: ignoring second central (conn {})", conn_id);
            }
            _ => (),
        }
        Ok(())
    }

    fn on_write(
        &self,
        gatt_if: GattInterface,
        conn_id: ConnectionId,
        trans_id: TransferId,
        handle: Handle,
        offset: u16,
        value: &[u8],
    ) -> Result<(), EspError> {
        let mut state = self.state();
        if state.cccd_handle != Some(handle) || offset != 0 || value.len() != 2 {
            log::debug!("BLE: ignoring write to handle {} (trans {})", handle, trans_id);
            return Ok(());
        }

        let enabled = u16::from_le_bytes([value[0], value[1]]) & CCCD_NOTIFY != 0;
        let transition = state
            .connection
            .apply(LinkEvent::NotifyChanged { conn_id, enabled });

        if transition == Transition::Subscribed {
            log::info!("BLE: notifications enabled (conn {})", conn_id);
            // Push the characteristic's initial value once, like a fresh read would.
            if let Some(event_handle) = state.event_handle {
                self.gatts.notify(
                    gatt_if,
                    conn_id,
                    event_handle,
                    EventRecord::EMPTY.as_bytes(),
                )?;
            }
        } else if transition == Transition::Unsubscribed {
            log::info!("BLE: notifications disabled (conn {})", conn_id);
        }
        Ok(())
    }

    fn log_failure(&self, status: Result<(), EspError>) {
        if let Err(err) = status {
            log::warn!("BLE: callback failed: {}", err);
        }
    }
}

impl Link for NotifyServer {
    fn elapsed_ms(&self) -> u32 {
        self.state().connection.elapsed_ms(uptime_ms())
    }

    fn send(&self, payload: &[u8]) {
        let state = self.state();
        let (Some(gatt_if), Some(handle), Some(conn_id)) = (
            state.gatt_if,
            state.event_handle,
            state.connection.notify_target(),
        ) else {
            return;
        };

        if let Err(err) = self.gatts.notify(gatt_if, conn_id, handle, payload) {
            log::warn!("BLE: notify failed (conn {}): {}", conn_id, err);
        }
    }
}

fn uptime_ms() -> u64 {
    (unsafe { sys::esp_timer_get_time() } / 1_000) as u64
}

fn check_bt_status(status: BtStatus) -> Result<(), EspError> {
    if matches!(status, BtStatus::Success) {
        Ok(())
    } else {
        log::warn!("BLE: GAP status {:?}", status);
        Err(EspError::from_infallible::<ESP_FAIL>())
    }
}

fn check_gatt_status(status: GattStatus) -> Result<(), EspError> {
    if matches!(status, GattStatus::Ok) {
        Ok(())
    } else {
        log::warn!("BLE: GATT status {:?}", status);
        Err(EspError::from_infallible::<ESP_FAIL>())
    }
}
