//! WinRT BLE Transport
//!
//! [`BleTransport`] on top of the Windows.Devices.Bluetooth APIs. Each
//! operation is started on a tokio task and reports back through the
//! transport event channel; WinRT callbacks (advertisements, value changes,
//! connection status) forward into the same channel.

use crate::domain::models::BluetoothAddress;
use crate::infrastructure::bluetooth::error::TransportError;
use crate::infrastructure::bluetooth::transport::{
    BleTransport, CharacteristicHandle, DiscoveredCharacteristic, TransportEvent,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use windows::core::GUID;
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEScanningMode,
};
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattClientCharacteristicConfigurationDescriptorValue,
    GattCommunicationStatus, GattSession, GattValueChangedEventArgs,
};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Foundation::TypedEventHandler;
use windows::Storage::Streams::{DataReader, DataWriter, IBuffer};

impl From<windows::core::Error> for TransportError {
    fn from(e: windows::core::Error) -> Self {
        TransportError::Backend(e.message().to_string())
    }
}

struct Link {
    device: BluetoothLEDevice,
    // keeps the GATT connection from being dropped by the OS
    _session: Option<GattSession>,
}

pub struct WinRtTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    watcher: Option<BluetoothLEAdvertisementWatcher>,
    link: Arc<Mutex<Option<Link>>>,
    characteristics: Arc<Mutex<HashMap<CharacteristicHandle, GattCharacteristic>>>,
}

impl WinRtTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            Self {
                events,
                watcher: None,
                link: Arc::new(Mutex::new(None)),
                characteristics: Arc::new(Mutex::new(HashMap::new())),
            },
            receiver,
        )
    }

    fn characteristic(&self, handle: CharacteristicHandle) -> Result<GattCharacteristic, TransportError> {
        let characteristics = self
            .characteristics
            .lock()
            .map_err(|_| TransportError::Backend("Lock error".to_string()))?;
        characteristics
            .get(&handle)
            .cloned()
            .ok_or(TransportError::UnknownCharacteristic(handle))
    }

    fn device(&self) -> Result<BluetoothLEDevice, TransportError> {
        let link = self
            .link
            .lock()
            .map_err(|_| TransportError::Backend("Lock error".to_string()))?;
        link.as_ref()
            .map(|l| l.device.clone())
            .ok_or(TransportError::NotConnected)
    }
}

/// Lowercase hyphenated form used by the codec tables
pub fn format_uuid(guid: &GUID) -> String {
    let d = guid.data4;
    format!(
        "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        guid.data1, guid.data2, guid.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
    )
}

fn read_buffer(buffer: &IBuffer) -> windows::core::Result<Vec<u8>> {
    let reader = DataReader::FromBuffer(buffer)?;
    let mut bytes = vec![0u8; reader.UnconsumedBufferLength()? as usize];
    reader.ReadBytes(&mut bytes)?;
    Ok(bytes)
}

async fn open_device(
    address: BluetoothAddress,
    events: mpsc::UnboundedSender<TransportEvent>,
) -> windows::core::Result<Link> {
    let device = BluetoothLEDevice::FromBluetoothAddressAsync(address.0)?.await?;
    info!("Device opened: {:?}", device.Name()?);

    let session = match GattSession::FromDeviceIdAsync(&device.BluetoothDeviceId()?)?.await {
        Ok(session) => {
            session.SetMaintainConnection(true)?;
            Some(session)
        }
        Err(e) => {
            warn!("Failed to create GattSession, continuing anyway: {}", e.message());
            None
        }
    };

    let status_handler = TypedEventHandler::new(move |dev: windows::core::Ref<BluetoothLEDevice>, _| {
        if let Some(dev) = dev.as_ref() {
            if dev.ConnectionStatus()? == BluetoothConnectionStatus::Disconnected {
                let _ = events.send(TransportEvent::Disconnected { address });
            }
        }
        Ok(())
    });
    device.ConnectionStatusChanged(&status_handler)?;

    Ok(Link {
        device,
        _session: session,
    })
}

async fn enumerate(
    device: BluetoothLEDevice,
) -> windows::core::Result<Vec<(String, String, GattCharacteristic)>> {
    let services_result = device.GetGattServicesAsync()?.await?;
    if services_result.Status()? != GattCommunicationStatus::Success {
        return Err(windows::core::Error::new(
            windows::core::HRESULT(-1),
            format!("GATT service query failed: {:?}", services_result.Status()?),
        ));
    }

    let mut found = Vec::new();
    let services = services_result.Services()?;
    for i in 0..services.Size()? {
        let service = services.GetAt(i)?;
        let service_uuid = format_uuid(&service.Uuid()?);
        let chars_result = service.GetCharacteristicsAsync()?.await?;
        if chars_result.Status()? != GattCommunicationStatus::Success {
            debug!("Skipping service {}: {:?}", service_uuid, chars_result.Status()?);
            continue;
        }
        let characteristics = chars_result.Characteristics()?;
        for j in 0..characteristics.Size()? {
            let c = characteristics.GetAt(j)?;
            found.push((service_uuid.clone(), format_uuid(&c.Uuid()?), c));
        }
    }
    Ok(found)
}

impl BleTransport for WinRtTransport {
    fn start_scan(&mut self) -> Result<(), TransportError> {
        self.stop_scan()?;

        let watcher = BluetoothLEAdvertisementWatcher::new()?;
        watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;

        let sender = self.events.clone();
        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let name = args.Advertisement()?.LocalName()?.to_string();
                    let _ = sender.send(TransportEvent::PeripheralObserved {
                        address: BluetoothAddress(args.BluetoothAddress()?),
                        name: if name.is_empty() { None } else { Some(name) },
                    });
                }
                Ok(())
            },
        );

        watcher.Received(&handler)?;
        watcher.Start()?;
        self.watcher = Some(watcher);
        Ok(())
    }

    fn stop_scan(&mut self) -> Result<(), TransportError> {
        if let Some(watcher) = self.watcher.take() {
            watcher.Stop()?;
        }
        Ok(())
    }

    fn connect(&mut self, address: BluetoothAddress) -> Result<(), TransportError> {
        let events = self.events.clone();
        let link = self.link.clone();
        tokio::spawn(async move {
            match open_device(address, events.clone()).await {
                Ok(opened) => {
                    if let Ok(mut slot) = link.lock() {
                        *slot = Some(opened);
                    }
                    let _ = events.send(TransportEvent::Connected { address });
                }
                Err(e) => {
                    let _ = events.send(TransportEvent::ConnectFailed {
                        address,
                        reason: e.message().to_string(),
                    });
                }
            }
        });
        Ok(())
    }

    fn resolve_services(&mut self, address: BluetoothAddress) -> Result<(), TransportError> {
        let device = self.device()?;
        let events = self.events.clone();
        let registry = self.characteristics.clone();
        tokio::spawn(async move {
            match enumerate(device).await {
                Ok(found) => {
                    let mut characteristics = Vec::with_capacity(found.len());
                    if let Ok(mut registry) = registry.lock() {
                        registry.clear();
                        for (handle, (service_uuid, uuid, c)) in found.into_iter().enumerate() {
                            let handle = CharacteristicHandle(handle as u32);
                            characteristics.push(DiscoveredCharacteristic {
                                service_uuid,
                                uuid,
                                handle,
                            });
                            registry.insert(handle, c);
                        }
                    }
                    info!("Found {} characteristics", characteristics.len());
                    let _ = events.send(TransportEvent::ServicesResolved {
                        address,
                        characteristics,
                    });
                }
                Err(e) => {
                    let _ = events.send(TransportEvent::ConnectFailed {
                        address,
                        reason: e.message().to_string(),
                    });
                }
            }
        });
        Ok(())
    }

    fn enable_notifications(&mut self, handle: CharacteristicHandle) -> Result<(), TransportError> {
        let characteristic = self.characteristic(handle)?;

        let sender = self.events.clone();
        let data_handler = TypedEventHandler::new(
            move |_: windows::core::Ref<GattCharacteristic>,
                  args: windows::core::Ref<GattValueChangedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let value = read_buffer(&args.CharacteristicValue()?)?;
                    let _ = sender.send(TransportEvent::Notification { handle, value });
                }
                Ok(())
            },
        );
        characteristic.ValueChanged(&data_handler)?;

        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match characteristic
                .WriteClientCharacteristicConfigurationDescriptorAsync(
                    GattClientCharacteristicConfigurationDescriptorValue::Notify,
                ) {
                Ok(operation) => operation.await,
                Err(e) => Err(e),
            };
            let event = match result {
                Ok(GattCommunicationStatus::Success) => TransportEvent::NotificationsEnabled { handle },
                Ok(status) => TransportEvent::NotificationsFailed {
                    handle,
                    reason: format!("{:?}", status),
                },
                Err(e) => TransportEvent::NotificationsFailed {
                    handle,
                    reason: e.message().to_string(),
                },
            };
            let _ = events.send(event);
        });
        Ok(())
    }

    fn write(&mut self, handle: CharacteristicHandle, value: &[u8]) -> Result<(), TransportError> {
        let characteristic = self.characteristic(handle)?;
        let writer = DataWriter::new()?;
        writer.WriteBytes(value)?;
        let buffer = writer.DetachBuffer()?;

        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match characteristic.WriteValueAsync(&buffer) {
                Ok(operation) => operation.await,
                Err(e) => Err(e),
            };
            let event = match result {
                Ok(GattCommunicationStatus::Success) => TransportEvent::WriteAck { handle },
                Ok(status) => TransportEvent::WriteFailed {
                    handle,
                    reason: format!("{:?}", status),
                },
                Err(e) => TransportEvent::WriteFailed {
                    handle,
                    reason: e.message().to_string(),
                },
            };
            let _ = events.send(event);
        });
        Ok(())
    }

    fn disconnect(&mut self, address: BluetoothAddress) -> Result<(), TransportError> {
        if let Ok(mut registry) = self.characteristics.lock() {
            registry.clear();
        }
        let link = self
            .link
            .lock()
            .map_err(|_| TransportError::Backend("Lock error".to_string()))?
            .take();
        if let Some(link) = link {
            info!("Closing device {}", address);
            link.device.Close()?;
        }
        let _ = self.events.send(TransportEvent::Disconnected { address });
        Ok(())
    }
}

impl Drop for WinRtTransport {
    fn drop(&mut self) {
        let _ = self.stop_scan();
    }
}
