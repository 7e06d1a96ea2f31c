//! Transport capability the core runs on top of
//!
//! A transport only starts operations; every completion, notification and
//! link change comes back as a [`TransportEvent`] on the single channel the
//! transport was created with, in the order the stack delivered them.

use crate::domain::models::BluetoothAddress;
use crate::infrastructure::bluetooth::error::TransportError;

/// Transport-assigned identifier of a resolved characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacteristicHandle(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCharacteristic {
    /// Lowercase, hyphenated UUID string
    pub service_uuid: String,
    pub uuid: String,
    pub handle: CharacteristicHandle,
}

impl DiscoveredCharacteristic {
    pub fn new(service_uuid: &str, uuid: &str, handle: u32) -> Self {
        Self {
            service_uuid: service_uuid.to_lowercase(),
            uuid: uuid.to_lowercase(),
            handle: CharacteristicHandle(handle),
        }
    }
}

/// Live link to one peer, owned by its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub address: BluetoothAddress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    PeripheralObserved {
        address: BluetoothAddress,
        name: Option<String>,
    },
    Connected {
        address: BluetoothAddress,
    },
    ConnectFailed {
        address: BluetoothAddress,
        reason: String,
    },
    ServicesResolved {
        address: BluetoothAddress,
        characteristics: Vec<DiscoveredCharacteristic>,
    },
    Notification {
        handle: CharacteristicHandle,
        value: Vec<u8>,
    },
    NotificationsEnabled {
        handle: CharacteristicHandle,
    },
    NotificationsFailed {
        handle: CharacteristicHandle,
        reason: String,
    },
    WriteAck {
        handle: CharacteristicHandle,
    },
    WriteFailed {
        handle: CharacteristicHandle,
        reason: String,
    },
    Disconnected {
        address: BluetoothAddress,
    },
}

pub trait BleTransport: Send {
    fn start_scan(&mut self) -> Result<(), TransportError>;

    fn stop_scan(&mut self) -> Result<(), TransportError>;

    fn connect(&mut self, address: BluetoothAddress) -> Result<(), TransportError>;

    /// Enumerates every service and characteristic of the connected peer
    fn resolve_services(&mut self, address: BluetoothAddress) -> Result<(), TransportError>;

    fn enable_notifications(&mut self, handle: CharacteristicHandle) -> Result<(), TransportError>;

    /// Write with response; completion arrives as WriteAck or WriteFailed
    fn write(&mut self, handle: CharacteristicHandle, value: &[u8]) -> Result<(), TransportError>;

    fn disconnect(&mut self, address: BluetoothAddress) -> Result<(), TransportError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TransportCall {
        StartScan,
        StopScan,
        Connect(BluetoothAddress),
        ResolveServices(BluetoothAddress),
        EnableNotifications(CharacteristicHandle),
        Write(CharacteristicHandle, Vec<u8>),
        Disconnect(BluetoothAddress),
    }

    /// Records every call; the log is shared so it stays readable after the
    /// transport was moved into a service
    #[derive(Debug, Clone, Default)]
    pub struct RecordingTransport {
        pub calls: Arc<Mutex<Vec<TransportCall>>>,
        pub reject_writes: bool,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<TransportCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn writes(&self) -> Vec<Vec<u8>> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    TransportCall::Write(_, value) => Some(value),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: TransportCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl BleTransport for RecordingTransport {
        fn start_scan(&mut self) -> Result<(), TransportError> {
            self.record(TransportCall::StartScan);
            Ok(())
        }

        fn stop_scan(&mut self) -> Result<(), TransportError> {
            self.record(TransportCall::StopScan);
            Ok(())
        }

        fn connect(&mut self, address: BluetoothAddress) -> Result<(), TransportError> {
            self.record(TransportCall::Connect(address));
            Ok(())
        }

        fn resolve_services(&mut self, address: BluetoothAddress) -> Result<(), TransportError> {
            self.record(TransportCall::ResolveServices(address));
            Ok(())
        }

        fn enable_notifications(
            &mut self,
            handle: CharacteristicHandle,
        ) -> Result<(), TransportError> {
            self.record(TransportCall::EnableNotifications(handle));
            Ok(())
        }

        fn write(&mut self, handle: CharacteristicHandle, value: &[u8]) -> Result<(), TransportError> {
            if self.reject_writes {
                return Err(TransportError::Backend("write rejected".to_string()));
            }
            self.record(TransportCall::Write(handle, value.to_vec()));
            Ok(())
        }

        fn disconnect(&mut self, address: BluetoothAddress) -> Result<(), TransportError> {
            self.record(TransportCall::Disconnect(address));
            Ok(())
        }
    }
}
