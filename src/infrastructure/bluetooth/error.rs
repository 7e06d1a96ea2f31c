//! Error types of the BLE core

use crate::domain::models::{BluetoothAddress, SessionState};
use crate::infrastructure::bluetooth::protocol::CharacteristicRole;
use crate::infrastructure::bluetooth::transport::CharacteristicHandle;
use thiserror::Error;

/// Reasons an incoming notification is dropped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Frame length byte {header_len} does not match received length {actual_len}")]
    LengthMismatch { header_len: u8, actual_len: usize },

    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("No decoder for notifications on {0:?}")]
    UnexpectedCharacteristic(CharacteristicRole),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{command} is not supported by {family}")]
    Unsupported {
        command: &'static str,
        family: &'static str,
    },

    #[error("No device attached to port {0}")]
    NoDeviceOnPort(u8),

    #[error("Controller has no output {0}")]
    NoSuchOutput(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("BLE backend error: {0}")]
    Backend(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Unknown characteristic handle {0:?}")]
    UnknownCharacteristic(CharacteristicHandle),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Failed to connect to {address}: {reason}")]
    Failed {
        address: BluetoothAddress,
        reason: String,
    },

    #[error("Device exposes none of the expected characteristics")]
    NoRecognizedCharacteristics,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Write to {role:?} failed: {reason}")]
pub struct WriteError {
    pub role: CharacteristicRole,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session is disconnected")]
    Disconnected,

    #[error("Session is not ready (state: {0})")]
    NotReady(SessionState),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Characteristic {0:?} was not resolved on this device")]
    MissingCharacteristic(CharacteristicRole),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("{address} ({name:?}) is not a recognized controller")]
    NotRecognized {
        address: BluetoothAddress,
        name: Option<String>,
    },

    #[error("A connection attempt is already in progress")]
    Busy,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Transport event channel closed")]
    TransportClosed,
}
